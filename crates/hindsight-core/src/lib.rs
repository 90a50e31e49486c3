//! # Hindsight Core
//!
//! Dates, business day calendars and date range resolution for Hindsight
//! pricing contexts.
//!
//! - **Types**: [`Date`], a pricing-friendly wrapper over `chrono::NaiveDate`
//! - **Calendars**: New York, London and TARGET holiday rules, explicit holiday
//!   lists, joint calendars and a name-keyed registry
//! - **Schedules**: expansion of start/end bounds into ordered business dates
//! - **Clocks**: injectable notion of "today"
//!
//! ## Example
//!
//! ```rust
//! use hindsight_core::prelude::*;
//!
//! let calendar = CalendarRegistry::global().joint(&["NYC"]).unwrap();
//! let range = DateRange::resolve(
//!     Date::from_ymd(2023, 12, 29).unwrap().into(),
//!     Date::from_ymd(2024, 1, 3).unwrap().into(),
//!     &calendar,
//! )
//! .unwrap();
//!
//! // New Year's Day is skipped
//! assert_eq!(range.len(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::return_self_not_must_use)]

pub mod calendars;
pub mod clock;
pub mod error;
pub mod schedule;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calendars::{
        BusinessDayConvention, Calendar, CalendarRegistry, HolidayCalendar, JointCalendar,
        TargetCalendar, UkCalendar, UsCalendar, WeekendCalendar,
    };
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::schedule::{business_day_offset, date_range, DateBound, DateRange};
    pub use crate::types::Date;
}

// Re-export commonly used types at crate root
pub use error::{CoreError, CoreResult};
pub use schedule::{DateBound, DateRange};
pub use types::Date;
