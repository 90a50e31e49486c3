//! # Hindsight Ext File
//!
//! File-backed collaborators for Hindsight pricing contexts.
//!
//! This crate provides implementations for testing, replays and static data:
//! - [`FixturePricingService`]: a pricing service answering from JSON or CSV
//!   fixtures
//! - [`load_holiday_calendar`]: holiday calendars delivered as JSON files
//!
//! For live valuations, implement `PricingService` over the remote client.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod calendar;
mod pricing;

pub use calendar::*;
pub use pricing::*;
