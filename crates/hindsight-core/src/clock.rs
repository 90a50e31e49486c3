//! Sources of "today".
//!
//! Pricing contexts treat the current date specially (it defaults the end of
//! a date range and drives the market-data-as-of rollback), so the notion of
//! today is injected rather than read ad hoc.

use crate::types::Date;

/// Provides the current calendar date.
pub trait Clock: Send + Sync {
    /// Today's date.
    fn today(&self) -> Date;
}

/// Clock reading the local system date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        Date::today()
    }
}

/// Clock pinned to a fixed date, for replays and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}
