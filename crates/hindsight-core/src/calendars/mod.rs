//! Business day calendars and conventions.
//!
//! This module provides:
//! - The [`Calendar`] trait and weekend-only / joint calendars
//! - Rule-based holiday calendars for New York, London, and TARGET
//! - Explicit holiday-list calendars loaded from data
//! - A name-keyed [`CalendarRegistry`] used to resolve calendar sets
//! - Business day adjustment conventions

use std::sync::Arc;

mod conventions;
mod holiday_list;
mod registry;
mod target2;
mod uk;
mod us_calendar;

pub use conventions::BusinessDayConvention;
pub use holiday_list::HolidayCalendar;
pub use registry::CalendarRegistry;
pub use target2::TargetCalendar;
pub use uk::UkCalendar;
pub use us_calendar::UsCalendar;

use chrono::NaiveDate;

use crate::error::CoreResult;
use crate::types::Date;

/// Trait for business day calendars.
///
/// Calendars determine which days are business days vs holidays
/// for a specific market or jurisdiction.
pub trait Calendar: Send + Sync {
    /// Returns the name of the calendar.
    fn name(&self) -> &str;

    /// Returns true if the date is a business day.
    fn is_business_day(&self, date: Date) -> bool;

    /// Returns true if the date is a holiday (or weekend).
    fn is_holiday(&self, date: Date) -> bool {
        !self.is_business_day(date)
    }

    /// Adjusts a date according to the given business day convention.
    fn adjust(&self, date: Date, convention: BusinessDayConvention) -> CoreResult<Date> {
        conventions::adjust(date, convention, self)
    }

    /// Advances a date by a number of business days.
    ///
    /// Negative values move backward. The starting date itself is not
    /// counted, whether or not it is a business day.
    fn add_business_days(&self, date: Date, days: i32) -> Date {
        let mut result = date;
        let mut remaining = days.abs();
        let direction: i64 = if days >= 0 { 1 } else { -1 };

        while remaining > 0 {
            result = result.add_days(direction);
            if self.is_business_day(result) {
                remaining -= 1;
            }
        }

        result
    }

    /// Returns the next business day on or after the given date.
    fn next_business_day(&self, date: Date) -> Date {
        let mut result = date;
        while !self.is_business_day(result) {
            result = result.add_days(1);
        }
        result
    }

    /// Returns the previous business day on or before the given date.
    fn previous_business_day(&self, date: Date) -> Date {
        let mut result = date;
        while !self.is_business_day(result) {
            result = result.add_days(-1);
        }
        result
    }
}

/// A simple weekend-only calendar (no holidays).
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekendCalendar;

impl Calendar for WeekendCalendar {
    fn name(&self) -> &str {
        "Weekend Only"
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend()
    }
}

/// Calendar that combines multiple calendars (joint holidays).
///
/// A date is a business day only if every member calendar considers it one.
/// An empty joint calendar behaves like [`WeekendCalendar`].
#[derive(Clone)]
pub struct JointCalendar {
    calendars: Vec<Arc<dyn Calendar>>,
    name: String,
}

impl JointCalendar {
    /// Creates a new joint calendar from multiple calendars.
    pub fn new(calendars: Vec<Arc<dyn Calendar>>) -> Self {
        let name = if calendars.is_empty() {
            WeekendCalendar.name().to_string()
        } else {
            calendars
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(" + ")
        };

        Self { calendars, name }
    }

    /// Number of member calendars.
    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    /// Returns true if no member calendars were supplied.
    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }
}

impl std::fmt::Debug for JointCalendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JointCalendar")
            .field("name", &self.name)
            .finish()
    }
}

impl Calendar for JointCalendar {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_business_day(&self, date: Date) -> bool {
        if date.is_weekend() {
            return false;
        }
        self.calendars.iter().all(|cal| cal.is_business_day(date))
    }
}

/// Easter Sunday for the given year (anonymous Gregorian algorithm).
pub(crate) fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = ((h + l - 7 * m + 114) % 31) + 1;

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Days from Easter Sunday of the date's year to the date.
pub(crate) fn days_from_easter(date: Date) -> Option<i64> {
    easter_sunday(date.year()).map(|easter| (date.as_naive_date() - easter).num_days())
}

/// Returns true if date is the nth occurrence of weekday in its month.
pub(crate) fn is_nth_weekday(date: Date, weekday: chrono::Weekday, n: u32) -> bool {
    date.weekday() == weekday && (date.day() - 1) / 7 + 1 == n
}

/// Returns true if date is the last occurrence of weekday in its month.
pub(crate) fn is_last_weekday(date: Date, weekday: chrono::Weekday) -> bool {
    date.weekday() == weekday && date.add_days(7).month() != date.month()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekend_calendar() {
        let cal = WeekendCalendar;

        // Monday
        assert!(cal.is_business_day(Date::from_ymd(2025, 1, 6).unwrap()));
        // Saturday, Sunday
        assert!(!cal.is_business_day(Date::from_ymd(2025, 1, 4).unwrap()));
        assert!(!cal.is_business_day(Date::from_ymd(2025, 1, 5).unwrap()));
    }

    #[test]
    fn test_add_business_days() {
        let cal = WeekendCalendar;

        // Friday + 1 business day = Monday
        let friday = Date::from_ymd(2025, 1, 3).unwrap();
        assert_eq!(
            cal.add_business_days(friday, 1),
            Date::from_ymd(2025, 1, 6).unwrap()
        );

        // Monday - 1 business day = Friday
        let monday = Date::from_ymd(2025, 1, 6).unwrap();
        assert_eq!(cal.add_business_days(monday, -1), friday);
    }

    #[test]
    fn test_joint_calendar_unions_holidays() {
        let joint = JointCalendar::new(vec![Arc::new(UsCalendar), Arc::new(UkCalendar)]);

        // July 4th is a US holiday only
        assert!(!joint.is_business_day(Date::from_ymd(2024, 7, 4).unwrap()));
        // Easter Monday is a UK holiday only
        assert!(!joint.is_business_day(Date::from_ymd(2024, 4, 1).unwrap()));
        assert!(joint.is_business_day(Date::from_ymd(2024, 7, 5).unwrap()));
        assert_eq!(joint.name(), "New York + London");
    }

    #[test]
    fn test_empty_joint_calendar_is_weekend_only() {
        let joint = JointCalendar::new(Vec::new());
        assert!(joint.is_empty());
        assert!(joint.is_business_day(Date::from_ymd(2024, 12, 25).unwrap()));
        assert!(!joint.is_business_day(Date::from_ymd(2024, 12, 28).unwrap()));
    }

    #[test]
    fn test_easter() {
        assert_eq!(
            easter_sunday(2025),
            NaiveDate::from_ymd_opt(2025, 4, 20)
        );
        assert_eq!(
            easter_sunday(2024),
            NaiveDate::from_ymd_opt(2024, 3, 31)
        );
    }
}
