//! Holiday calendar backed by an explicit list of dates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::Calendar;
use crate::types::Date;

/// Calendar defined by an explicit set of holiday dates plus weekends.
///
/// Used for calendars delivered as data (exchange calendars, desk-specific
/// closures) rather than rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    name: String,
    holidays: BTreeSet<Date>,
}

impl HolidayCalendar {
    /// Creates a calendar from a name and holiday dates.
    pub fn new(name: impl Into<String>, holidays: impl IntoIterator<Item = Date>) -> Self {
        Self {
            name: name.into(),
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Adds a holiday.
    pub fn add_holiday(&mut self, date: Date) {
        self.holidays.insert(date);
    }

    /// The holiday dates, ascending.
    pub fn holidays(&self) -> impl Iterator<Item = &Date> {
        self.holidays.iter()
    }
}

impl Calendar for HolidayCalendar {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend() && !self.holidays.contains(&date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_holidays() {
        let closure = Date::from_ymd(2024, 1, 3).unwrap();
        let cal = HolidayCalendar::new("DESK", [closure]);

        assert_eq!(cal.name(), "DESK");
        assert!(!cal.is_business_day(closure));
        assert!(cal.is_business_day(Date::from_ymd(2024, 1, 2).unwrap()));
        assert!(!cal.is_business_day(Date::from_ymd(2024, 1, 6).unwrap()));
    }
}
