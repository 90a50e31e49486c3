//! New York (US federal) holiday calendar.

use chrono::Weekday;

use super::{is_last_weekday, is_nth_weekday, Calendar};
use crate::types::Date;

/// New York calendar, observing the US federal holidays kept by the
/// rates and bond markets.
///
/// Fixed-date holidays falling on a Saturday are observed on the Friday
/// before, and those falling on a Sunday on the Monday after.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsCalendar;

impl UsCalendar {
    /// Returns true if the date is a US federal holiday (or its observance).
    fn is_federal_holiday(&self, date: Date) -> bool {
        let year = date.year();

        if is_observed_fixed(date, 1, 1)
            || is_observed_fixed(date, 7, 4)
            || is_observed_fixed(date, 11, 11)
            || is_observed_fixed(date, 12, 25)
            || (year >= 2021 && is_observed_fixed(date, 6, 19))
        {
            return true;
        }

        match date.month() {
            // MLK Day, 3rd Monday in January
            1 => is_nth_weekday(date, Weekday::Mon, 3),
            // Presidents Day, 3rd Monday in February
            2 => is_nth_weekday(date, Weekday::Mon, 3),
            // Memorial Day, last Monday in May
            5 => is_last_weekday(date, Weekday::Mon),
            // Labor Day, 1st Monday in September
            9 => is_nth_weekday(date, Weekday::Mon, 1),
            // Columbus Day, 2nd Monday in October
            10 => is_nth_weekday(date, Weekday::Mon, 2),
            // Thanksgiving, 4th Thursday in November
            11 => is_nth_weekday(date, Weekday::Thu, 4),
            _ => false,
        }
    }
}

/// True if `date` is the fixed holiday `month`/`day` or its weekday observance.
fn is_observed_fixed(date: Date, month: u32, day: u32) -> bool {
    let Ok(holiday) = Date::from_ymd(date.year(), month, day) else {
        return false;
    };
    let observed = match holiday.weekday() {
        Weekday::Sat => holiday.add_days(-1),
        Weekday::Sun => holiday.add_days(1),
        _ => holiday,
    };
    if date == observed {
        return true;
    }
    // New Year's Day on a Saturday is observed on Dec 31 of the prior year.
    month == 1 && day == 1 && date.month() == 12 && date.day() == 31 && {
        Date::from_ymd(date.year() + 1, 1, 1).is_ok_and(|next| next.weekday() == Weekday::Sat)
    }
}

impl Calendar for UsCalendar {
    fn name(&self) -> &str {
        "New York"
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend() && !self.is_federal_holiday(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_weekend() {
        let cal = UsCalendar;
        assert!(!cal.is_business_day(Date::from_ymd(2025, 1, 4).unwrap()));
        assert!(!cal.is_business_day(Date::from_ymd(2025, 1, 5).unwrap()));
        assert!(cal.is_business_day(Date::from_ymd(2025, 1, 6).unwrap()));
    }

    #[test]
    fn test_us_new_years() {
        let cal = UsCalendar;
        assert!(!cal.is_business_day(Date::from_ymd(2025, 1, 1).unwrap()));
        assert!(cal.is_business_day(Date::from_ymd(2024, 1, 2).unwrap()));
    }

    #[test]
    fn test_us_new_years_observed_prior_year() {
        // 2022-01-01 was a Saturday, observed Friday 2021-12-31
        let cal = UsCalendar;
        assert!(!cal.is_business_day(Date::from_ymd(2021, 12, 31).unwrap()));
    }

    #[test]
    fn test_us_mlk_day() {
        let cal = UsCalendar;
        // 2025: MLK Day is Jan 20 (3rd Monday)
        assert!(!cal.is_business_day(Date::from_ymd(2025, 1, 20).unwrap()));
        assert!(cal.is_business_day(Date::from_ymd(2025, 1, 21).unwrap()));
    }

    #[test]
    fn test_us_independence_day_observed() {
        // 2026-07-04 is a Saturday, observed Friday 2026-07-03
        let cal = UsCalendar;
        assert!(!cal.is_business_day(Date::from_ymd(2026, 7, 3).unwrap()));
    }

    #[test]
    fn test_us_thanksgiving_and_christmas() {
        let cal = UsCalendar;
        assert!(!cal.is_business_day(Date::from_ymd(2025, 11, 27).unwrap()));
        assert!(!cal.is_business_day(Date::from_ymd(2025, 12, 25).unwrap()));
    }
}
