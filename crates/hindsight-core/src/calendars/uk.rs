//! London (England & Wales bank holiday) calendar.

use chrono::Weekday;

use super::{days_from_easter, is_last_weekday, is_nth_weekday, Calendar};
use crate::types::Date;

/// London calendar following England & Wales bank holidays.
///
/// Includes substitute days for New Year, Christmas and Boxing Day and the
/// one-off bank holidays declared since 2020.
#[derive(Debug, Clone, Copy, Default)]
pub struct UkCalendar;

impl UkCalendar {
    fn is_bank_holiday(&self, date: Date) -> bool {
        let (year, month, day) = (date.year(), date.month(), date.day());

        if is_special_holiday(year, month, day) {
            return true;
        }

        // Good Friday, Easter Monday
        if matches!(days_from_easter(date), Some(-2 | 1)) {
            return true;
        }

        match month {
            1 => match date.weekday() {
                Weekday::Mon => day <= 3,
                _ => day == 1,
            },
            // Early May moved to 8 May in 2020, spring moved to 2 June in 2022
            5 => {
                (year != 2020 && is_nth_weekday(date, Weekday::Mon, 1))
                    || (year != 2022 && is_last_weekday(date, Weekday::Mon))
            }
            8 => is_last_weekday(date, Weekday::Mon),
            12 => is_christmas_holiday(date),
            _ => false,
        }
    }
}

/// Christmas and Boxing Day with their weekday substitutes.
fn is_christmas_holiday(date: Date) -> bool {
    let day = date.day();
    match day {
        25 | 26 => !date.is_weekend(),
        // Substitute days fall on the following Monday or Tuesday
        27 | 28 => {
            matches!(date.weekday(), Weekday::Mon | Weekday::Tue)
                && Date::from_ymd(date.year(), 12, 25)
                    .map(|christmas| christmas.is_weekend() || christmas.add_days(1).is_weekend())
                    .unwrap_or(false)
        }
        _ => false,
    }
}

/// One-off bank holidays (moved or additional days).
fn is_special_holiday(year: i32, month: u32, day: u32) -> bool {
    matches!(
        (year, month, day),
        // VE Day 75th anniversary
        (2020, 5, 8)
        // Platinum Jubilee (spring bank holiday moved) and extra day
        | (2022, 6, 2)
        | (2022, 6, 3)
        // State funeral of Queen Elizabeth II
        | (2022, 9, 19)
        // Coronation of King Charles III
        | (2023, 5, 8)
    )
}

impl Calendar for UkCalendar {
    fn name(&self) -> &str {
        "London"
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend() && !self.is_bank_holiday(date)
    }
}
