//! Business day adjustment conventions.

use serde::{Deserialize, Serialize};

use super::Calendar;
use crate::error::CoreResult;
use crate::types::Date;

/// Business day adjustment conventions.
///
/// These conventions specify how to roll a date that falls
/// on a non-business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BusinessDayConvention {
    /// No adjustment - use the date as-is even if not a business day.
    Unadjusted,

    /// Move to the following business day.
    #[default]
    Following,

    /// Move to the following business day, unless it crosses a month boundary,
    /// in which case move to the preceding business day.
    ModifiedFollowing,

    /// Move to the preceding business day.
    Preceding,

    /// Move to the preceding business day, unless it crosses a month boundary,
    /// in which case move to the following business day.
    ModifiedPreceding,
}

impl std::fmt::Display for BusinessDayConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BusinessDayConvention::Unadjusted => "Unadjusted",
            BusinessDayConvention::Following => "Following",
            BusinessDayConvention::ModifiedFollowing => "Modified Following",
            BusinessDayConvention::Preceding => "Preceding",
            BusinessDayConvention::ModifiedPreceding => "Modified Preceding",
        };
        write!(f, "{name}")
    }
}

/// Adjusts a date according to the given business day convention.
pub fn adjust<C: Calendar + ?Sized>(
    date: Date,
    convention: BusinessDayConvention,
    calendar: &C,
) -> CoreResult<Date> {
    if calendar.is_business_day(date) {
        return Ok(date);
    }

    let adjusted = match convention {
        BusinessDayConvention::Unadjusted => date,
        BusinessDayConvention::Following => calendar.next_business_day(date),
        BusinessDayConvention::Preceding => calendar.previous_business_day(date),
        BusinessDayConvention::ModifiedFollowing => {
            let rolled = calendar.next_business_day(date);
            if rolled.month() != date.month() {
                calendar.previous_business_day(date)
            } else {
                rolled
            }
        }
        BusinessDayConvention::ModifiedPreceding => {
            let rolled = calendar.previous_business_day(date);
            if rolled.month() != date.month() {
                calendar.next_business_day(date)
            } else {
                rolled
            }
        }
    };

    Ok(adjusted)
}
