//! TARGET2 calendar for Eurozone payments and settlement.

use super::{days_from_easter, Calendar};
use crate::types::Date;

/// TARGET2 holiday calendar for Eurozone markets.
///
/// ## Holidays
///
/// - New Year's Day (January 1)
/// - Good Friday
/// - Easter Monday
/// - Labour Day (May 1)
/// - Christmas Day (December 25)
/// - Boxing Day (December 26)
///
/// Holidays falling on a weekend are not moved.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetCalendar;

impl Calendar for TargetCalendar {
    fn name(&self) -> &str {
        "TARGET"
    }

    fn is_business_day(&self, date: Date) -> bool {
        if date.is_weekend() {
            return false;
        }
        let fixed = matches!(
            (date.month(), date.day()),
            (1, 1) | (5, 1) | (12, 25) | (12, 26)
        );
        !fixed && !matches!(days_from_easter(date), Some(-2 | 1))
    }
}
