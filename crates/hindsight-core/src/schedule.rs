//! Date range resolution.
//!
//! Expands a (start, end, calendar) triple into the ordered set of
//! business dates a historical pricing context values over. Either bound may
//! be a date or a count of business days, mirroring how contexts accept
//! "the last 10 business days" as well as explicit dates.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calendars::{BusinessDayConvention, Calendar};
use crate::error::{CoreError, CoreResult};
use crate::types::Date;

/// One end of a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBound {
    /// An explicit date.
    Date(Date),
    /// A number of business days counted from the other bound.
    BusinessDays(usize),
}

impl From<Date> for DateBound {
    fn from(date: Date) -> Self {
        DateBound::Date(date)
    }
}

impl From<usize> for DateBound {
    fn from(days: usize) -> Self {
        DateBound::BusinessDays(days)
    }
}

impl fmt::Display for DateBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateBound::Date(date) => write!(f, "{date}"),
            DateBound::BusinessDays(n) => write!(f, "{n} business days"),
        }
    }
}

/// Rolls `date` by `convention`, then moves `offset` business days.
///
/// # Errors
///
/// Propagates adjustment errors from the calendar.
pub fn business_day_offset<C: Calendar + ?Sized>(
    date: Date,
    offset: i32,
    convention: BusinessDayConvention,
    calendar: &C,
) -> CoreResult<Date> {
    let rolled = calendar.adjust(date, convention)?;
    Ok(calendar.add_business_days(rolled, offset))
}

/// Expands `start`..=`end` into business dates, ascending.
///
/// - date to date: every business day from `start` (rolled following)
///   through `end` inclusive
/// - count to date: the last `n` business days ending at `end` (rolled preceding)
/// - date to count: the first `n` business days starting at `start` (rolled following)
///
/// # Errors
///
/// Returns `CoreError::InvalidArgument` if `start` is after `end`, both
/// bounds are counts, or a count does not fit an `i32` day offset.
pub fn date_range<C: Calendar + ?Sized>(
    start: DateBound,
    end: DateBound,
    calendar: &C,
) -> CoreResult<Vec<Date>> {
    match (start, end) {
        (DateBound::Date(start), DateBound::Date(end)) => {
            if start > end {
                return Err(CoreError::invalid_argument(format!(
                    "start {start} must be on or before end {end}"
                )));
            }
            let mut dates = Vec::new();
            let mut current = calendar.next_business_day(start);
            while current <= end {
                dates.push(current);
                current = calendar.add_business_days(current, 1);
            }
            Ok(dates)
        }
        (DateBound::BusinessDays(count), DateBound::Date(end)) => {
            let count = business_day_count(count)?;
            let last = calendar.adjust(end, BusinessDayConvention::Preceding)?;
            Ok((0..count)
                .rev()
                .map(|back| calendar.add_business_days(last, -back))
                .collect())
        }
        (DateBound::Date(start), DateBound::BusinessDays(count)) => {
            let count = business_day_count(count)?;
            let first = calendar.adjust(start, BusinessDayConvention::Following)?;
            Ok((0..count)
                .map(|ahead| calendar.add_business_days(first, ahead))
                .collect())
        }
        (DateBound::BusinessDays(_), DateBound::BusinessDays(_)) => Err(
            CoreError::invalid_argument("end must be a date when start is a count of business days"),
        ),
    }
}

fn business_day_count(count: usize) -> CoreResult<i32> {
    i32::try_from(count).map_err(|_| {
        CoreError::invalid_argument(format!("{count} business days is out of range"))
    })
}

/// An immutable, ascending, duplicate-free set of pricing dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    dates: Vec<Date>,
}

impl DateRange {
    /// Builds a range from explicit dates, sorting and dropping duplicates.
    pub fn from_dates(dates: impl IntoIterator<Item = Date>) -> Self {
        let dates: BTreeSet<Date> = dates.into_iter().collect();
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Resolves a range from bounds and a calendar.
    ///
    /// # Errors
    ///
    /// See [`date_range`].
    pub fn resolve<C: Calendar + ?Sized>(
        start: DateBound,
        end: DateBound,
        calendar: &C,
    ) -> CoreResult<Self> {
        date_range(start, end, calendar).map(Self::from_dates)
    }

    /// The dates, ascending.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Iterates the dates, ascending.
    pub fn iter(&self) -> std::slice::Iter<'_, Date> {
        self.dates.iter()
    }

    /// Returns true if the range contains `date`.
    pub fn contains(&self, date: &Date) -> bool {
        self.dates.binary_search(date).is_ok()
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns true if the range holds no dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First date.
    pub fn first(&self) -> Option<Date> {
        self.dates.first().copied()
    }

    /// Last date.
    pub fn last(&self) -> Option<Date> {
        self.dates.last().copied()
    }

    /// The dates in this range that are not in `other`.
    pub fn difference<'a, I>(&self, other: I) -> BTreeSet<Date>
    where
        I: IntoIterator<Item = &'a Date>,
    {
        let exclude: BTreeSet<Date> = other.into_iter().copied().collect();
        self.dates
            .iter()
            .filter(|date| !exclude.contains(date))
            .copied()
            .collect()
    }
}

impl<'a> IntoIterator for &'a DateRange {
    type Item = &'a Date;
    type IntoIter = std::slice::Iter<'a, Date>;

    fn into_iter(self) -> Self::IntoIter {
        self.dates.iter()
    }
}
