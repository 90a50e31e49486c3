//! Date-indexed results.

use std::collections::BTreeMap;

use hindsight_core::Date;
use hindsight_traits::{Priceable, RiskValue};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::future::PricingFuture;

/// One risk value per pricing date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateSeries {
    values: BTreeMap<Date, RiskValue>,
}

impl DateSeries {
    /// Creates an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value for a date.
    pub fn insert(&mut self, date: Date, value: RiskValue) {
        self.values.insert(date, value);
    }

    /// The value (or failure) for a date.
    pub fn get(&self, date: &Date) -> Option<&RiskValue> {
        self.values.get(date)
    }

    /// The computed scalar for a date.
    pub fn value(&self, date: &Date) -> Option<f64> {
        self.values.get(date).and_then(RiskValue::as_f64)
    }

    /// Dates present, ascending.
    pub fn dates(&self) -> Vec<Date> {
        self.values.keys().copied().collect()
    }

    /// Iterates (date, value) pairs, ascending.
    pub fn iter(&self) -> impl Iterator<Item = (&Date, &RiskValue)> {
        self.values.iter()
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the series holds no dates.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dates whose valuation failed, with the failure message.
    pub fn errors(&self) -> Vec<(Date, &str)> {
        self.values
            .iter()
            .filter_map(|(date, value)| match value {
                RiskValue::Error(msg) => Some((*date, msg.as_str())),
                RiskValue::Scalar(_) => None,
            })
            .collect()
    }

    /// Returns true if every date has a computed value.
    pub fn is_complete(&self) -> bool {
        self.values.values().all(|v| !v.is_error())
    }
}

impl FromIterator<(Date, RiskValue)> for DateSeries {
    fn from_iter<I: IntoIterator<Item = (Date, RiskValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Result of a `calc` call: available now, or after the scope exits.
#[derive(Debug)]
pub enum CalcResult {
    /// Synchronous mode: the series is complete.
    Ready(DateSeries),
    /// Async mode: resolves once the scope has exited and dispatched the work.
    Deferred(PricingFuture<DateSeries>),
}

impl CalcResult {
    /// Returns true for deferred results.
    pub fn is_deferred(&self) -> bool {
        matches!(self, CalcResult::Deferred(_))
    }

    /// The series, waiting for a deferred result if needed.
    pub async fn into_series(self) -> EngineResult<DateSeries> {
        match self {
            CalcResult::Ready(series) => Ok(series),
            CalcResult::Deferred(future) => future.result().await,
        }
    }

    /// The series if it is already available.
    pub fn ready(self) -> EngineResult<DateSeries> {
        match self {
            CalcResult::Ready(series) => Ok(series),
            CalcResult::Deferred(_) => Err(EngineError::invalid_state(
                "result is deferred until the pricing context exits",
            )),
        }
    }
}

/// Result of a non-in-place field resolution.
#[derive(Debug)]
pub enum Resolution {
    /// The resolved priceable per pricing date.
    Ready(BTreeMap<Date, Priceable>),
    /// Async mode: resolves once the resolution requests complete.
    Deferred(PricingFuture<BTreeMap<Date, Priceable>>),
}

impl Resolution {
    /// The resolved priceables, waiting if needed.
    pub async fn into_map(self) -> EngineResult<BTreeMap<Date, Priceable>> {
        match self {
            Resolution::Ready(map) => Ok(map),
            Resolution::Deferred(future) => future.result().await,
        }
    }
}
