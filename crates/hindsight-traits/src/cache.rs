//! Pricing cache contract.
//!
//! The cache maps (priceable identity, market data location, risk measure) to
//! the values already computed per pricing date. Contexts read it to avoid
//! resubmitting dates; the execution engine writes to it as results arrive.

use std::collections::BTreeSet;

use hindsight_core::Date;
use serde::{Deserialize, Serialize};

use crate::ids::PriceableKey;
use crate::priceable::Priceable;
use crate::risk::{MarketDataLocation, RiskMeasure};

/// Key of one cached time series.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CacheKey {
    /// Priceable identity.
    pub priceable: PriceableKey,
    /// Market data location.
    pub location: MarketDataLocation,
    /// Risk measure.
    pub measure: RiskMeasure,
}

impl CacheKey {
    /// Builds the key for a priceable, location and measure.
    pub fn new(priceable: &Priceable, location: MarketDataLocation, measure: &RiskMeasure) -> Self {
        Self {
            priceable: priceable.key(),
            location,
            measure: measure.clone(),
        }
    }
}

/// Process-wide store of computed values.
pub trait PricingCache: Send + Sync {
    /// Dates with a cached value for `key`, or `None` if nothing is cached.
    fn dates(&self, key: &CacheKey) -> Option<BTreeSet<Date>>;

    /// The cached value for `key` on `date`.
    fn get(&self, key: &CacheKey, date: Date) -> Option<f64>;

    /// Stores a computed value.
    fn put(&self, key: &CacheKey, date: Date, value: f64);

    /// Drops every entry for a priceable.
    fn drop_priceable(&self, priceable: &PriceableKey);

    /// Drops everything.
    fn clear(&self);
}
