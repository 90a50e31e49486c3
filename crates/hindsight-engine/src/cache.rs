//! In-memory pricing cache.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use hindsight_core::Date;
use hindsight_traits::{CacheKey, PriceableKey, PricingCache};

static GLOBAL_CACHE: Lazy<Arc<InMemoryPricingCache>> =
    Lazy::new(|| Arc::new(InMemoryPricingCache::new()));

/// The process-wide pricing cache used by contexts that are not given one.
pub fn global_cache() -> Arc<dyn PricingCache> {
    GLOBAL_CACHE.clone()
}

/// Pricing cache holding one date-keyed series per (priceable, location, measure).
#[derive(Debug, Default)]
pub struct InMemoryPricingCache {
    series: DashMap<CacheKey, BTreeMap<Date, f64>>,
}

impl InMemoryPricingCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl PricingCache for InMemoryPricingCache {
    fn dates(&self, key: &CacheKey) -> Option<BTreeSet<Date>> {
        self.series
            .get(key)
            .map(|values| values.keys().copied().collect())
    }

    fn get(&self, key: &CacheKey, date: Date) -> Option<f64> {
        self.series
            .get(key)
            .and_then(|values| values.get(&date).copied())
    }

    fn put(&self, key: &CacheKey, date: Date, value: f64) {
        self.series
            .entry(key.clone())
            .or_default()
            .insert(date, value);
    }

    fn drop_priceable(&self, priceable: &PriceableKey) {
        self.series.retain(|key, _| &key.priceable != priceable);
    }

    fn clear(&self) {
        self.series.clear();
    }
}
