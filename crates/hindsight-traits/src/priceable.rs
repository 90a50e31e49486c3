//! Priceable instruments as consumed by pricing contexts.
//!
//! The full instrument schema (swaps, options, portfolios, ...) belongs to the
//! service's generated model; contexts only need an identity, the instrument
//! type, and the bag of field values the service resolves and prices.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{InstrumentId, PriceableKey};

/// An instrument or portfolio that can be submitted for valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Priceable {
    /// Identifier of the priceable.
    pub id: InstrumentId,
    /// Instrument type name as known to the service (e.g. `IRSwap`).
    pub instrument_type: String,
    /// Field values, keyed by field name.
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    /// True once the service has filled in unspecified fields.
    #[serde(default)]
    pub resolved: bool,
}

impl Priceable {
    /// Creates an unresolved priceable with no fields set.
    pub fn new(id: impl Into<InstrumentId>, instrument_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            instrument_type: instrument_type.into(),
            fields: BTreeMap::new(),
            resolved: false,
        }
    }

    /// Sets a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns a field value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Canonical identity used for cache lookups.
    ///
    /// The resolution flag is not part of the identity.
    pub fn key(&self) -> PriceableKey {
        let fields = self
            .fields
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(",");
        PriceableKey::new(format!("{}|{}|{}", self.instrument_type, self.id, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swap() -> Priceable {
        Priceable::new("swap-1", "IRSwap")
            .with_field("pay_or_receive", "Pay")
            .with_field("termination_date", "10y")
    }

    #[test]
    fn test_key_is_stable_across_field_order() {
        let a = swap();
        let b = Priceable::new("swap-1", "IRSwap")
            .with_field("termination_date", "10y")
            .with_field("pay_or_receive", "Pay");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_key_distinguishes_field_values() {
        let other = swap().with_field("termination_date", "5y");
        assert_ne!(swap().key(), other.key());
    }

    #[test]
    fn test_key_ignores_resolution_flag() {
        let mut resolved = swap();
        resolved.resolved = true;
        assert_eq!(swap().key(), resolved.key());
    }

    #[test]
    fn test_field_access() {
        let p = swap();
        assert_eq!(p.field("pay_or_receive"), Some(&Value::from("Pay")));
        assert!(p.field("notional").is_none());
    }
}
