//! Fixture-backed pricing service.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use hindsight_core::Date;
use hindsight_traits::{
    InstrumentId, MarketDataLocation, Priceable, PricingDateAndMarketDataAsOf, PricingService,
    RiskRequest, TraitError,
};

// =============================================================================
// FIXTURE RECORDS
// =============================================================================

/// One instrument/measure series in a JSON fixture file.
#[derive(Debug, Deserialize)]
struct SeriesRecord {
    instrument: String,
    measure: String,
    #[serde(default)]
    values: BTreeMap<Date, f64>,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

/// One row of a CSV fixture file.
#[derive(Debug, Deserialize)]
struct ValueRecord {
    instrument: String,
    measure: String,
    date: Date,
    value: f64,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FixtureKey {
    instrument: InstrumentId,
    measure: String,
    date: Date,
}

// =============================================================================
// FIXTURE PRICING SERVICE
// =============================================================================

/// Pricing service answering from recorded values.
///
/// Values are keyed by (instrument id, measure name, pricing date); the
/// market data date and location are not part of the key. Every call is
/// recorded so tests can assert on what was submitted.
///
/// JSON fixtures hold a list of series, optionally with the fields `resolve`
/// fills in:
///
/// ```json
/// [
///   {
///     "instrument": "swap-1",
///     "measure": "PresentValue",
///     "values": { "2024-01-02": 101.5, "2024-01-03": 101.2 },
///     "fields": { "fixed_rate": 0.0325 }
///   }
/// ]
/// ```
///
/// CSV fixtures hold one value per row:
///
/// ```text
/// instrument,measure,date,value
/// swap-1,PresentValue,2024-01-02,101.5
/// ```
#[derive(Debug, Default)]
pub struct FixturePricingService {
    values: DashMap<FixtureKey, f64>,
    fields: DashMap<InstrumentId, BTreeMap<String, Value>>,
    requests: Mutex<Vec<RiskRequest>>,
    resolve_calls: AtomicUsize,
}

impl FixturePricingService {
    /// Create a service with no fixtures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service from a JSON fixture file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TraitError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| TraitError::IoError(format!("{}: {e}", path.as_ref().display())))?;
        let service = Self::new();
        service.load_json_str(&content)?;
        info!(
            path = %path.as_ref().display(),
            values = service.len(),
            "loaded JSON pricing fixtures"
        );
        Ok(service)
    }

    /// Create a service from a CSV fixture file.
    pub fn from_csv_file(path: impl AsRef<Path>) -> Result<Self, TraitError> {
        let file = std::fs::File::open(path.as_ref())
            .map_err(|e| TraitError::IoError(format!("{}: {e}", path.as_ref().display())))?;
        let service = Self::new();
        service.load_csv(file)?;
        info!(
            path = %path.as_ref().display(),
            values = service.len(),
            "loaded CSV pricing fixtures"
        );
        Ok(service)
    }

    /// Add the series in a JSON fixture document.
    pub fn load_json_str(&self, content: &str) -> Result<(), TraitError> {
        let records: Vec<SeriesRecord> =
            serde_json::from_str(content).map_err(|e| TraitError::ParseError(e.to_string()))?;

        for record in records {
            let instrument = InstrumentId::new(record.instrument);
            for (date, value) in record.values {
                self.insert(instrument.clone(), &record.measure, date, value);
            }
            if !record.fields.is_empty() {
                self.fields
                    .entry(instrument)
                    .or_default()
                    .extend(record.fields);
            }
        }
        Ok(())
    }

    /// Add the rows of a CSV fixture document.
    pub fn load_csv(&self, reader: impl Read) -> Result<(), TraitError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        for result in reader.deserialize() {
            let record: ValueRecord = result.map_err(|e| TraitError::ParseError(e.to_string()))?;
            self.insert(
                InstrumentId::new(record.instrument),
                &record.measure,
                record.date,
                record.value,
            );
        }
        Ok(())
    }

    /// Add one value.
    pub fn with_value(
        self,
        instrument: impl Into<InstrumentId>,
        measure: &str,
        date: Date,
        value: f64,
    ) -> Self {
        self.insert(instrument.into(), measure, date, value);
        self
    }

    /// Add a field that `resolve` fills in for an instrument.
    pub fn with_field(
        self,
        instrument: impl Into<InstrumentId>,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.fields
            .entry(instrument.into())
            .or_default()
            .insert(name.into(), value.into());
        self
    }

    /// Number of recorded values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no values are recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of `calc` calls received.
    pub fn calc_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of `resolve` calls received.
    pub fn resolve_count(&self) -> usize {
        self.resolve_calls.load(Ordering::Relaxed)
    }

    /// The `calc` requests received, in arrival order.
    pub fn requests(&self) -> Vec<RiskRequest> {
        self.requests.lock().clone()
    }

    fn insert(&self, instrument: InstrumentId, measure: &str, date: Date, value: f64) {
        let key = FixtureKey {
            instrument,
            measure: measure.to_string(),
            date,
        };
        self.values.insert(key, value);
    }
}

#[async_trait]
impl PricingService for FixturePricingService {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn calc(&self, request: &RiskRequest) -> Result<f64, TraitError> {
        self.requests.lock().push(request.clone());

        let key = FixtureKey {
            instrument: request.priceable.id.clone(),
            measure: request.measure.name.clone(),
            date: request.dates.pricing_date,
        };
        debug!(
            instrument = %key.instrument,
            measure = %key.measure,
            date = %key.date,
            "fixture lookup"
        );

        self.values.get(&key).map(|v| *v).ok_or_else(|| {
            TraitError::NotFound(format!(
                "{} {} on {}",
                key.instrument, key.measure, key.date
            ))
        })
    }

    async fn resolve(
        &self,
        priceable: &Priceable,
        _dates: PricingDateAndMarketDataAsOf,
        _location: MarketDataLocation,
    ) -> Result<Priceable, TraitError> {
        self.resolve_calls.fetch_add(1, Ordering::Relaxed);

        let mut resolved = priceable.clone();
        if let Some(fields) = self.fields.get(&priceable.id) {
            for (name, value) in fields.iter() {
                resolved
                    .fields
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        resolved.resolved = true;
        Ok(resolved)
    }
}
