//! Risk measures, market data locations and the request/response tuples
//! exchanged with the pricing service.

use std::fmt;
use std::str::FromStr;

use hindsight_core::Date;
use serde::{Deserialize, Serialize};

use crate::error::TraitError;
use crate::priceable::Priceable;

// =============================================================================
// RISK MEASURES
// =============================================================================

/// Kind of quantity a risk measure computes.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum RiskMeasureType {
    /// Present value
    PV,
    /// Price in currency units per 100 notional
    DollarPrice,
    /// First-order sensitivity to the underlying
    Delta,
    /// Second-order sensitivity to the underlying
    Gamma,
    /// Sensitivity to implied volatility
    Vega,
    /// Sensitivity to the passage of time
    Theta,
    /// Par rate
    ParRate,
}

impl fmt::Display for RiskMeasureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskMeasureType::PV => "PV",
            RiskMeasureType::DollarPrice => "Dollar Price",
            RiskMeasureType::Delta => "Delta",
            RiskMeasureType::Gamma => "Gamma",
            RiskMeasureType::Vega => "Vega",
            RiskMeasureType::Theta => "Theta",
            RiskMeasureType::ParRate => "Par Rate",
        };
        write!(f, "{name}")
    }
}

/// Asset class a risk measure is scoped to.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum AssetClass {
    /// Rates
    Rates,
    /// Credit
    Credit,
    /// Equity
    Equity,
    /// Foreign exchange
    FX,
    /// Commodities
    Commod,
}

/// A named quantity to compute for a priceable.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RiskMeasure {
    /// Display name, unique per measure definition.
    pub name: String,
    /// Kind of quantity.
    pub measure_type: RiskMeasureType,
    /// Asset class scope, if any.
    pub asset_class: Option<AssetClass>,
}

impl RiskMeasure {
    /// Creates a risk measure.
    pub fn new(
        name: impl Into<String>,
        measure_type: RiskMeasureType,
        asset_class: Option<AssetClass>,
    ) -> Self {
        Self {
            name: name.into(),
            measure_type,
            asset_class,
        }
    }

    /// Present value.
    pub fn present_value() -> Self {
        Self::new("PresentValue", RiskMeasureType::PV, None)
    }

    /// Dollar price.
    pub fn dollar_price() -> Self {
        Self::new("DollarPrice", RiskMeasureType::DollarPrice, None)
    }

    /// Interest rate delta.
    pub fn ir_delta() -> Self {
        Self::new("IRDelta", RiskMeasureType::Delta, Some(AssetClass::Rates))
    }

    /// Interest rate vega.
    pub fn ir_vega() -> Self {
        Self::new("IRVega", RiskMeasureType::Vega, Some(AssetClass::Rates))
    }
}

impl fmt::Display for RiskMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// =============================================================================
// MARKET DATA
// =============================================================================

/// Location whose close snapshot supplies market data.
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum MarketDataLocation {
    /// New York close
    #[default]
    NYC,
    /// London close
    LDN,
    /// Hong Kong close
    HKG,
}

impl fmt::Display for MarketDataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            MarketDataLocation::NYC => "NYC",
            MarketDataLocation::LDN => "LDN",
            MarketDataLocation::HKG => "HKG",
        };
        write!(f, "{code}")
    }
}

impl FromStr for MarketDataLocation {
    type Err = TraitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NYC" => Ok(MarketDataLocation::NYC),
            "LDN" => Ok(MarketDataLocation::LDN),
            "HKG" => Ok(MarketDataLocation::HKG),
            other => Err(TraitError::InvalidInput(format!(
                "unknown market data location: {other}"
            ))),
        }
    }
}

/// A pricing date paired with the date whose market data values it.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PricingDateAndMarketDataAsOf {
    /// The valuation date.
    pub pricing_date: Date,
    /// The market data snapshot date.
    pub market_data_as_of: Date,
}

impl PricingDateAndMarketDataAsOf {
    /// Pairs a pricing date with a market data date.
    pub fn new(pricing_date: Date, market_data_as_of: Date) -> Self {
        Self {
            pricing_date,
            market_data_as_of,
        }
    }
}

// =============================================================================
// REQUESTS AND RESULTS
// =============================================================================

/// One remote valuation: a priceable, a measure, and one date pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRequest {
    /// What to value.
    pub priceable: Priceable,
    /// What to compute.
    pub measure: RiskMeasure,
    /// When, and with which market data.
    pub dates: PricingDateAndMarketDataAsOf,
    /// Market data location.
    pub location: MarketDataLocation,
    /// Request the extended execution budget.
    pub is_batch: bool,
}

/// Outcome of one valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskValue {
    /// A computed scalar.
    Scalar(f64),
    /// The service (or the transport) failed for this tuple.
    Error(String),
}

impl RiskValue {
    /// The scalar, if computed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RiskValue::Scalar(v) => Some(*v),
            RiskValue::Error(_) => None,
        }
    }

    /// Returns true for failures.
    pub fn is_error(&self) -> bool {
        matches!(self, RiskValue::Error(_))
    }
}

impl From<f64> for RiskValue {
    fn from(v: f64) -> Self {
        RiskValue::Scalar(v)
    }
}

impl From<Result<f64, TraitError>> for RiskValue {
    fn from(result: Result<f64, TraitError>) -> Self {
        match result {
            Ok(v) => RiskValue::Scalar(v),
            Err(e) => RiskValue::Error(e.to_string()),
        }
    }
}
