//! # Hindsight Traits
//!
//! The contract between pricing contexts and their collaborators.
//!
//! This crate contains the data model the contexts consume and produce, and
//! trait definitions for the services they call. Implementations live in
//! `hindsight-engine` (cache) and extension crates (services).
//!
//! ## Module Structure
//!
//! - [`priceable`]: Instruments submitted for valuation
//! - [`risk`]: Risk measures, market data locations, request/response tuples
//! - [`service`]: The remote pricing service
//! - [`cache`]: The pricing cache
//! - [`ids`]: Identifier newtypes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod error;
pub mod ids;
pub mod priceable;
pub mod risk;
pub mod service;

// Re-export commonly used types
pub use cache::{CacheKey, PricingCache};
pub use error::TraitError;
pub use ids::*;
pub use priceable::Priceable;
pub use risk::{
    AssetClass, MarketDataLocation, PricingDateAndMarketDataAsOf, RiskMeasure, RiskMeasureType,
    RiskRequest, RiskValue,
};
pub use service::PricingService;
