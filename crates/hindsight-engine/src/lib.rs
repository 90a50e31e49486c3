//! # Hindsight Engine
//!
//! Pricing contexts over a remote pricing service.
//!
//! This crate provides:
//! - [`HistoricalPricingContext`]: valuation over a date range, skipping dates
//!   the pricing cache already holds
//! - [`PricingContext`]: valuation on a single date
//! - [`ExecutionContext`]: the shared scope lifecycle, submission and deferred
//!   dispatch both contexts are built on
//! - [`InMemoryPricingCache`] and the process-wide [`global_cache`]
//! - [`DateSeries`], [`CalcResult`] and [`PricingFuture`] for results
//!
//! ## Architecture
//!
//! ```text
//! HistoricalPricingContext ─┬─> DateRange (resolved once)
//!                           │
//!                           ├─> PricingCache ─> narrowed calc dates
//!                           │
//!                           └─> ExecutionContext ─┬─> PricingService (one request per date)
//!                                                 │
//!                                                 └─> DateSeries | PricingFuture
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut ctx = HistoricalPricingContext::builder(service)
//!     .start(Date::from_ymd(2024, 1, 2)?)
//!     .end(Date::from_ymd(2024, 1, 31)?)
//!     .calendars(["NYC"])
//!     .use_cache(true)
//!     .build()?;
//!
//! let result = scoped(&mut ctx, |ctx| {
//!     Box::pin(async move { ctx.calc(&swap, &RiskMeasure::present_value()).await })
//! })
//! .await?;
//!
//! let series = result.into_series().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod error;
pub mod future;
pub mod historical;
pub mod pricing;
pub mod series;

mod builder;
mod cache;

// Re-exports
pub use cache::{global_cache, InMemoryPricingCache};
pub use config::EngineConfig;
pub use context::{scoped, ExecutionContext, PricingScope, ScopeFuture, ScopeState};
pub use error::{EngineError, EngineResult};
pub use future::PricingFuture;
pub use historical::{HistoricalPricingContext, HistoricalPricingContextBuilder};
pub use pricing::{PricingContext, PricingContextBuilder};
pub use series::{CalcResult, DateSeries, Resolution};
