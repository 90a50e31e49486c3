//! Valuation on a single date.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use hindsight_core::calendars::CalendarRegistry;
use hindsight_core::clock::Clock;
use hindsight_core::Date;
use hindsight_traits::{
    MarketDataLocation, Priceable, PricingCache, PricingDateAndMarketDataAsOf, PricingService,
    RiskMeasure,
};

use crate::builder::ContextOptions;
use crate::config::EngineConfig;
use crate::context::{ExecutionContext, PricingScope, ScopeState};
use crate::error::EngineResult;
use crate::series::{CalcResult, Resolution};

/// A pricing context valuing on one pricing date.
///
/// The result of `calc` is a one-date series.
#[derive(Debug)]
pub struct PricingContext {
    base: ExecutionContext,
    pricing_date: Date,
    market_data_as_of: Option<Date>,
}

impl PricingContext {
    /// Starts building a context that prices through `service`.
    pub fn builder(service: Arc<dyn PricingService>) -> PricingContextBuilder {
        PricingContextBuilder {
            options: ContextOptions::new(service),
            pricing_date: None,
            market_data_as_of: None,
        }
    }

    /// The valuation date.
    pub fn pricing_date(&self) -> Date {
        self.pricing_date
    }

    /// The pricing date paired with its market data date.
    pub fn pricing_market_data_as_of(&self) -> EngineResult<PricingDateAndMarketDataAsOf> {
        let as_of = match self.market_data_as_of {
            Some(date) => date,
            None => self.base.market_data_as_of(self.pricing_date)?,
        };
        Ok(PricingDateAndMarketDataAsOf::new(self.pricing_date, as_of))
    }

    /// The shared execution state.
    pub fn execution(&self) -> &ExecutionContext {
        &self.base
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScopeState {
        self.base.state()
    }

    /// Values `priceable` for `measure` on the pricing date.
    pub async fn calc(
        &mut self,
        priceable: &Priceable,
        measure: &RiskMeasure,
    ) -> EngineResult<CalcResult> {
        self.base.ensure_active("calc")?;

        let key = self.base.cache_key(priceable, measure);
        let hit = self.base.use_cache() && self.base.cache().get(&key, self.pricing_date).is_some();
        let submission = if hit {
            Vec::new()
        } else {
            vec![self.pricing_market_data_as_of()?]
        };

        self.base
            .submit(priceable, measure, &[self.pricing_date], submission)
            .await
    }

    /// Resolves `priceable`'s unspecified fields as of the pricing date.
    ///
    /// In place, `priceable` is overwritten and `None` is returned.
    pub async fn resolve_fields(
        &mut self,
        priceable: &mut Priceable,
        in_place: bool,
    ) -> EngineResult<Option<Resolution>> {
        let pair = self.pricing_market_data_as_of()?;
        if in_place {
            self.base.resolve_in_place(priceable, &[pair]).await?;
            Ok(None)
        } else {
            self.base.resolve(priceable, vec![pair]).await.map(Some)
        }
    }
}

#[async_trait]
impl PricingScope for PricingContext {
    fn enter(&mut self) -> EngineResult<()> {
        self.base.enter()
    }

    async fn exit(&mut self) -> EngineResult<()> {
        self.base.on_exit()
    }
}

/// Builder for [`PricingContext`].
pub struct PricingContextBuilder {
    options: ContextOptions,
    pricing_date: Option<Date>,
    market_data_as_of: Option<Date>,
}

impl PricingContextBuilder {
    /// Valuation date; defaults to today.
    pub fn pricing_date(mut self, date: Date) -> Self {
        self.pricing_date = Some(date);
        self
    }

    /// Market data date; defaults to the pricing date, or the previous
    /// business day when pricing today.
    pub fn market_data_as_of(mut self, date: Date) -> Self {
        self.market_data_as_of = Some(date);
        self
    }

    /// Holiday calendars by registry name.
    pub fn calendars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.calendars = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Defer results until the scope exits.
    pub fn is_async(mut self, is_async: bool) -> Self {
        self.options.is_async = is_async;
        self
    }

    /// Use the extended execution budget.
    pub fn is_batch(mut self, is_batch: bool) -> Self {
        self.options.is_batch = is_batch;
        self
    }

    /// Read cached values and store fresh results.
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.options.use_cache = use_cache;
        self
    }

    /// Market data location; defaults to the configured location.
    pub fn market_data_location(mut self, location: MarketDataLocation) -> Self {
        self.options.location = Some(location);
        self
    }

    /// Use `cache` instead of the process-wide cache.
    pub fn with_cache(mut self, cache: Arc<dyn PricingCache>) -> Self {
        self.options.set_cache(cache);
        self
    }

    /// Execution settings.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.options.set_config(config);
        self
    }

    /// Source of "today".
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.options.set_clock(clock);
        self
    }

    /// Registry that calendar names are looked up in.
    pub fn with_calendars(mut self, registry: CalendarRegistry) -> Self {
        self.options.set_registry(registry);
        self
    }

    /// Builds the context.
    pub fn build(self) -> EngineResult<PricingContext> {
        let base = self.options.into_execution_context()?;
        let pricing_date = self.pricing_date.unwrap_or_else(|| base.today());
        debug!(context = %base.id(), %pricing_date, "pricing context built");

        Ok(PricingContext {
            base,
            pricing_date,
            market_data_as_of: self.market_data_as_of,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryPricingCache;
    use crate::error::EngineError;
    use hindsight_core::clock::FixedClock;
    use hindsight_traits::{RiskRequest, TraitError};

    struct EchoService;

    #[async_trait]
    impl PricingService for EchoService {
        fn name(&self) -> &str {
            "echo"
        }

        async fn calc(&self, request: &RiskRequest) -> Result<f64, TraitError> {
            Ok(f64::from(request.dates.market_data_as_of.day()))
        }

        async fn resolve(
            &self,
            priceable: &Priceable,
            dates: PricingDateAndMarketDataAsOf,
            _location: MarketDataLocation,
        ) -> Result<Priceable, TraitError> {
            let mut resolved = priceable
                .clone()
                .with_field("as_of", dates.market_data_as_of.to_string());
            resolved.resolved = true;
            Ok(resolved)
        }
    }

    fn d(day: u32) -> Date {
        Date::from_ymd(2024, 1, day).unwrap()
    }

    fn builder() -> PricingContextBuilder {
        PricingContext::builder(Arc::new(EchoService))
            .with_cache(Arc::new(InMemoryPricingCache::new()))
            .with_clock(Arc::new(FixedClock(d(3))))
    }

    #[test]
    fn test_defaults_to_today_on_previous_close() {
        let ctx = builder().build().unwrap();
        assert_eq!(ctx.pricing_date(), d(3));
        assert_eq!(
            ctx.pricing_market_data_as_of().unwrap(),
            PricingDateAndMarketDataAsOf::new(d(3), d(2))
        );
    }

    #[test]
    fn test_explicit_market_data_date() {
        let ctx = builder().pricing_date(d(5)).market_data_as_of(d(4)).build().unwrap();
        assert_eq!(ctx.pricing_market_data_as_of().unwrap().market_data_as_of, d(4));
    }

    #[tokio::test]
    async fn test_calc_returns_one_date() {
        let mut ctx = builder().pricing_date(d(5)).build().unwrap();
        ctx.enter().unwrap();
        let series = ctx
            .calc(&Priceable::new("swap-1", "IRSwap"), &RiskMeasure::present_value())
            .await
            .unwrap()
            .ready()
            .unwrap();
        ctx.exit().await.unwrap();

        assert_eq!(series.dates(), vec![d(5)]);
        assert_eq!(series.value(&d(5)), Some(5.0));
    }

    #[tokio::test]
    async fn test_resolve_in_place() {
        let mut ctx = builder().build().unwrap();
        let mut swap = Priceable::new("swap-1", "IRSwap");

        let outside = ctx.resolve_fields(&mut swap, true).await;
        assert!(matches!(outside, Err(EngineError::InvalidState(_))));

        ctx.enter().unwrap();
        assert!(ctx.resolve_fields(&mut swap, true).await.unwrap().is_none());
        assert!(swap.resolved);
        assert_eq!(swap.field("as_of"), Some(&"2024-01-02".into()));
    }
}
