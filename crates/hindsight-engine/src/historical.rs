//! Valuation over a range of dates.
//!
//! A [`HistoricalPricingContext`] prices the same priceable on every date of a
//! fixed [`DateRange`] and returns a [`DateSeries`](crate::DateSeries). With caching on, dates
//! the pricing cache already holds are not resubmitted: each `calc` narrows
//! the range against the cache and unions the gap into an accumulator that
//! lives until the scope exits.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut ctx = HistoricalPricingContext::builder(service)
//!     .start(10usize) // the last 10 business days
//!     .calendars(["NYC"])
//!     .use_cache(true)
//!     .build()?;
//!
//! let series = scoped(&mut ctx, |ctx| {
//!     Box::pin(async move { ctx.calc(&swap, &RiskMeasure::present_value()).await })
//! })
//! .await?
//! .into_series()
//! .await?;
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use hindsight_core::calendars::{Calendar, CalendarRegistry};
use hindsight_core::clock::Clock;
use hindsight_core::{Date, DateBound, DateRange};
use hindsight_traits::{
    MarketDataLocation, Priceable, PricingCache, PricingDateAndMarketDataAsOf, PricingService,
    RiskMeasure,
};

use crate::builder::ContextOptions;
use crate::config::EngineConfig;
use crate::context::{ExecutionContext, PricingScope, ScopeState};
use crate::error::{EngineError, EngineResult};
use crate::series::{CalcResult, Resolution};

/// A pricing context producing one value per date of a fixed range.
#[derive(Debug)]
pub struct HistoricalPricingContext {
    base: ExecutionContext,
    date_range: DateRange,
    calc_dates: Option<BTreeSet<Date>>,
}

impl HistoricalPricingContext {
    /// Starts building a context that prices through `service`.
    pub fn builder(service: Arc<dyn PricingService>) -> HistoricalPricingContextBuilder {
        HistoricalPricingContextBuilder::new(service)
    }

    /// The dates every calculation is reported on.
    pub fn pricing_dates(&self) -> &DateRange {
        &self.date_range
    }

    /// Dates still needing remote computation in this scope.
    ///
    /// `None` means no narrowing has happened and the whole range applies;
    /// an empty set means everything was found in the cache.
    pub fn calc_dates(&self) -> Option<&BTreeSet<Date>> {
        self.calc_dates.as_ref()
    }

    /// The dates to submit, each paired with the market data date valuing it.
    ///
    /// Covers the accumulated calc dates if set, otherwise the whole range.
    pub fn pricing_market_data_as_of(&self) -> EngineResult<Vec<PricingDateAndMarketDataAsOf>> {
        match &self.calc_dates {
            Some(dates) => self.base.as_of_pairs(dates.iter().copied()),
            None => self.base.as_of_pairs(self.date_range.iter().copied()),
        }
    }

    /// The shared execution state.
    pub fn execution(&self) -> &ExecutionContext {
        &self.base
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScopeState {
        self.base.state()
    }

    /// Market data location of every request.
    pub fn market_data_location(&self) -> MarketDataLocation {
        self.base.location()
    }

    /// Values `priceable` for `measure` over the range.
    ///
    /// Returns the series directly in synchronous mode and a deferred result
    /// in async mode.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidState` outside the scope.
    pub async fn calc(
        &mut self,
        priceable: &Priceable,
        measure: &RiskMeasure,
    ) -> EngineResult<CalcResult> {
        self.base.ensure_active("calc")?;
        self.narrow(priceable, measure);
        self.submit(priceable, measure).await
    }

    /// Values `priceable` for several measures over the range.
    ///
    /// Every measure narrows the accumulator before anything is submitted, so
    /// all measures share one submission set.
    pub async fn calc_measures(
        &mut self,
        priceable: &Priceable,
        measures: &[RiskMeasure],
    ) -> EngineResult<BTreeMap<RiskMeasure, CalcResult>> {
        self.base.ensure_active("calc")?;
        for measure in measures {
            self.narrow(priceable, measure);
        }

        let mut results = BTreeMap::new();
        for measure in measures {
            let result = self.submit(priceable, measure).await?;
            results.insert(measure.clone(), result);
        }
        Ok(results)
    }

    /// Resolves `priceable`'s unspecified fields on every date of the range.
    ///
    /// # Errors
    ///
    /// In-place resolution is not defined for a range of dates and always
    /// fails with `EngineError::InvalidState`, leaving the context untouched.
    pub async fn resolve_fields(
        &mut self,
        priceable: &mut Priceable,
        in_place: bool,
    ) -> EngineResult<Option<Resolution>> {
        if in_place {
            return Err(EngineError::invalid_state(
                "cannot resolve in place under a historical pricing context",
            ));
        }
        let pairs = self.pricing_market_data_as_of()?;
        self.base.resolve(priceable, pairs).await.map(Some)
    }

    /// Unions the range's cache gap for (priceable, measure) into the accumulator.
    fn narrow(&mut self, priceable: &Priceable, measure: &RiskMeasure) {
        if !self.base.use_cache() {
            return;
        }

        let key = self.base.cache_key(priceable, measure);
        let cached = self.base.cache().dates(&key).unwrap_or_default();
        let missing = self.date_range.difference(&cached);

        debug!(
            context = %self.base.id(),
            instrument = %priceable.id,
            measure = %measure,
            cached = cached.len(),
            missing = missing.len(),
            "narrowed pricing dates against cache"
        );

        self.calc_dates
            .get_or_insert_with(BTreeSet::new)
            .extend(missing);
    }

    async fn submit(
        &mut self,
        priceable: &Priceable,
        measure: &RiskMeasure,
    ) -> EngineResult<CalcResult> {
        let submission = self.pricing_market_data_as_of()?;
        self.base
            .submit(priceable, measure, self.date_range.dates(), submission)
            .await
    }
}

#[async_trait]
impl PricingScope for HistoricalPricingContext {
    fn enter(&mut self) -> EngineResult<()> {
        self.base.enter()?;
        self.calc_dates = None;
        Ok(())
    }

    async fn exit(&mut self) -> EngineResult<()> {
        let teardown = self.base.on_exit();
        self.calc_dates = None;
        teardown
    }
}

/// Builder for [`HistoricalPricingContext`].
///
/// Exactly one of [`start`](Self::start) and [`dates`](Self::dates) must be set.
pub struct HistoricalPricingContextBuilder {
    options: ContextOptions,
    start: Option<DateBound>,
    end: Option<DateBound>,
    dates: Option<Vec<Date>>,
}

impl HistoricalPricingContextBuilder {
    fn new(service: Arc<dyn PricingService>) -> Self {
        Self {
            options: ContextOptions::new(service),
            start: None,
            end: None,
            dates: None,
        }
    }

    /// First date, or a number of business days counted back from `end`.
    pub fn start(mut self, start: impl Into<DateBound>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Last date, or a number of business days counted on from `start`.
    ///
    /// Defaults to today.
    pub fn end(mut self, end: impl Into<DateBound>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Holiday calendars by registry name, e.g. `["NYC", "LDN"]`.
    pub fn calendars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.calendars = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Explicit pricing dates, used as given (sorted, duplicates dropped).
    pub fn dates(mut self, dates: impl IntoIterator<Item = Date>) -> Self {
        self.dates = Some(dates.into_iter().collect());
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

    /// Skip cached dates and store fresh results.
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

    /// Resolves the date range and builds the context.
    ///
    /// # Errors
    ///
    /// - `EngineError::InvalidArgument` if both or neither of start and dates
    ///   are set
    /// - `EngineError::Core` for an unknown calendar or unresolvable bounds
    pub fn build(self) -> EngineResult<HistoricalPricingContext> {
        let Self {
            options,
            start,
            end,
            dates,
        } = self;

        let base;
        let date_range = match (start, dates) {
            (Some(_), Some(_)) => {
                return Err(EngineError::invalid_argument(
                    "must supply start or dates, not both",
                ))
            }
            (None, None) => return Err(EngineError::invalid_argument("must supply start or dates")),
            (Some(start), None) => {
                base = options.into_execution_context()?;
                let end = end.unwrap_or_else(|| DateBound::Date(base.today()));
                DateRange::resolve(start, end, base.calendar())?
            }
            (None, Some(dates)) => {
                if end.is_some() {
                    warn!("end is ignored when explicit dates are supplied");
                }
                base = options.into_execution_context()?;
                DateRange::from_dates(dates)
            }
        };

        debug!(
            context = %base.id(),
            dates = date_range.len(),
            first = ?date_range.first(),
            last = ?date_range.last(),
            calendar = base.calendar().name(),
            "historical pricing context built"
        );

        Ok(HistoricalPricingContext {
            base,
            date_range,
            calc_dates: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryPricingCache;
    use hindsight_core::clock::FixedClock;
    use hindsight_traits::{RiskRequest, TraitError};
    use proptest::prelude::*;

    struct NullService;

    #[async_trait]
    impl PricingService for NullService {
        fn name(&self) -> &str {
            "null"
        }

        async fn calc(&self, _request: &RiskRequest) -> Result<f64, TraitError> {
            Ok(0.0)
        }

        async fn resolve(
            &self,
            priceable: &Priceable,
            _dates: PricingDateAndMarketDataAsOf,
            _location: MarketDataLocation,
        ) -> Result<Priceable, TraitError> {
            Ok(priceable.clone())
        }
    }

    fn d(month: u32, day: u32) -> Date {
        Date::from_ymd(2024, month, day).unwrap()
    }

    fn builder() -> HistoricalPricingContextBuilder {
        HistoricalPricingContext::builder(Arc::new(NullService))
            .with_cache(Arc::new(InMemoryPricingCache::new()))
            .with_clock(Arc::new(FixedClock(d(1, 10))))
    }

    #[test]
    fn test_start_counts_back_from_today() {
        let ctx = builder().start(3usize).build().unwrap();
        assert_eq!(ctx.pricing_dates().dates(), &[d(1, 8), d(1, 9), d(1, 10)]);
    }

    #[test]
    fn test_explicit_dates_are_sorted() {
        let ctx = builder().dates([d(1, 4), d(1, 2), d(1, 4)]).build().unwrap();
        assert_eq!(ctx.pricing_dates().dates(), &[d(1, 2), d(1, 4)]);
        assert!(ctx.calc_dates().is_none());
        assert_eq!(ctx.state(), ScopeState::Unentered);
    }

    #[test]
    fn test_unknown_calendar() {
        let err = builder().start(d(1, 2)).calendars(["XXX"]).build().unwrap_err();
        assert!(matches!(err, EngineError::Core(_)));
    }

    #[tokio::test]
    async fn test_failed_teardown_still_resets_accumulator() {
        let mut ctx = builder().dates([d(1, 9)]).use_cache(true).build().unwrap();
        ctx.enter().unwrap();
        ctx.calc_dates = Some(BTreeSet::from([d(1, 9)]));
        // Leave the base scope early so the next teardown fails
        ctx.base.on_exit().unwrap();

        let result = ctx.exit().await;
        assert!(matches!(result, Err(EngineError::InvalidState(_))));
        assert!(ctx.calc_dates().is_none());
    }

    #[test]
    fn test_pairs_follow_accumulator() {
        let mut ctx = builder().dates([d(1, 9), d(1, 10)]).build().unwrap();
        let pairs = ctx.pricing_market_data_as_of().unwrap();
        assert_eq!(
            pairs,
            vec![
                PricingDateAndMarketDataAsOf::new(d(1, 9), d(1, 9)),
                PricingDateAndMarketDataAsOf::new(d(1, 10), d(1, 9)),
            ]
        );

        ctx.calc_dates = Some(BTreeSet::new());
        assert!(ctx.pricing_market_data_as_of().unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_accumulator_is_union_of_gaps(
            pv_hits in proptest::collection::btree_set(0i64..10, 0..10),
            delta_hits in proptest::collection::btree_set(0i64..10, 0..10),
        ) {
            let start = d(1, 1);
            let range: Vec<Date> = (0..10).map(|n| start.add_days(n)).collect();
            let cache = Arc::new(InMemoryPricingCache::new());
            let mut ctx = HistoricalPricingContext::builder(Arc::new(NullService))
                .with_cache(cache.clone())
                .with_clock(Arc::new(FixedClock(d(6, 1))))
                .dates(range.iter().copied())
                .use_cache(true)
                .build()
                .unwrap();

            let swap = Priceable::new("swap-1", "IRSwap");
            let pv = RiskMeasure::present_value();
            let delta = RiskMeasure::ir_delta();
            for n in &pv_hits {
                cache.put(&ctx.base.cache_key(&swap, &pv), start.add_days(*n), 1.0);
            }
            for n in &delta_hits {
                cache.put(&ctx.base.cache_key(&swap, &delta), start.add_days(*n), 1.0);
            }

            ctx.narrow(&swap, &pv);
            let after_pv = ctx.calc_dates().cloned().unwrap();
            ctx.narrow(&swap, &delta);
            let after_delta = ctx.calc_dates().cloned().unwrap();

            let gap = |hits: &BTreeSet<i64>| -> BTreeSet<Date> {
                (0..10).filter(|n| !hits.contains(n)).map(|n| start.add_days(n)).collect()
            };
            prop_assert_eq!(&after_pv, &gap(&pv_hits));
            prop_assert!(after_pv.is_subset(&after_delta));
            prop_assert_eq!(
                after_delta,
                gap(&pv_hits).union(&gap(&delta_hits)).copied().collect::<BTreeSet<_>>()
            );
        }
    }
}
