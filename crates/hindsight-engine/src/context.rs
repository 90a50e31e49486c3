//! Base execution context.
//!
//! An [`ExecutionContext`] carries what every pricing context needs: the
//! remote service, the pricing cache, the execution mode and the scope
//! lifecycle. It submits one remote request per pricing date, bounded by a
//! per-context semaphore and the mode's timeout, and assembles the answers
//! into a [`DateSeries`]. In async mode the work is queued and only
//! dispatched when the scope exits.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use hindsight_core::calendars::{BusinessDayConvention, JointCalendar};
use hindsight_core::clock::Clock;
use hindsight_core::schedule::business_day_offset;
use hindsight_core::Date;
use hindsight_traits::{
    CacheKey, MarketDataLocation, Priceable, PricingCache, PricingDateAndMarketDataAsOf,
    PricingService, RiskMeasure, RiskRequest, RiskValue, TraitError,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::future::PricingFuture;
use crate::series::{CalcResult, DateSeries, Resolution};

/// Lifecycle of a pricing scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// Built but never entered.
    Unentered,
    /// Inside the scope; calculations are accepted.
    Active,
    /// The scope has been left. It may be entered again.
    Exited,
}

/// Work queued by an async-mode context until its scope exits.
type Dispatch = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Future returned by a [`scoped`] body.
pub type ScopeFuture<'a, T> = Pin<Box<dyn Future<Output = EngineResult<T>> + Send + 'a>>;

/// A context that must be entered before use and exited afterwards.
#[async_trait]
pub trait PricingScope: Send {
    /// Enters the scope.
    fn enter(&mut self) -> EngineResult<()>;

    /// Leaves the scope, dispatching any deferred work.
    ///
    /// Local state is reset even when the teardown fails; the teardown error
    /// is returned afterwards.
    async fn exit(&mut self) -> EngineResult<()>;
}

/// Runs `body` inside the scope of `ctx`.
///
/// The scope is always exited, whether or not the body succeeds. The body's
/// error takes precedence over an exit error.
///
/// ```rust,ignore
/// let result = scoped(&mut ctx, |ctx| {
///     Box::pin(async move { ctx.calc(&swap, &RiskMeasure::present_value()).await })
/// })
/// .await?;
/// ```
pub async fn scoped<C, T, F>(ctx: &mut C, body: F) -> EngineResult<T>
where
    C: PricingScope,
    F: for<'a> FnOnce(&'a mut C) -> ScopeFuture<'a, T>,
{
    ctx.enter()?;
    let outcome = body(ctx).await;
    let exited = ctx.exit().await;

    match (outcome, exited) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(exit_err)) => Err(exit_err),
        (Err(body_err), Ok(())) => Err(body_err),
        (Err(body_err), Err(exit_err)) => {
            warn!(error = %exit_err, "pricing scope exit failed after body error");
            Err(body_err)
        }
    }
}

/// Shared execution state of a pricing context.
pub struct ExecutionContext {
    id: Uuid,
    service: Arc<dyn PricingService>,
    cache: Arc<dyn PricingCache>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    calendar: JointCalendar,
    location: MarketDataLocation,
    is_async: bool,
    is_batch: bool,
    use_cache: bool,
    state: ScopeState,
    pending: Vec<Dispatch>,
    semaphore: Arc<Semaphore>,
}

impl ExecutionContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        service: Arc<dyn PricingService>,
        cache: Arc<dyn PricingCache>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        calendar: JointCalendar,
        location: MarketDataLocation,
        is_async: bool,
        is_batch: bool,
        use_cache: bool,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_requests));
        Self {
            id: Uuid::new_v4(),
            service,
            cache,
            config,
            clock,
            calendar,
            location,
            is_async,
            is_batch,
            use_cache,
            state: ScopeState::Unentered,
            pending: Vec::new(),
            semaphore,
        }
    }

    /// Identifier used to correlate log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScopeState {
        self.state
    }

    /// Returns true inside the scope.
    pub fn is_active(&self) -> bool {
        self.state == ScopeState::Active
    }

    /// Returns true if results are deferred until scope exit.
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Returns true if requests get the batch execution budget.
    pub fn is_batch(&self) -> bool {
        self.is_batch
    }

    /// Returns true if the pricing cache is consulted and populated.
    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    /// Market data location of every request.
    pub fn location(&self) -> MarketDataLocation {
        self.location
    }

    /// Business day calendar of the context.
    pub fn calendar(&self) -> &JointCalendar {
        &self.calendar
    }

    /// Execution settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The pricing cache.
    pub fn cache(&self) -> &Arc<dyn PricingCache> {
        &self.cache
    }

    /// Today, according to the context's clock.
    pub fn today(&self) -> Date {
        self.clock.today()
    }

    /// Number of deferred calculations waiting for scope exit.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Cache key of a (priceable, measure) pair at this context's location.
    pub fn cache_key(&self, priceable: &Priceable, measure: &RiskMeasure) -> CacheKey {
        CacheKey::new(priceable, self.location, measure)
    }

    /// Enters the scope.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidState` if the scope is already active.
    pub fn enter(&mut self) -> EngineResult<()> {
        if self.state == ScopeState::Active {
            return Err(EngineError::invalid_state("pricing context is already active"));
        }
        self.state = ScopeState::Active;
        debug!(context = %self.id, "pricing context entered");
        Ok(())
    }

    /// Leaves the scope and dispatches deferred calculations.
    ///
    /// The state moves to [`ScopeState::Exited`] before any dispatch error is
    /// reported. Submitted requests are never retracted.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidState` if the scope is not active, or
    /// `EngineError::Internal` if deferred work exists and no tokio runtime is
    /// available (the deferred results then resolve to `Cancelled`).
    pub fn on_exit(&mut self) -> EngineResult<()> {
        if self.state != ScopeState::Active {
            return Err(EngineError::invalid_state("pricing context is not active"));
        }
        self.state = ScopeState::Exited;

        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            debug!(context = %self.id, "pricing context exited");
            return Ok(());
        }

        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            EngineError::Internal("no tokio runtime to dispatch deferred calculations".into())
        })?;
        info!(
            context = %self.id,
            count = pending.len(),
            batch = self.is_batch,
            "dispatching deferred calculations"
        );
        for work in pending {
            handle.spawn(work);
        }
        Ok(())
    }

    /// Fails unless the scope is active.
    pub(crate) fn ensure_active(&self, operation: &str) -> EngineResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(EngineError::InvalidState(format!(
                "{operation} requires an active pricing context"
            )))
        }
    }

    /// The market data date used to value `date`.
    ///
    /// Today's close is not yet available, so today is valued on the previous
    /// business day's market data; every other date uses itself.
    pub fn market_data_as_of(&self, date: Date) -> EngineResult<Date> {
        if date == self.today() {
            Ok(business_day_offset(
                date,
                -1,
                BusinessDayConvention::Preceding,
                &self.calendar,
            )?)
        } else {
            Ok(date)
        }
    }

    /// Pairs each date with its market data date.
    pub fn as_of_pairs<I>(&self, dates: I) -> EngineResult<Vec<PricingDateAndMarketDataAsOf>>
    where
        I: IntoIterator<Item = Date>,
    {
        dates
            .into_iter()
            .map(|date| {
                self.market_data_as_of(date)
                    .map(|as_of| PricingDateAndMarketDataAsOf::new(date, as_of))
            })
            .collect()
    }

    /// Values `priceable` for `measure` on every date of `pricing_dates`.
    ///
    /// Dates in `submission` go to the service. Any other date is read from
    /// the cache when caching is on, and submitted when the cache misses.
    pub async fn submit(
        &mut self,
        priceable: &Priceable,
        measure: &RiskMeasure,
        pricing_dates: &[Date],
        submission: Vec<PricingDateAndMarketDataAsOf>,
    ) -> EngineResult<CalcResult> {
        self.ensure_active("calc")?;

        let key = self.cache_key(priceable, measure);
        let submitted: BTreeSet<Date> = submission.iter().map(|p| p.pricing_date).collect();
        let mut requests = submission;
        let mut cached = DateSeries::new();

        for &date in pricing_dates.iter().filter(|d| !submitted.contains(d)) {
            match self.cached_value(&key, date) {
                Some(value) => cached.insert(date, RiskValue::Scalar(value)),
                None => requests.push(PricingDateAndMarketDataAsOf::new(
                    date,
                    self.market_data_as_of(date)?,
                )),
            }
        }

        debug!(
            context = %self.id,
            instrument = %priceable.id,
            measure = %measure,
            requested = requests.len(),
            cached = cached.len(),
            "submitting pricing requests"
        );

        let job = CalcJob {
            service: Arc::clone(&self.service),
            cache: self.use_cache.then(|| Arc::clone(&self.cache)),
            semaphore: Arc::clone(&self.semaphore),
            budget: self.config.request_timeout(self.is_batch),
            key,
            priceable: priceable.clone(),
            measure: measure.clone(),
            location: self.location,
            is_batch: self.is_batch,
            requests,
            series: cached,
        };

        if self.is_async {
            let (promise, future) = PricingFuture::pair();
            self.pending
                .push(Box::pin(async move { promise.fulfil(Ok(job.run().await)) }));
            Ok(CalcResult::Deferred(future))
        } else {
            Ok(CalcResult::Ready(job.run().await))
        }
    }

    /// Resolves `priceable` once per date pairing.
    pub async fn resolve(
        &mut self,
        priceable: &Priceable,
        pairs: Vec<PricingDateAndMarketDataAsOf>,
    ) -> EngineResult<Resolution> {
        self.ensure_active("resolve_fields")?;

        let job = ResolveJob {
            service: Arc::clone(&self.service),
            semaphore: Arc::clone(&self.semaphore),
            budget: self.config.request_timeout(self.is_batch),
            priceable: priceable.clone(),
            location: self.location,
            pairs,
        };

        if self.is_async {
            let (promise, future) = PricingFuture::pair();
            self.pending
                .push(Box::pin(async move { promise.fulfil(job.run().await) }));
            Ok(Resolution::Deferred(future))
        } else {
            Ok(Resolution::Ready(job.run().await?))
        }
    }

    /// Resolves `priceable` for a single date pairing and overwrites it.
    ///
    /// Runs immediately in every mode.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidState` unless exactly one pairing is given.
    pub async fn resolve_in_place(
        &mut self,
        priceable: &mut Priceable,
        pairs: &[PricingDateAndMarketDataAsOf],
    ) -> EngineResult<()> {
        self.ensure_active("resolve_fields")?;

        let [dates] = pairs else {
            return Err(EngineError::InvalidState(format!(
                "in-place resolution needs exactly one pricing date, got {}",
                pairs.len()
            )));
        };

        let budget = self.config.request_timeout(self.is_batch);
        let resolved = bounded(
            &self.semaphore,
            budget,
            self.service.resolve(priceable, *dates, self.location),
        )
        .await?;
        *priceable = resolved;
        Ok(())
    }

    fn cached_value(&self, key: &CacheKey, date: Date) -> Option<f64> {
        if self.use_cache {
            self.cache.get(key, date)
        } else {
            None
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("service", &self.service.name())
            .field("calendar", &self.calendar)
            .field("location", &self.location)
            .field("is_async", &self.is_async)
            .field("is_batch", &self.is_batch)
            .field("use_cache", &self.use_cache)
            .field("state", &self.state)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            warn!(
                context = %self.id,
                count = self.pending.len(),
                "pricing context dropped inside its scope; deferred calculations cancelled"
            );
        }
    }
}

/// Runs one remote call under the concurrency limit and time budget.
async fn bounded<T, F>(semaphore: &Semaphore, budget: Duration, call: F) -> EngineResult<T>
where
    F: Future<Output = Result<T, TraitError>>,
{
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|_| EngineError::Cancelled)?;
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result.map_err(EngineError::from),
        Err(_) => Err(EngineError::Timeout(budget.as_secs())),
    }
}

/// A calculation captured with everything it needs to run detached.
struct CalcJob {
    service: Arc<dyn PricingService>,
    cache: Option<Arc<dyn PricingCache>>,
    semaphore: Arc<Semaphore>,
    budget: Duration,
    key: CacheKey,
    priceable: Priceable,
    measure: RiskMeasure,
    location: MarketDataLocation,
    is_batch: bool,
    requests: Vec<PricingDateAndMarketDataAsOf>,
    series: DateSeries,
}

impl CalcJob {
    async fn run(self) -> DateSeries {
        let CalcJob {
            service,
            cache,
            semaphore,
            budget,
            key,
            priceable,
            measure,
            location,
            is_batch,
            requests,
            mut series,
        } = self;

        let handles: Vec<_> = requests
            .into_iter()
            .map(|dates| {
                let request = RiskRequest {
                    priceable: priceable.clone(),
                    measure: measure.clone(),
                    dates,
                    location,
                    is_batch,
                };
                let service = Arc::clone(&service);
                let semaphore = Arc::clone(&semaphore);
                let handle = tokio::spawn(async move {
                    bounded(&semaphore, budget, service.calc(&request)).await
                });
                (dates.pricing_date, handle)
            })
            .collect();

        for (date, handle) in handles {
            let value = match handle.await {
                Ok(Ok(value)) => {
                    if let Some(cache) = &cache {
                        cache.put(&key, date, value);
                    }
                    RiskValue::Scalar(value)
                }
                Ok(Err(e)) => {
                    warn!(
                        instrument = %priceable.id,
                        measure = %measure,
                        %date,
                        error = %e,
                        "pricing request failed"
                    );
                    RiskValue::Error(e.to_string())
                }
                Err(e) => RiskValue::Error(format!("pricing task failed: {e}")),
            };
            series.insert(date, value);
        }
        series
    }
}

/// A resolution captured with everything it needs to run detached.
struct ResolveJob {
    service: Arc<dyn PricingService>,
    semaphore: Arc<Semaphore>,
    budget: Duration,
    priceable: Priceable,
    location: MarketDataLocation,
    pairs: Vec<PricingDateAndMarketDataAsOf>,
}

impl ResolveJob {
    async fn run(self) -> EngineResult<BTreeMap<Date, Priceable>> {
        let handles: Vec<_> = self
            .pairs
            .into_iter()
            .map(|dates| {
                let service = Arc::clone(&self.service);
                let semaphore = Arc::clone(&self.semaphore);
                let priceable = self.priceable.clone();
                let location = self.location;
                let budget = self.budget;
                let handle = tokio::spawn(async move {
                    bounded(
                        &semaphore,
                        budget,
                        service.resolve(&priceable, dates, location),
                    )
                    .await
                });
                (dates.pricing_date, handle)
            })
            .collect();

        let mut resolved = BTreeMap::new();
        for (date, handle) in handles {
            let priceable = handle
                .await
                .map_err(|e| EngineError::Internal(format!("resolution task failed: {e}")))??;
            resolved.insert(date, priceable);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryPricingCache;
    use hindsight_core::clock::FixedClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PricingService for CountingService {
        fn name(&self) -> &str {
            "counting"
        }

        async fn calc(&self, request: &RiskRequest) -> Result<f64, TraitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(f64::from(request.dates.pricing_date.day()))
        }

        async fn resolve(
            &self,
            priceable: &Priceable,
            _dates: PricingDateAndMarketDataAsOf,
            _location: MarketDataLocation,
        ) -> Result<Priceable, TraitError> {
            let mut resolved = priceable.clone();
            resolved.resolved = true;
            Ok(resolved)
        }
    }

    fn d(day: u32) -> Date {
        Date::from_ymd(2024, 1, day).unwrap()
    }

    fn context(is_async: bool) -> (ExecutionContext, Arc<CountingService>) {
        let service = Arc::new(CountingService {
            calls: AtomicUsize::new(0),
        });
        let ctx = ExecutionContext::new(
            service.clone(),
            Arc::new(InMemoryPricingCache::new()),
            EngineConfig::default(),
            Arc::new(FixedClock(d(3))),
            JointCalendar::new(Vec::new()),
            MarketDataLocation::NYC,
            is_async,
            false,
            true,
        );
        (ctx, service)
    }

    #[test]
    fn test_lifecycle() {
        let (mut ctx, _) = context(false);
        assert_eq!(ctx.state(), ScopeState::Unentered);
        assert!(ctx.on_exit().is_err());

        ctx.enter().unwrap();
        assert!(matches!(ctx.enter(), Err(EngineError::InvalidState(_))));
        ctx.on_exit().unwrap();
        assert_eq!(ctx.state(), ScopeState::Exited);

        ctx.enter().unwrap();
        assert!(ctx.is_active());
    }

    #[test]
    fn test_market_data_as_of() {
        let (ctx, _) = context(false);
        assert_eq!(ctx.market_data_as_of(d(3)).unwrap(), d(2));
        assert_eq!(ctx.market_data_as_of(d(2)).unwrap(), d(2));
        assert_eq!(ctx.market_data_as_of(d(4)).unwrap(), d(4));
    }

    #[tokio::test]
    async fn test_submit_requires_active_scope() {
        let (mut ctx, service) = context(false);
        let swap = Priceable::new("swap-1", "IRSwap");
        let result = ctx
            .submit(&swap, &RiskMeasure::present_value(), &[d(2)], Vec::new())
            .await;
        assert!(matches!(result, Err(EngineError::InvalidState(_))));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_fills_gaps_from_cache_or_service() {
        let (mut ctx, service) = context(false);
        let swap = Priceable::new("swap-1", "IRSwap");
        let pv = RiskMeasure::present_value();
        ctx.cache().put(&ctx.cache_key(&swap, &pv), d(2), 99.0);
        ctx.enter().unwrap();

        // 01-02 is cached, 01-04 is not and falls back to the service
        let series = ctx
            .submit(&swap, &pv, &[d(2), d(3), d(4)], ctx.as_of_pairs([d(3)]).unwrap())
            .await
            .unwrap()
            .ready()
            .unwrap();

        assert_eq!(series.value(&d(2)), Some(99.0));
        assert_eq!(series.value(&d(3)), Some(3.0));
        assert_eq!(series.value(&d(4)), Some(4.0));
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        assert_eq!(ctx.cache().get(&ctx.cache_key(&swap, &pv), d(4)), Some(4.0));
    }

    #[tokio::test]
    async fn test_async_work_waits_for_exit() {
        let (mut ctx, service) = context(true);
        let swap = Priceable::new("swap-1", "IRSwap");
        ctx.enter().unwrap();

        let pairs = ctx.as_of_pairs([d(2)]).unwrap();
        let result = ctx
            .submit(&swap, &RiskMeasure::present_value(), &[d(2)], pairs)
            .await
            .unwrap();
        assert!(result.is_deferred());
        assert_eq!(ctx.pending_count(), 1);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);

        ctx.on_exit().unwrap();
        let series = result.into_series().await.unwrap();
        assert_eq!(series.value(&d(2)), Some(2.0));
    }

    #[tokio::test]
    async fn test_dropped_context_cancels_deferred_work() {
        let (mut ctx, _) = context(true);
        ctx.enter().unwrap();
        let pairs = ctx.as_of_pairs([d(2)]).unwrap();
        let result = ctx
            .submit(&Priceable::new("swap-1", "IRSwap"), &RiskMeasure::present_value(), &[d(2)], pairs)
            .await
            .unwrap();
        drop(ctx);
        assert!(matches!(result.into_series().await, Err(EngineError::Cancelled)));
    }

    #[tokio::test]
    async fn test_resolve_in_place_needs_one_date() {
        let (mut ctx, _) = context(false);
        ctx.enter().unwrap();
        let mut swap = Priceable::new("swap-1", "IRSwap");

        let two = ctx.as_of_pairs([d(2), d(4)]).unwrap();
        assert!(ctx.resolve_in_place(&mut swap, &two).await.is_err());
        assert!(!swap.resolved);

        let one = ctx.as_of_pairs([d(2)]).unwrap();
        ctx.resolve_in_place(&mut swap, &one).await.unwrap();
        assert!(swap.resolved);
    }

    struct Probe {
        entered: usize,
        exited: usize,
        fail_exit: bool,
    }

    #[async_trait]
    impl PricingScope for Probe {
        fn enter(&mut self) -> EngineResult<()> {
            self.entered += 1;
            Ok(())
        }

        async fn exit(&mut self) -> EngineResult<()> {
            self.exited += 1;
            if self.fail_exit {
                Err(EngineError::Internal("teardown".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_scoped_exits_on_body_error() {
        let mut probe = Probe {
            entered: 0,
            exited: 0,
            fail_exit: true,
        };
        let result: EngineResult<()> = scoped(&mut probe, |_| {
            Box::pin(async { Err(EngineError::invalid_argument("body")) })
        })
        .await;

        assert!(matches!(result, Err(EngineError::InvalidArgument(_))));
        assert_eq!((probe.entered, probe.exited), (1, 1));
    }

    #[tokio::test]
    async fn test_scoped_returns_exit_error_after_success() {
        let mut probe = Probe {
            entered: 0,
            exited: 0,
            fail_exit: true,
        };
        let result = scoped(&mut probe, |_| Box::pin(async { Ok(5) })).await;
        assert!(matches!(result, Err(EngineError::Internal(_))));
    }
}
