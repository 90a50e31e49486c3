//! Options shared by every context builder.

use std::sync::Arc;

use hindsight_core::calendars::CalendarRegistry;
use hindsight_core::clock::{Clock, SystemClock};
use hindsight_traits::{MarketDataLocation, PricingCache, PricingService};

use crate::cache::global_cache;
use crate::config::EngineConfig;
use crate::context::ExecutionContext;
use crate::error::EngineResult;

/// Execution settings collected by the context builders.
pub(crate) struct ContextOptions {
    service: Arc<dyn PricingService>,
    cache: Option<Arc<dyn PricingCache>>,
    config: Option<EngineConfig>,
    clock: Option<Arc<dyn Clock>>,
    registry: Option<CalendarRegistry>,
    pub(crate) calendars: Option<Vec<String>>,
    pub(crate) location: Option<MarketDataLocation>,
    pub(crate) is_async: bool,
    pub(crate) is_batch: bool,
    pub(crate) use_cache: bool,
}

impl ContextOptions {
    pub(crate) fn new(service: Arc<dyn PricingService>) -> Self {
        Self {
            service,
            cache: None,
            config: None,
            clock: None,
            registry: None,
            calendars: None,
            location: None,
            is_async: false,
            is_batch: false,
            use_cache: false,
        }
    }

    pub(crate) fn set_cache(&mut self, cache: Arc<dyn PricingCache>) {
        self.cache = Some(cache);
    }

    pub(crate) fn set_config(&mut self, config: EngineConfig) {
        self.config = Some(config);
    }

    pub(crate) fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = Some(clock);
    }

    pub(crate) fn set_registry(&mut self, registry: CalendarRegistry) {
        self.registry = Some(registry);
    }

    /// Builds the base execution context.
    ///
    /// Calendars default to the configuration's `default_calendars`, the
    /// location to its `default_location`.
    pub(crate) fn into_execution_context(self) -> EngineResult<ExecutionContext> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let registry = match self.registry.as_ref() {
            Some(registry) => registry,
            None => CalendarRegistry::global(),
        };
        let names = self
            .calendars
            .clone()
            .unwrap_or_else(|| config.default_calendars.clone());
        let calendar = registry.joint(&names)?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let location = self.location.unwrap_or(config.default_location);

        Ok(ExecutionContext::new(
            self.service,
            self.cache.unwrap_or_else(global_cache),
            config,
            clock,
            calendar,
            location,
            self.is_async,
            self.is_batch,
            self.use_cache,
        ))
    }
}
