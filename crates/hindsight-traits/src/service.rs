//! The remote pricing service, as seen by pricing contexts.
//!
//! Transport, authentication and wire encoding live behind this trait;
//! contexts only submit tuples and collect values.

use async_trait::async_trait;

use crate::error::TraitError;
use crate::priceable::Priceable;
use crate::risk::{MarketDataLocation, PricingDateAndMarketDataAsOf, RiskRequest};

/// Remote engine that values priceables and resolves their fields.
#[async_trait]
pub trait PricingService: Send + Sync {
    /// Name for logging.
    fn name(&self) -> &str;

    /// Computes one (priceable, measure, pricing date, market data date) tuple.
    async fn calc(&self, request: &RiskRequest) -> Result<f64, TraitError>;

    /// Returns `priceable` with unspecified fields filled in as of `dates`.
    async fn resolve(
        &self,
        priceable: &Priceable,
        dates: PricingDateAndMarketDataAsOf,
        location: MarketDataLocation,
    ) -> Result<Priceable, TraitError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskMeasure;
    use hindsight_core::Date;
    use std::sync::Arc;

    struct ConstantService(f64);

    #[async_trait]
    impl PricingService for ConstantService {
        fn name(&self) -> &str {
            "constant"
        }

        async fn calc(&self, _request: &RiskRequest) -> Result<f64, TraitError> {
            Ok(self.0)
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

    #[tokio::test]
    async fn test_service_is_object_safe() {
        let service: Arc<dyn PricingService> = Arc::new(ConstantService(42.0));
        let date = Date::from_ymd(2024, 1, 2).unwrap();
        let request = RiskRequest {
            priceable: Priceable::new("swap-1", "IRSwap"),
            measure: RiskMeasure::present_value(),
            dates: PricingDateAndMarketDataAsOf::new(date, date),
            location: MarketDataLocation::NYC,
            is_batch: false,
        };

        assert_eq!(service.calc(&request).await.unwrap(), 42.0);
        let resolved = service
            .resolve(&request.priceable, request.dates, request.location)
            .await
            .unwrap();
        assert!(resolved.resolved);
    }
}
