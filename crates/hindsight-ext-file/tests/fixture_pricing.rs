//! Historical pricing against file fixtures.

use std::io::Write;
use std::sync::Arc;

use hindsight_core::calendars::CalendarRegistry;
use hindsight_core::clock::FixedClock;
use hindsight_core::Date;
use hindsight_engine::{scoped, HistoricalPricingContext, InMemoryPricingCache};
use hindsight_ext_file::{register_holiday_calendar, FixturePricingService};
use hindsight_traits::{CacheKey, MarketDataLocation, Priceable, PricingCache, RiskMeasure, RiskValue};

fn d(day: u32) -> Date {
    Date::from_ymd(2024, 1, day).unwrap()
}

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_csv_fixture_with_partial_cache() {
    let fixtures = write_temp(
        "instrument,measure,date,value\n\
         swap-1,PresentValue,2024-01-03,101.2\n\
         swap-1,PresentValue,2024-01-04,101.7\n",
    );
    let service = Arc::new(FixturePricingService::from_csv_file(fixtures.path()).unwrap());
    let cache = Arc::new(InMemoryPricingCache::new());

    let swap = Priceable::new("swap-1", "IRSwap");
    let pv = RiskMeasure::present_value();
    cache.put(&CacheKey::new(&swap, MarketDataLocation::NYC, &pv), d(2), 100.9);

    let mut ctx = HistoricalPricingContext::builder(service.clone())
        .dates([d(2), d(3), d(4)])
        .use_cache(true)
        .with_cache(cache.clone())
        .with_clock(Arc::new(FixedClock(d(10))))
        .build()
        .unwrap();

    let series = scoped(&mut ctx, |ctx| {
        Box::pin(async move { ctx.calc(&swap, &pv).await })
    })
    .await
    .unwrap()
    .into_series()
    .await
    .unwrap();

    let submitted: Vec<Date> = service
        .requests()
        .iter()
        .map(|r| r.dates.pricing_date)
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    assert_eq!(submitted, vec![d(3), d(4)]);
    assert_eq!(series.value(&d(2)), Some(100.9));
    assert_eq!(series.value(&d(3)), Some(101.2));
    assert_eq!(series.value(&d(4)), Some(101.7));
}

#[tokio::test]
async fn test_missing_fixture_is_an_error_entry() {
    let fixtures = write_temp(
        r#"[{ "instrument": "swap-1", "measure": "PresentValue", "values": { "2024-01-02": 1.0 } }]"#,
    );
    let service = Arc::new(FixturePricingService::from_json_file(fixtures.path()).unwrap());

    let mut ctx = HistoricalPricingContext::builder(service)
        .dates([d(2), d(3)])
        .with_cache(Arc::new(InMemoryPricingCache::new()))
        .with_clock(Arc::new(FixedClock(d(10))))
        .build()
        .unwrap();

    let series = scoped(&mut ctx, |ctx| {
        Box::pin(async move {
            ctx.calc(&Priceable::new("swap-1", "IRSwap"), &RiskMeasure::present_value())
                .await
        })
    })
    .await
    .unwrap()
    .ready()
    .unwrap();

    assert_eq!(series.value(&d(2)), Some(1.0));
    assert!(matches!(series.get(&d(3)), Some(RiskValue::Error(msg)) if msg.contains("not found")));
}

#[test]
fn test_holiday_file_shapes_the_range() {
    let holidays = write_temp(r#"{ "name": "Desk", "holidays": ["2024-01-03"] }"#);
    let mut registry = CalendarRegistry::with_builtins();
    register_holiday_calendar(&mut registry, "DESK", holidays.path()).unwrap();

    let ctx = HistoricalPricingContext::builder(Arc::new(FixturePricingService::new()))
        .start(d(1))
        .end(d(5))
        .calendars(["NYC", "DESK"])
        .with_calendars(registry)
        .with_cache(Arc::new(InMemoryPricingCache::new()))
        .build()
        .unwrap();

    assert_eq!(ctx.pricing_dates().dates(), &[d(2), d(4), d(5)]);
}
