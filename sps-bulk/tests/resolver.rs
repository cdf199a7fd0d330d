mod common;

use approx::assert_relative_eq;
use common::unpaced;
use rstest::*;
use sps_bulk::{PricingCache, TierResolver};
use sps_core::models::{
    CalculatedPrice, PricePoint, PricingStrategy, ProductRef, RoundingMode, Storefront, Territory,
};
use sps_pricing::{PricingTables, Quote, calculate_regional_price};
use sps_sandbox::{Operation, Sandbox};
use std::time::Duration;
use time::OffsetDateTime;

const TERRITORIES: [&str; 6] = ["US", "FR", "DE", "IT", "JP", "EC"];

#[fixture]
fn prices() -> Vec<CalculatedPrice> {
    let tables = PricingTables::default().for_storefront(Storefront::AppStore);
    let quote = Quote {
        base_amount: 9.99,
        base_currency: sps_core::models::CurrencyCode::USD,
        strategy: PricingStrategy::Ppp,
        rounding: RoundingMode::Charm,
    };
    TERRITORIES
        .iter()
        .map(|code| {
            let territory = Territory::lookup(code).unwrap();
            calculate_regional_price(&quote, territory, &tables).unwrap()
        })
        .collect()
}

#[fixture]
fn product() -> ProductRef {
    ProductRef::new("pro-monthly")
}

#[rstest]
#[tokio::test]
async fn cold_resolution_fetches_once_per_currency(
    prices: Vec<CalculatedPrice>,
    product: ProductRef,
) -> anyhow::Result<()> {
    let sandbox = common::sandbox(Storefront::AppStore, &[]);
    let cache = PricingCache::new(Duration::from_secs(3600));
    let options = unpaced(3);
    let now = OffsetDateTime::now_utc();

    let mut reports = Vec::new();
    let resolution = TierResolver::new(&sandbox, &cache, &options)
        .resolve(&product, &prices, now, |c, t| reports.push((c, t)))
        .await?;

    // USD (US and EC), EUR (FR, DE, IT) and JPY
    assert_eq!(sandbox.calls(Operation::FetchPriceTiers), 3);
    assert_eq!(sandbox.calls(Operation::FetchSourceId), 0);
    assert_eq!(reports.last(), Some(&(3, 3)));
    assert_eq!(cache.tiers.len(), 3);
    assert!(resolution.skipped.is_empty());
    assert_eq!(resolution.resolved.len(), TERRITORIES.len());

    for (resolved, price) in resolution.resolved.iter().zip(&prices) {
        assert_eq!(&resolved.calculated, price);
        let PricePoint::Tier { id, .. } = &resolved.price else {
            panic!("expected a tier");
        };
        assert_eq!(id.territory, price.territory.alpha3);
        assert_eq!(id.source_id, Sandbox::source_id(&product));
    }
    Ok(())
}

#[rstest]
#[tokio::test]
async fn warm_resolution_makes_one_call(
    prices: Vec<CalculatedPrice>,
    product: ProductRef,
) -> anyhow::Result<()> {
    let sandbox = common::sandbox(Storefront::AppStore, &[]);
    let cache = PricingCache::new(Duration::from_secs(3600));
    let options = unpaced(3);
    let now = OffsetDateTime::now_utc();
    let resolver = TierResolver::new(&sandbox, &cache, &options);

    let cold = resolver.resolve(&product, &prices, now, |_, _| {}).await?;
    sandbox.reset_calls();
    let warm = resolver
        .resolve(&product, &prices, now + Duration::from_secs(60), |_, _| {})
        .await?;

    assert_eq!(sandbox.total_calls(), 1);
    assert_eq!(sandbox.calls(Operation::FetchSourceId), 1);
    assert_eq!(cold, warm);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn expired_ladders_are_fetched_again(
    prices: Vec<CalculatedPrice>,
    product: ProductRef,
) -> anyhow::Result<()> {
    let sandbox = common::sandbox(Storefront::AppStore, &[]);
    let cache = PricingCache::new(Duration::from_secs(60));
    let options = unpaced(3);
    let now = OffsetDateTime::now_utc();
    let resolver = TierResolver::new(&sandbox, &cache, &options);

    resolver.resolve(&product, &prices, now, |_, _| {}).await?;
    sandbox.reset_calls();
    resolver
        .resolve(&product, &prices, now + Duration::from_secs(61), |_, _| {})
        .await?;

    assert_eq!(sandbox.calls(Operation::FetchPriceTiers), 3);
    assert_eq!(sandbox.calls(Operation::FetchSourceId), 0);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn missing_ladders_skip_their_currency(
    prices: Vec<CalculatedPrice>,
    product: ProductRef,
) -> anyhow::Result<()> {
    let sandbox = common::sandbox(Storefront::AppStore, &["EUR"]);
    let cache = PricingCache::new(Duration::from_secs(3600));
    let options = unpaced(3);

    let resolution = TierResolver::new(&sandbox, &cache, &options)
        .resolve(&product, &prices, OffsetDateTime::now_utc(), |_, _| {})
        .await?;

    let skipped: Vec<&str> = resolution
        .skipped
        .iter()
        .map(|s| s.territory.as_str())
        .collect();
    assert_eq!(skipped, vec!["FRA", "DEU", "ITA"]);
    assert!(
        resolution
            .skipped
            .iter()
            .all(|s| s.reason == "no price tiers available in EUR")
    );
    assert_eq!(resolution.resolved.len(), 3);
    // an empty ladder is never cached
    assert_eq!(cache.tiers.len(), 2);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn matches_the_closest_tier(product: ProductRef) -> anyhow::Result<()> {
    let sandbox = common::sandbox(Storefront::AppStore, &[]);
    let cache = PricingCache::new(Duration::from_secs(3600));
    let options = unpaced(3);
    let tables = PricingTables::default();
    let quote = Quote {
        base_amount: 9.99,
        base_currency: sps_core::models::CurrencyCode::USD,
        strategy: PricingStrategy::Direct,
        rounding: RoundingMode::Charm,
    };
    let us = calculate_regional_price(&quote, Territory::lookup("US")?, &tables)?;

    let resolution = TierResolver::new(&sandbox, &cache, &options)
        .resolve(&product, &[us], OffsetDateTime::now_utc(), |_, _| {})
        .await?;

    let PricePoint::Tier {
        id, customer_price, ..
    } = &resolution.resolved[0].price
    else {
        panic!("expected a tier");
    };
    assert_relative_eq!(*customer_price, 9.99);
    assert_eq!(id.tier, "10010");
    Ok(())
}
