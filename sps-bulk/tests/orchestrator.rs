mod common;

use approx::assert_relative_eq;
use common::{request, sandbox, service};
use futures::StreamExt as _;
use sps_bulk::{BulkPricingError, Phase, ProgressEvent, ProgressWriter, ValidationError, progress_channel};
use sps_core::{
    models::{PricePoint, Storefront, Territory},
    ports::PlatformError,
};
use sps_sandbox::Operation;
use time::{Duration, OffsetDateTime};

fn territory(code: &str) -> &'static Territory {
    Territory::lookup(code).unwrap()
}

/// A writer whose events nobody reads
fn writer<T>() -> ProgressWriter<T> {
    progress_channel().0
}

#[test_log::test(tokio::test)]
async fn skips_territories_without_tiers() -> anyhow::Result<()> {
    let sandbox = sandbox(Storefront::AppStore, &["JPY"]);
    let service = service(&sandbox);
    let request = request("US", &["US", "FR", "JP", "GB", "CA"]);

    let summary = service
        .apply(&request, &writer(), OffsetDateTime::now_utc())
        .await?;

    assert_eq!(summary.resolved.len(), 4);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].territory, "JPN");
    assert_eq!(summary.base_territory, "USA");

    let submissions = sandbox.submissions(&request.product);
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].prices.len(), 4);
    assert_eq!(submissions[0].base_territory, territory("US"));
    Ok(())
}

#[tokio::test]
async fn missing_base_fails_before_any_call() {
    let sandbox = sandbox(Storefront::AppStore, &[]);
    let service = service(&sandbox);
    let request = request("US", &["FR", "DE"]);

    let error = service
        .apply(&request, &writer(), OffsetDateTime::now_utc())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        BulkPricingError::Validation(ValidationError::MissingBaseTerritory(_))
    ));
    assert_eq!(sandbox.total_calls(), 0);
}

#[tokio::test]
async fn malformed_requests_fail_validation() {
    let sandbox = sandbox(Storefront::AppStore, &[]);
    let service = service(&sandbox);
    let now = OffsetDateTime::now_utc();

    let unknown = request("US", &["US", "XX"]);
    let error = service.apply(&unknown, &writer(), now).await.unwrap_err();
    assert!(matches!(
        error,
        BulkPricingError::Validation(ValidationError::UnknownTerritory(code)) if code == "XX"
    ));

    let mut free = request("US", &["US"]);
    free.base_amount = 0.0;
    let error = service.apply(&free, &writer(), now).await.unwrap_err();
    assert!(matches!(
        error,
        BulkPricingError::Validation(ValidationError::InvalidBaseAmount(_))
    ));

    let empty = request("US", &[]);
    let error = service.apply(&empty, &writer(), now).await.unwrap_err();
    assert!(matches!(
        error,
        BulkPricingError::Validation(ValidationError::NoTerritories)
    ));

    assert_eq!(sandbox.total_calls(), 0);
}

#[tokio::test]
async fn codes_are_deduplicated_across_alphabets() -> anyhow::Result<()> {
    let sandbox = sandbox(Storefront::AppStore, &[]);
    let service = service(&sandbox);
    let request = request("usa", &["US", "FRA", "fr", "USA", "RU"]);

    let summary = service
        .apply(&request, &writer(), OffsetDateTime::now_utc())
        .await?;

    let resolved: Vec<&str> = summary
        .resolved
        .iter()
        .map(|r| r.calculated.territory.alpha2)
        .collect();
    assert_eq!(resolved, vec!["US", "FR"]);
    // the app store does not sell in Russia
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].territory, "RUS");
    Ok(())
}

#[tokio::test]
async fn nothing_resolved_is_an_error() {
    let sandbox = sandbox(Storefront::AppStore, &["USD"]);
    let service = service(&sandbox);
    let request = request("US", &["US", "EC"]);

    let error = service
        .apply(&request, &writer(), OffsetDateTime::now_utc())
        .await
        .unwrap_err();

    assert!(matches!(error, BulkPricingError::NothingResolved { skipped: 2 }));
    assert_eq!(sandbox.calls(Operation::SubmitPrices), 0);
}

#[tokio::test]
async fn unresolved_base_is_an_error() {
    let sandbox = sandbox(Storefront::AppStore, &["JPY"]);
    let service = service(&sandbox);
    let request = request("JP", &["JP", "US"]);

    let error = service
        .apply(&request, &writer(), OffsetDateTime::now_utc())
        .await
        .unwrap_err();

    let BulkPricingError::BaseTerritoryUnresolved { territory, reason } = error else {
        panic!("unexpected error {error}");
    };
    assert_eq!(territory, "JPN");
    assert_eq!(reason, "no price tiers available in JPY");
    assert_eq!(sandbox.calls(Operation::SubmitPrices), 0);
}

#[tokio::test]
async fn marketplace_submits_amounts() -> anyhow::Result<()> {
    let sandbox = sandbox(Storefront::Marketplace, &[]);
    let service = service(&sandbox);
    let request = request("US", &["US", "DE", "CN"]);

    let summary = service
        .apply(&request, &writer(), OffsetDateTime::now_utc())
        .await?;

    assert_eq!(sandbox.calls(Operation::FetchPriceTiers), 0);
    assert_eq!(summary.base_territory, "US");
    assert_eq!(summary.skipped[0].territory, "CN");
    let PricePoint::Amount { price } = &summary.resolved[1].price else {
        panic!("expected an amount");
    };
    assert_relative_eq!(price.amount(), 8.99);
    Ok(())
}

#[tokio::test]
async fn replaces_scheduled_prices() -> anyhow::Result<()> {
    let sandbox = sandbox(Storefront::AppStore, &[]);
    let service = service(&sandbox);
    let mut request = request("US", &["US", "FR"]);
    request.replace_scheduled = true;

    let today = OffsetDateTime::now_utc().date();
    let product = &request.product;
    let due = sandbox.schedule(product, territory("FR"), today);
    let past = sandbox.schedule(product, territory("US"), today - Duration::days(3));
    sandbox.schedule(product, territory("FR"), today + Duration::days(7));
    let elsewhere = sandbox.schedule(product, territory("DE"), today + Duration::days(7));

    let summary = service
        .apply(&request, &writer(), OffsetDateTime::now_utc())
        .await?;

    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.deletions_skipped, 1);
    assert_eq!(sandbox.calls(Operation::DeleteScheduledPrice), 2);
    assert_eq!(sandbox.scheduled(product), vec![due, past, elsewhere]);
    Ok(())
}

#[tokio::test]
async fn rejected_submission_aborts_with_counts() {
    let sandbox = sandbox(Storefront::AppStore, &[]);
    let service = service(&sandbox);
    let request = request("US", &["US", "FR"]);
    sandbox.fail_next(Operation::SubmitPrices, PlatformError::invalid("rejected"));

    let error = service
        .apply(&request, &writer(), OffsetDateTime::now_utc())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        BulkPricingError::Aborted {
            phase: Phase::Submitting,
            success_count: 0,
            total_count: 1,
            ..
        }
    ));
    assert!(sandbox.submissions(&request.product).is_empty());
}

#[tokio::test]
async fn transient_failures_are_retried() -> anyhow::Result<()> {
    let sandbox = sandbox(Storefront::AppStore, &[]);
    let service = service(&sandbox);
    let request = request("US", &["US", "FR"]);
    sandbox.fail_next(Operation::FetchPriceTiers, PlatformError::status(503, "busy"));
    sandbox.fail_next(Operation::SubmitPrices, PlatformError::status(429, "slow down"));

    let summary = service
        .apply(&request, &writer(), OffsetDateTime::now_utc())
        .await?;

    assert_eq!(summary.resolved.len(), 2);
    assert_eq!(sandbox.calls(Operation::FetchPriceTiers), 3);
    assert_eq!(sandbox.calls(Operation::SubmitPrices), 2);
    Ok(())
}

#[tokio::test]
async fn second_run_uses_cached_tiers() -> anyhow::Result<()> {
    let sandbox = sandbox(Storefront::AppStore, &[]);
    let service = service(&sandbox);
    let request = request("US", &["US", "FR", "DE", "JP"]);

    service
        .apply(&request, &writer(), OffsetDateTime::now_utc())
        .await?;
    sandbox.reset_calls();
    service
        .apply(&request, &writer(), OffsetDateTime::now_utc())
        .await?;

    assert_eq!(sandbox.calls(Operation::FetchPriceTiers), 0);
    assert_eq!(sandbox.calls(Operation::FetchSourceId), 1);
    assert_eq!(sandbox.calls(Operation::SubmitPrices), 1);
    Ok(())
}

#[tokio::test]
async fn streams_progress_then_the_summary() {
    let sandbox = sandbox(Storefront::AppStore, &[]);
    let service = service(&sandbox);

    let events: Vec<_> = service
        .stream(request("US", &["US", "FR", "JP"]))
        .collect()
        .await;

    let (last, rest) = events.split_last().unwrap();
    let ProgressEvent::Done { result } = last else {
        panic!("expected a summary, got {last:?}");
    };
    assert_eq!(result.resolved.len(), 3);

    let phases: Vec<Phase> = rest
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Progress { phase, .. } => *phase,
            _ => None,
        })
        .collect();
    assert_eq!(phases.first(), Some(&Phase::Calculating));
    assert_eq!(phases.last(), Some(&Phase::Submitting));
    assert!(phases.contains(&Phase::Resolving));
}

#[tokio::test]
async fn streams_failures_with_progress() {
    let sandbox = sandbox(Storefront::AppStore, &[]);
    let service = service(&sandbox);
    sandbox.fail_next(Operation::FetchPriceTiers, PlatformError::invalid("rejected"));

    let events: Vec<_> = service
        .stream(request("US", &["US", "FR", "JP"]))
        .collect()
        .await;

    let Some(ProgressEvent::Error {
        completed, total, ..
    }) = events.last()
    else {
        panic!("expected an error, got {:?}", events.last());
    };
    // three currencies, the first fetch failed
    assert_eq!(*completed, Some(2));
    assert_eq!(*total, Some(3));
    assert_eq!(sandbox.calls(Operation::SubmitPrices), 0);
}
