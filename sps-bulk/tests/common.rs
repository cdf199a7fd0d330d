#![allow(dead_code)]

use sps_bulk::{BulkPricing, BulkPricingOptions, BulkPricingRequest, RateLimitOptions};
use sps_core::models::{CurrencyCode, PricingStrategy, ProductRef, RoundingMode, Storefront};
use sps_pricing::PricingTables;
use sps_sandbox::{Sandbox, config::SandboxConfig};
use std::{sync::Arc, time::Duration};

/// Pacing that never waits, so tests run at full speed
pub fn unpaced(concurrency: usize) -> RateLimitOptions {
    RateLimitOptions {
        retry_base_delay: Duration::from_millis(1),
        ..RateLimitOptions::paced(concurrency, Duration::ZERO)
    }
}

pub fn options() -> BulkPricingOptions {
    BulkPricingOptions {
        resolve: unpaced(3),
        delete: unpaced(2),
        submit: unpaced(1),
        ..Default::default()
    }
}

pub fn sandbox(storefront: Storefront, empty: &[&str]) -> Sandbox {
    Sandbox::new(SandboxConfig {
        storefront,
        empty_currencies: empty
            .iter()
            .map(|code| CurrencyCode::new(code).unwrap())
            .collect(),
        ..Default::default()
    })
}

pub fn service(sandbox: &Sandbox) -> BulkPricing<Sandbox> {
    BulkPricing::new(
        Arc::new(sandbox.clone()),
        &PricingTables::default(),
        options(),
    )
}

pub fn request(base: &str, territories: &[&str]) -> BulkPricingRequest {
    BulkPricingRequest {
        product: ProductRef::new("pro-monthly"),
        base_amount: 9.99,
        base_currency: CurrencyCode::USD,
        base_territory: base.to_owned(),
        territories: territories.iter().map(|code| code.to_string()).collect(),
        strategy: PricingStrategy::Direct,
        rounding: RoundingMode::Charm,
        effective_date: None,
        replace_scheduled: false,
    }
}
