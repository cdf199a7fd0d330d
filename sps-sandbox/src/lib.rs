#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

use dashmap::DashMap;
use sps_core::{
    models::{CurrencyCode, ProductRef, ResolvedPrice, ScheduledPrice, Territory, TierEntry},
    ports::PlatformError,
};
use sps_pricing::PricingTables;
use std::{collections::VecDeque, sync::Arc};
use time::Date;

pub mod config;
use config::SandboxConfig;

mod r#impl;

/// Construction of per-currency tier ladders.
pub mod ladder;

/// The operations of the storefront port, for counting calls and injecting faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Looking up a product's source identifier
    FetchSourceId,
    /// Listing a territory's price tiers
    FetchPriceTiers,
    /// Listing scheduled price changes
    ListScheduledPrices,
    /// Deleting a scheduled price change
    DeleteScheduledPrice,
    /// Submitting prices
    SubmitPrices,
}

/// A price schedule accepted by the sandbox.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// The prices submitted
    pub prices: Vec<ResolvedPrice>,
    /// The anchor territory named with them
    pub base_territory: &'static Territory,
}

/// An in-memory storefront.
///
/// Clones share their state, so a test can keep one handle while the code
/// under test owns another.
///
/// # Example
///
/// ```
/// use sps_core::{models::ProductRef, ports::PlatformClient};
/// use sps_sandbox::{Operation, Sandbox, config::SandboxConfig};
///
/// # tokio_test::block_on(async {
/// let sandbox = Sandbox::new(SandboxConfig::default());
/// let source_id = sandbox.fetch_source_id(&ProductRef::new("pro")).await.unwrap();
/// assert_eq!(source_id, "src-pro");
/// assert_eq!(sandbox.calls(Operation::FetchSourceId), 1);
/// # })
/// ```
#[derive(Clone)]
pub struct Sandbox {
    inner: Arc<Inner>,
}

struct Inner {
    config: SandboxConfig,
    tables: PricingTables,
    ladders: DashMap<CurrencyCode, Arc<[TierEntry]>>,
    scheduled: DashMap<ProductRef, Vec<ScheduledPrice>>,
    submissions: DashMap<ProductRef, Vec<Submission>>,
    faults: DashMap<Operation, VecDeque<PlatformError>>,
    calls: DashMap<Operation, usize>,
}

impl Sandbox {
    /// A fresh sandbox with no scheduled prices
    pub fn new(config: SandboxConfig) -> Self {
        let tables = PricingTables::default().for_storefront(config.storefront);
        Self {
            inner: Arc::new(Inner {
                config,
                tables,
                ladders: DashMap::new(),
                scheduled: DashMap::new(),
                submissions: DashMap::new(),
                faults: DashMap::new(),
                calls: DashMap::new(),
            }),
        }
    }

    /// The sandbox's configuration
    pub fn config(&self) -> &SandboxConfig {
        &self.inner.config
    }

    /// The tiers offered in `currency`
    pub fn ladder(&self, currency: CurrencyCode) -> Arc<[TierEntry]> {
        if self.inner.config.empty_currencies.contains(&currency) {
            return Arc::from(Vec::new());
        }
        self.inner
            .ladders
            .entry(currency)
            .or_insert_with(|| {
                let config = &self.inner.config;
                ladder::ladder(
                    currency,
                    &self.inner.tables,
                    config.tier_count,
                    config.proceeds_share,
                )
                .into()
            })
            .clone()
    }

    /// The currency the sandbox bills `territory` in
    pub fn billing_currency(&self, territory: &Territory) -> CurrencyCode {
        self.inner.tables.billing_currency(territory)
    }

    /// The source identifier the sandbox assigns to `product`
    pub fn source_id(product: &ProductRef) -> String {
        format!("src-{product}")
    }

    /// Schedule a price change for `product` in `territory` on `date`
    pub fn schedule(
        &self,
        product: &ProductRef,
        territory: &'static Territory,
        date: Date,
    ) -> ScheduledPrice {
        let scheduled = ScheduledPrice {
            id: uuid::Uuid::new_v4().to_string(),
            territory,
            effective_date: date,
        };
        self.inner
            .scheduled
            .entry(product.clone())
            .or_default()
            .push(scheduled.clone());
        scheduled
    }

    /// The price changes scheduled for `product`
    pub fn scheduled(&self, product: &ProductRef) -> Vec<ScheduledPrice> {
        self.inner
            .scheduled
            .get(product)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Every schedule accepted for `product`, oldest first
    pub fn submissions(&self, product: &ProductRef) -> Vec<Submission> {
        self.inner
            .submissions
            .get(product)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Make the next call of `operation` fail with `error`.
    ///
    /// Faults queue up: injecting two makes the next two calls fail.
    pub fn fail_next(&self, operation: Operation, error: PlatformError) {
        self.inner
            .faults
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// How often `operation` was called
    pub fn calls(&self, operation: Operation) -> usize {
        self.inner.calls.get(&operation).map_or(0, |count| *count)
    }

    /// How many calls were made in total
    pub fn total_calls(&self) -> usize {
        self.inner.calls.iter().map(|entry| *entry.value()).sum()
    }

    /// Forget every counted call
    pub fn reset_calls(&self) {
        self.inner.calls.clear();
    }
}
