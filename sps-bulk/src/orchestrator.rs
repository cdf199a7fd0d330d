use crate::{
    BulkPricingError, BulkPricingOptions, Phase, PricingCache, ProgressStream, ProgressWriter,
    ResolvedTerritory, TierResolver, ValidationError, execute_with_rate_limit, progress_channel,
};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use sps_core::{
    models::{
        CalculatedPrice, CurrencyCode, PricePoint, PricingStrategy, ProductRef, ResolvedPrice,
        RoundingMode, SkippedTerritory, Storefront, Territory, date_format,
    },
    ports::PlatformClient,
};
use sps_pricing::{PricingTables, Quote, calculate_prices};
use std::sync::Arc;
use time::{Date, OffsetDateTime};
use tracing::{Instrument as _, Level, event, span};
use uuid::Uuid;

/// A request to reprice one product across many territories.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct BulkPricingRequest {
    /// The product to reprice
    pub product: ProductRef,
    /// The price in the base currency
    pub base_amount: f64,
    /// The currency of `base_amount`
    #[serde(default = "usd")]
    pub base_currency: CurrencyCode,
    /// The territory the storefront anchors the whole schedule to
    pub base_territory: String,
    /// The territories to reprice, as 2- or 3-letter codes
    pub territories: Vec<String>,
    /// How to localize the base price
    pub strategy: PricingStrategy,
    /// How to round localized prices
    #[serde(default)]
    pub rounding: RoundingMode,
    /// The day the new prices take effect, or immediately if absent
    #[serde(default, with = "date_format::option")]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<String>"))]
    pub effective_date: Option<Date>,
    /// Whether to delete price changes already scheduled for the repriced territories
    #[serde(default)]
    pub replace_scheduled: bool,
}

fn usd() -> CurrencyCode {
    CurrencyCode::USD
}

impl BulkPricingRequest {
    fn quote(&self) -> Quote {
        Quote {
            base_amount: self.base_amount,
            base_currency: self.base_currency,
            strategy: self.strategy,
            rounding: self.rounding,
        }
    }
}

/// The outcome of a bulk pricing run that made progress.
///
/// Success does not mean every requested territory was updated; anything
/// left out is listed in `skipped` with a reason.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct BulkPricingSummary {
    /// The product repriced
    pub product: ProductRef,
    /// The storefront the prices were submitted to
    pub storefront: Storefront,
    /// The anchor territory, in the storefront's code style
    pub base_territory: String,
    /// Territories whose new price was submitted
    pub resolved: Vec<ResolvedTerritory>,
    /// Territories left out, with the reason why
    pub skipped: Vec<SkippedTerritory>,
    /// Scheduled price changes deleted
    pub deleted: usize,
    /// Scheduled price changes that were already too close to take effect
    pub deletions_skipped: usize,
}

struct Validated {
    base: &'static Territory,
    territories: Vec<&'static Territory>,
    skipped: Vec<SkippedTerritory>,
}

/// Prices, resolves and submits a product's prices across many territories.
///
/// The service is cheap to clone; clones share the client, the tier cache
/// and the pricing tables.
pub struct BulkPricing<C> {
    client: Arc<C>,
    cache: Arc<PricingCache>,
    tables: Arc<PricingTables>,
    options: Arc<BulkPricingOptions>,
}

impl<C> Clone for BulkPricing<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            cache: self.cache.clone(),
            tables: self.tables.clone(),
            options: self.options.clone(),
        }
    }
}

impl<C: PlatformClient + 'static> BulkPricing<C> {
    /// A service for `client`'s storefront with a fresh tier cache
    pub fn new(client: Arc<C>, tables: &PricingTables, options: BulkPricingOptions) -> Self {
        let tables = tables.for_storefront(client.storefront());
        let cache = PricingCache::new(options.cache_ttl);
        Self {
            client,
            cache: Arc::new(cache),
            tables: Arc::new(tables),
            options: Arc::new(options),
        }
    }

    /// The storefront client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The tier cache
    pub fn cache(&self) -> &PricingCache {
        &self.cache
    }

    /// The pricing tables, specialized for the storefront
    pub fn tables(&self) -> &PricingTables {
        &self.tables
    }

    /// Check `request` against the storefront without touching the network.
    ///
    /// Codes are accepted in either alphabet and deduplicated, keeping the
    /// first occurrence. Territories the storefront does not sell into are
    /// set aside as skipped.
    fn validate(&self, request: &BulkPricingRequest) -> Result<Validated, ValidationError> {
        let storefront = self.client.storefront();

        if !(request.base_amount.is_finite() && request.base_amount > 0.0) {
            return Err(ValidationError::InvalidBaseAmount(request.base_amount));
        }
        if let PricingStrategy::Custom(multiplier) = request.strategy {
            if !(multiplier.is_finite() && multiplier > 0.0) {
                return Err(ValidationError::InvalidMultiplier(multiplier));
            }
        }
        if request.territories.is_empty() {
            return Err(ValidationError::NoTerritories);
        }

        let base = Territory::lookup(&request.base_territory)
            .map_err(|_| ValidationError::UnknownTerritory(request.base_territory.clone()))?;
        if !storefront.supports(base) {
            return Err(ValidationError::UnsupportedBaseTerritory(
                request.base_territory.clone(),
            ));
        }

        let mut requested = IndexSet::new();
        for code in &request.territories {
            let territory = Territory::lookup(code)
                .map_err(|_| ValidationError::UnknownTerritory(code.clone()))?;
            requested.insert(territory);
        }
        if !requested.contains(base) {
            return Err(ValidationError::MissingBaseTerritory(
                request.base_territory.clone(),
            ));
        }

        let (territories, unsupported): (Vec<_>, Vec<_>) = requested
            .into_iter()
            .partition(|territory| storefront.supports(territory));
        let skipped = unsupported
            .into_iter()
            .map(|territory| {
                SkippedTerritory::new(
                    storefront.territory_code(territory),
                    format!("not sold on the {storefront} storefront"),
                )
            })
            .collect();

        Ok(Validated {
            base,
            territories,
            skipped,
        })
    }

    /// Run a bulk pricing request to completion, reporting progress to `progress`.
    ///
    /// The steps are, in order: validation, calculation, resolution to the
    /// storefront's price points, deletion of superseded scheduled prices (if
    /// requested) and a single submission. Storefront calls of each remote
    /// step are paced by the matching [`BulkPricingOptions`] entry.
    ///
    /// `progress` is not terminated; that is left to the caller.
    pub async fn apply(
        &self,
        request: &BulkPricingRequest,
        progress: &ProgressWriter<BulkPricingSummary>,
        now: OffsetDateTime,
    ) -> Result<BulkPricingSummary, BulkPricingError> {
        let storefront = self.client.storefront();
        let Validated {
            base,
            territories,
            mut skipped,
        } = self.validate(request)?;
        let base_code = storefront.territory_code(base).to_owned();

        // calculation
        let total = territories.len();
        let mut calculated = Vec::with_capacity(total);
        for (index, (territory, result)) in
            calculate_prices(&request.quote(), territories, &self.tables)
                .into_iter()
                .enumerate()
        {
            match result {
                Ok(price) => calculated.push(price),
                Err(error) if std::ptr::eq(territory, base) => {
                    return Err(BulkPricingError::BaseTerritoryUnpriced {
                        territory: base_code,
                        reason: error.to_string(),
                    });
                }
                Err(error) => {
                    event!(Level::WARN, territory = territory.alpha2, %error, "cannot price territory");
                    skipped.push(SkippedTerritory::new(
                        storefront.territory_code(territory),
                        error.to_string(),
                    ));
                }
            }
            progress.progress(index + 1, total, Some(Phase::Calculating));
        }

        // resolution
        let resolved = if storefront.uses_price_tiers() {
            progress.progress(0, 0, Some(Phase::Resolving));
            let resolution = TierResolver::new(&*self.client, &self.cache, &self.options.resolve)
                .resolve(&request.product, &calculated, now, |completed, total| {
                    progress.progress(completed, total, Some(Phase::Resolving))
                })
                .await?;
            skipped.extend(resolution.skipped);
            resolution.resolved
        } else {
            self.amounts(calculated, &mut skipped)
        };

        if resolved.is_empty() {
            return Err(BulkPricingError::NothingResolved {
                skipped: skipped.len(),
            });
        }
        if !resolved
            .iter()
            .any(|r| std::ptr::eq(r.calculated.territory, base))
        {
            let reason = skipped
                .iter()
                .find(|s| s.territory == base_code)
                .map(|s| s.reason.clone())
                .unwrap_or_else(|| "no price could be resolved".to_owned());
            return Err(BulkPricingError::BaseTerritoryUnresolved {
                territory: base_code,
                reason,
            });
        }

        // deletion of superseded schedules
        let (deleted, deletions_skipped) = if request.replace_scheduled {
            self.delete_scheduled(&request.product, &resolved, progress, now)
                .await?
        } else {
            (0, 0)
        };

        // submission
        let prices: Vec<ResolvedPrice> = resolved
            .iter()
            .map(|r| ResolvedPrice {
                territory: r.calculated.territory,
                price: r.price.clone(),
                effective_date: request.effective_date,
            })
            .collect();
        progress.progress(0, 1, Some(Phase::Submitting));
        let client = &*self.client;
        let product = &request.product;
        let prices = &prices[..];
        let task = move || client.submit_prices(product, prices, base);
        execute_with_rate_limit(vec![task], &self.options.submit, |completed, total| {
            progress.progress(completed, total, Some(Phase::Submitting))
        })
        .await
        .map_err(|failure| BulkPricingError::aborted(Phase::Submitting, failure))?;

        event!(
            Level::INFO,
            product = %request.product,
            resolved = resolved.len(),
            skipped = skipped.len(),
            deleted,
            deletions_skipped,
            "prices submitted"
        );

        Ok(BulkPricingSummary {
            product: request.product.clone(),
            storefront,
            base_territory: base_code,
            resolved,
            skipped,
            deleted,
            deletions_skipped,
        })
    }

    /// For storefronts without tiers, every calculated price is submitted as is.
    fn amounts(
        &self,
        calculated: Vec<CalculatedPrice>,
        skipped: &mut Vec<SkippedTerritory>,
    ) -> Vec<ResolvedTerritory> {
        let storefront = self.client.storefront();
        calculated
            .into_iter()
            .filter_map(|price| match price.to_money() {
                Ok(money) => Some(ResolvedTerritory {
                    calculated: price,
                    price: PricePoint::Amount { price: money },
                }),
                Err(error) => {
                    skipped.push(SkippedTerritory::new(
                        storefront.territory_code(price.territory),
                        error.to_string(),
                    ));
                    None
                }
            })
            .collect()
    }

    /// Delete scheduled changes for the repriced territories that take effect today or later.
    ///
    /// Returns how many were deleted and how many the storefront refused
    /// because they were no longer in the future.
    async fn delete_scheduled(
        &self,
        product: &ProductRef,
        resolved: &[ResolvedTerritory],
        progress: &ProgressWriter<BulkPricingSummary>,
        now: OffsetDateTime,
    ) -> Result<(usize, usize), BulkPricingError> {
        let client = &*self.client;
        let options = &self.options.delete;

        progress.progress(0, 0, Some(Phase::Deleting));
        let list = move || client.list_scheduled_prices(product);
        let scheduled = execute_with_rate_limit(vec![list], options, |_, _| {})
            .await
            .map_err(|failure| BulkPricingError::aborted(Phase::Deleting, failure))?
            .pop()
            .unwrap_or_default();

        let today = now.date();
        let targets: Vec<_> = scheduled
            .iter()
            .filter(|s| s.effective_date >= today)
            .filter(|s| {
                resolved
                    .iter()
                    .any(|r| std::ptr::eq(r.calculated.territory, s.territory))
            })
            .collect();

        let tasks = targets
            .iter()
            .map(|&scheduled| {
                move || async move {
                    match client.delete_scheduled_price(product, scheduled).await {
                        Ok(()) => Ok(true),
                        Err(error) if error.is_conflict() => {
                            event!(
                                Level::INFO,
                                id = %scheduled.id,
                                territory = scheduled.territory.alpha2,
                                "scheduled price already in effect, leaving it"
                            );
                            Ok(false)
                        }
                        Err(error) => Err(error),
                    }
                }
            })
            .collect();
        let outcomes = execute_with_rate_limit(tasks, options, |completed, total| {
            progress.progress(completed, total, Some(Phase::Deleting))
        })
        .await
        .map_err(|failure| BulkPricingError::aborted(Phase::Deleting, failure))?;

        let deleted = outcomes.iter().filter(|d| **d).count();
        Ok((deleted, outcomes.len() - deleted))
    }

    /// Run `request` in the background, streaming its progress.
    ///
    /// The stream always ends with a single `done` event carrying the
    /// [`BulkPricingSummary`], or an `error` event carrying the partial
    /// progress of the phase that failed.
    pub fn stream(&self, request: BulkPricingRequest) -> ProgressStream<BulkPricingSummary> {
        let (mut writer, stream) = progress_channel();
        let service = self.clone();
        let run_id = Uuid::new_v4();
        let span = span!(Level::INFO, "bulk pricing", %run_id, product = %request.product);

        tokio::spawn(
            async move {
                event!(Level::INFO, territories = request.territories.len(), "starting");
                match service
                    .apply(&request, &writer, OffsetDateTime::now_utc())
                    .await
                {
                    Ok(summary) => writer.done(summary),
                    Err(error) => {
                        event!(Level::ERROR, %error, "bulk pricing failed");
                        let (completed, total) = error.progress().unzip();
                        writer.error(error.to_string(), completed, total);
                    }
                }
            }
            .instrument(span),
        );

        stream
    }
}
