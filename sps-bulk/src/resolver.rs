use crate::{BulkPricingError, Phase, PricingCache, RateLimitOptions, execute_with_rate_limit};
use indexmap::IndexMap;
use sps_core::{
    models::{
        CalculatedPrice, CurrencyCode, PricePoint, PricePointId, PriceTier, ProductRef,
        SkippedTerritory, Territory, TierEntry,
    },
    ports::PlatformClient,
};
use sps_pricing::find_closest_tier;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{Level, event};

/// A calculated price together with the storefront price it resolved to.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ResolvedTerritory {
    /// The price the calculator produced
    pub calculated: CalculatedPrice,
    /// The price that will be submitted
    pub price: PricePoint,
}

/// The outcome of resolving a set of calculated prices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    /// Territories matched to a tier, in the order they were given
    pub resolved: Vec<ResolvedTerritory>,
    /// Territories without usable tier data
    pub skipped: Vec<SkippedTerritory>,
}

/// Matches calculated prices to a tier-based storefront's price points.
///
/// Tier ladders are shared by every territory billed in the same currency.
/// A currency whose ladder is cached costs no network call; every other
/// currency is fetched once, through a single representative territory, and
/// cached for later runs. Matching itself is identical on both paths.
pub struct TierResolver<'a, C> {
    client: &'a C,
    cache: &'a PricingCache,
    options: &'a RateLimitOptions,
}

enum Ladder {
    Usable(Arc<[TierEntry]>),
    Missing(String),
}

impl<'a, C: PlatformClient> TierResolver<'a, C> {
    /// A resolver reading through `cache`, pacing its calls with `options`
    pub fn new(client: &'a C, cache: &'a PricingCache, options: &'a RateLimitOptions) -> Self {
        Self {
            client,
            cache,
            options,
        }
    }

    /// Resolve every price in `prices` to the closest tier of its currency.
    ///
    /// `on_progress` receives `(completed, total)` for the network calls made.
    /// A fully cached run makes exactly one call, to learn the product's
    /// source identifier.
    pub async fn resolve(
        &self,
        product: &ProductRef,
        prices: &[CalculatedPrice],
        now: OffsetDateTime,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Result<Resolution, BulkPricingError> {
        let storefront = self.client.storefront();

        // the first territory seen in each currency represents the group
        let mut groups: IndexMap<CurrencyCode, &'static Territory> = IndexMap::new();
        for price in prices {
            groups.entry(price.currency).or_insert(price.territory);
        }

        let mut ladders: IndexMap<CurrencyCode, Ladder> = IndexMap::new();
        let mut cold = Vec::new();
        for (currency, representative) in &groups {
            match self.cache.tiers.get(currency, now) {
                Some(ladder) => {
                    ladders.insert(*currency, Ladder::Usable(ladder));
                }
                None => cold.push((*currency, *representative)),
            }
        }
        event!(
            Level::DEBUG,
            cached = ladders.len(),
            cold = cold.len(),
            "resolving tier ladders"
        );

        let client = self.client;
        let tasks = cold
            .iter()
            .map(|&(_, territory)| {
                move || async move {
                    match client.fetch_price_tiers(product, territory).await {
                        Err(error) if error.is_unsupported() => Ok(Vec::new()),
                        other => other,
                    }
                }
            })
            .collect();
        let fetched = execute_with_rate_limit(tasks, self.options, &mut on_progress)
            .await
            .map_err(|failure| BulkPricingError::aborted(Phase::Resolving, failure))?;

        let mut source_id = None;
        for ((currency, _), tiers) in cold.iter().zip(fetched) {
            let ladder = match decode_ladder(&tiers) {
                Ok((_, entries)) if entries.is_empty() => {
                    Ladder::Missing(format!("no price tiers available in {currency}"))
                }
                Ok((id, entries)) => {
                    if source_id.is_none() {
                        source_id = id;
                    }
                    let entries: Arc<[TierEntry]> = entries.into();
                    self.cache.tiers.insert(*currency, entries.clone(), now);
                    Ladder::Usable(entries)
                }
                Err(reason) => {
                    event!(Level::WARN, %currency, %reason, "discarding tier ladder");
                    Ladder::Missing(format!("unreadable price tiers in {currency}"))
                }
            };
            ladders.insert(*currency, ladder);
        }

        let any_usable = ladders.values().any(|l| matches!(l, Ladder::Usable(_)));
        let source_id = match source_id {
            Some(id) => Some(id),
            None if any_usable => {
                let offset = cold.len();
                let task = move || client.fetch_source_id(product);
                let mut ids = execute_with_rate_limit(vec![task], self.options, |c, t| {
                    on_progress(offset + c, offset + t)
                })
                .await
                .map_err(|failure| BulkPricingError::aborted(Phase::Resolving, failure))?;
                ids.pop()
            }
            None => None,
        };

        let mut resolution = Resolution::default();
        for price in prices {
            let code = storefront.territory_code(price.territory);
            let (ladder, source_id) = match (ladders.get(&price.currency), &source_id) {
                (Some(Ladder::Usable(ladder)), Some(source_id)) => (ladder, source_id),
                (Some(Ladder::Missing(reason)), _) => {
                    event!(Level::INFO, territory = code, %reason, "skipping territory");
                    resolution
                        .skipped
                        .push(SkippedTerritory::new(code, reason.clone()));
                    continue;
                }
                _ => {
                    resolution.skipped.push(SkippedTerritory::new(
                        code,
                        format!("no price tiers available in {}", price.currency),
                    ));
                    continue;
                }
            };

            match find_closest_tier(price.rounded_amount, &ladder[..]) {
                Some(entry) => resolution.resolved.push(ResolvedTerritory {
                    calculated: price.clone(),
                    price: PricePoint::Tier {
                        id: PricePointId::new(source_id.clone(), price.territory, &entry.tier),
                        customer_price: entry.customer_price,
                        proceeds: entry.proceeds,
                    },
                }),
                None => {
                    event!(Level::INFO, territory = code, "no tier matches");
                    resolution.skipped.push(SkippedTerritory::new(
                        code,
                        format!("no usable price tier in {}", price.currency),
                    ));
                }
            }
        }
        Ok(resolution)
    }
}

/// Strip the territory out of a fetched ladder, returning the source identifier it carried.
fn decode_ladder(tiers: &[PriceTier]) -> Result<(Option<String>, Vec<TierEntry>), String> {
    let mut source_id = None;
    let mut entries = Vec::with_capacity(tiers.len());
    for tier in tiers {
        let id = PricePointId::decode(&tier.id).map_err(|error| error.to_string())?;
        entries.push(TierEntry {
            tier: id.tier,
            customer_price: tier.customer_price,
            proceeds: tier.proceeds,
        });
        source_id.get_or_insert(id.source_id);
    }
    Ok((source_id, entries))
}
