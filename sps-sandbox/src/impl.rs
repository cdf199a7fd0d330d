//! The storefront port implemented over the sandbox's in-memory state.

use crate::{Operation, Sandbox, Submission};
use sps_core::{
    models::{
        PricePoint, PricePointId, PriceTier, ProductRef, ResolvedPrice, ScheduledPrice,
        Storefront, Territory,
    },
    ports::{PlatformClient, PlatformError},
};
use time::{Date, OffsetDateTime};
use tracing::{Level, event};

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

impl Sandbox {
    /// Count the call, wait out the configured latency and fail if a fault is queued.
    async fn begin(&self, operation: Operation) -> Result<(), PlatformError> {
        *self.inner.calls.entry(operation).or_default() += 1;

        let latency = self.inner.config.latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let fault = self
            .inner
            .faults
            .get_mut(&operation)
            .and_then(|mut queue| queue.pop_front());
        match fault {
            Some(error) => {
                event!(Level::DEBUG, ?operation, %error, "injected fault");
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn supported(&self, territory: &Territory) -> Result<(), PlatformError> {
        let storefront = self.inner.config.storefront;
        if storefront.supports(territory) {
            Ok(())
        } else {
            Err(PlatformError::unsupported(format!(
                "{storefront} does not sell in {}",
                storefront.territory_code(territory)
            )))
        }
    }

    /// Check one submitted price against what the storefront offers
    fn check_price(&self, product: &ProductRef, price: &ResolvedPrice) -> Result<(), PlatformError> {
        self.supported(price.territory)?;
        let currency = self.billing_currency(price.territory);

        match (&price.price, self.inner.config.storefront) {
            (PricePoint::Tier { id, .. }, Storefront::AppStore) => {
                if id.source_id != Self::source_id(product) {
                    return Err(PlatformError::invalid(format!(
                        "price point {id} belongs to another product"
                    )));
                }
                if id.territory().is_none_or(|t| t != price.territory) {
                    return Err(PlatformError::invalid(format!(
                        "price point {id} does not belong to {}",
                        price.territory.alpha3
                    )));
                }
                if !self.ladder(currency).iter().any(|entry| entry.tier == id.tier) {
                    return Err(PlatformError::invalid(format!(
                        "no tier {} in {currency}",
                        id.tier
                    )));
                }
                Ok(())
            }
            (PricePoint::Amount { price: money }, Storefront::Marketplace) => {
                if money.currency_code() != currency {
                    return Err(PlatformError::invalid(format!(
                        "{} is billed in {currency}, not {}",
                        price.territory.alpha2,
                        money.currency_code()
                    )));
                }
                Ok(())
            }
            (_, storefront) => Err(PlatformError::invalid(format!(
                "{storefront} does not accept this kind of price"
            ))),
        }
    }
}

impl PlatformClient for Sandbox {
    fn storefront(&self) -> Storefront {
        self.inner.config.storefront
    }

    async fn fetch_source_id(&self, product: &ProductRef) -> Result<String, PlatformError> {
        self.begin(Operation::FetchSourceId).await?;
        Ok(Self::source_id(product))
    }

    async fn fetch_price_tiers(
        &self,
        product: &ProductRef,
        territory: &'static Territory,
    ) -> Result<Vec<PriceTier>, PlatformError> {
        self.begin(Operation::FetchPriceTiers).await?;
        self.supported(territory)?;
        if !self.inner.config.storefront.uses_price_tiers() {
            return Err(PlatformError::unsupported("this storefront has no price tiers"));
        }

        let source_id = Self::source_id(product);
        let tiers = self
            .ladder(self.billing_currency(territory))
            .iter()
            .map(|entry| PriceTier {
                id: PricePointId::new(source_id.clone(), territory, &entry.tier).encode(),
                customer_price: entry.customer_price,
                proceeds: entry.proceeds,
            })
            .collect();
        Ok(tiers)
    }

    async fn list_scheduled_prices(
        &self,
        product: &ProductRef,
    ) -> Result<Vec<ScheduledPrice>, PlatformError> {
        self.begin(Operation::ListScheduledPrices).await?;
        Ok(self.scheduled(product))
    }

    async fn delete_scheduled_price(
        &self,
        product: &ProductRef,
        scheduled: &ScheduledPrice,
    ) -> Result<(), PlatformError> {
        self.begin(Operation::DeleteScheduledPrice).await?;

        let mut entries = self.inner.scheduled.entry(product.clone()).or_default();
        let Some(position) = entries.iter().position(|s| s.id == scheduled.id) else {
            return Err(PlatformError::invalid(format!(
                "no scheduled price {}",
                scheduled.id
            )));
        };
        if entries[position].effective_date <= today() {
            return Err(PlatformError::conflict(format!(
                "scheduled price {} is no longer in the future",
                scheduled.id
            )));
        }
        entries.remove(position);
        Ok(())
    }

    async fn submit_prices(
        &self,
        product: &ProductRef,
        prices: &[ResolvedPrice],
        base_territory: &'static Territory,
    ) -> Result<(), PlatformError> {
        self.begin(Operation::SubmitPrices).await?;

        if !prices.iter().any(|p| p.territory == base_territory) {
            return Err(PlatformError::invalid(format!(
                "base territory {} has no price",
                base_territory.alpha2
            )));
        }
        // the whole request is rejected if any price is
        for price in prices {
            self.check_price(product, price)?;
        }

        let today = today();
        for price in prices {
            if let Some(date) = price.effective_date.filter(|date| *date > today) {
                self.schedule(product, price.territory, date);
            }
        }
        self.inner
            .submissions
            .entry(product.clone())
            .or_default()
            .push(Submission {
                prices: prices.to_vec(),
                base_territory,
            });

        event!(
            Level::DEBUG,
            %product,
            prices = prices.len(),
            base = base_territory.alpha2,
            "accepted prices"
        );
        Ok(())
    }
}
