use serde::{Deserialize, Serialize};
use sps_core::models::{
    CalculatedPrice, CurrencyCode, SkippedTerritory, Storefront, Territory, TerritoryError,
};
use sps_pricing::{PricingError, PricingTables, Quote, TableOverrides, calculate_prices};
use tracing::{Level, event};

/// What to price, and where
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(flatten)]
    pub quote: Quote,
    /// Territory codes in either alphabet; every territory of the storefront if absent
    #[serde(default)]
    pub territories: Option<Vec<String>>,
    #[serde(default)]
    pub overrides: TableOverrides,
}

/// Localized prices, in request order
#[derive(Debug, Serialize)]
pub struct PriceTable {
    pub storefront: Storefront,
    pub prices: Vec<CalculatedPrice>,
    pub errors: Vec<SkippedTerritory>,
}

#[derive(Debug, Serialize)]
pub struct TerritoryRow {
    pub code: &'static str,
    pub name: &'static str,
    pub currency: CurrencyCode,
    pub local_currency: CurrencyCode,
}

#[derive(thiserror::Error, Debug)]
pub enum QuoteError {
    #[error(transparent)]
    Territory(#[from] TerritoryError),
    #[error(transparent)]
    Pricing(PricingError),
}

/// Price `request` for `storefront`, starting from `defaults`.
///
/// Territories the storefront does not sell into, or that the tables cannot
/// price, end up in the table's errors. Only a malformed request fails.
pub fn price_table(
    request: QuoteRequest,
    storefront: Storefront,
    defaults: &PricingTables,
) -> Result<PriceTable, QuoteError> {
    let mut tables = defaults.for_storefront(storefront);
    tables.apply(request.overrides);

    let mut errors = Vec::new();
    let territories: Vec<&'static Territory> = match request.territories {
        Some(codes) => {
            let mut territories = Vec::with_capacity(codes.len());
            for code in &codes {
                let territory = Territory::lookup(code)?;
                if territories.contains(&territory) {
                    continue;
                }
                if storefront.supports(territory) {
                    territories.push(territory);
                } else {
                    errors.push(SkippedTerritory::new(
                        storefront.territory_code(territory),
                        format!("not sold on the {storefront} storefront"),
                    ));
                }
            }
            territories
        }
        None => storefront.territories().collect(),
    };

    let mut prices = Vec::with_capacity(territories.len());
    for (territory, result) in calculate_prices(&request.quote, territories, &tables) {
        match result {
            Ok(price) => prices.push(price),
            Err(err @ (PricingError::InvalidBaseAmount(_) | PricingError::InvalidMultiplier(_))) => {
                return Err(QuoteError::Pricing(err));
            }
            Err(err) => {
                event!(Level::WARN, territory = territory.alpha2, %err, "territory not priced");
                errors.push(SkippedTerritory::new(
                    storefront.territory_code(territory),
                    err.to_string(),
                ));
            }
        }
    }

    Ok(PriceTable {
        storefront,
        prices,
        errors,
    })
}

/// Every territory `storefront` sells into, as it names and bills them
pub fn territory_table(storefront: Storefront) -> Vec<TerritoryRow> {
    storefront
        .territories()
        .map(|territory| TerritoryRow {
            code: storefront.territory_code(territory),
            name: territory.name,
            currency: storefront.billing_currency(territory),
            local_currency: territory.currency,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    fn request(json: &str) -> QuoteRequest {
        serde_json::from_str(json).unwrap()
    }

    #[rstest]
    fn prices_the_requested_territories() {
        let table = price_table(
            request(
                r#"{"base_amount": 9.99, "strategy": "direct", "territories": ["US", "deu", "DE", "RU"]}"#,
            ),
            Storefront::AppStore,
            &PricingTables::default(),
        )
        .unwrap();

        let priced: Vec<&str> = table.prices.iter().map(|p| p.territory.alpha2).collect();
        assert_eq!(priced, vec!["US", "DE"]);
        assert_eq!(table.prices[0].rounded_amount, 9.99);
        assert_eq!(table.prices[1].rounded_amount, 8.99);
        assert_eq!(table.errors.len(), 1);
        assert_eq!(table.errors[0].territory, "RUS");
    }

    #[rstest]
    fn defaults_to_the_whole_storefront() {
        let table = price_table(
            request(r#"{"base_amount": 4.99, "strategy": "ppp"}"#),
            Storefront::Marketplace,
            &PricingTables::default(),
        )
        .unwrap();

        assert_eq!(
            table.prices.len() + table.errors.len(),
            Storefront::Marketplace.territories().count()
        );
        assert!(table.prices.iter().all(|p| p.territory.alpha2 != "CN"));
    }

    #[rstest]
    fn overrides_replace_table_entries() {
        let table = price_table(
            request(
                r#"{
                    "base_amount": 10.0,
                    "strategy": "direct",
                    "rounding": "none",
                    "territories": ["DE"],
                    "overrides": {"exchange_rates": {"EUR": 0.5}}
                }"#,
            ),
            Storefront::AppStore,
            &PricingTables::default(),
        )
        .unwrap();

        assert_relative_eq!(table.prices[0].rounded_amount, 5.0);
    }

    #[rstest]
    #[case::unknown_code(r#"{"base_amount": 9.99, "strategy": "direct", "territories": ["XX"]}"#)]
    #[case::free(r#"{"base_amount": 0.0, "strategy": "direct", "territories": ["US"]}"#)]
    #[case::negative_multiplier(
        r#"{"base_amount": 9.99, "strategy": {"custom": -2.0}, "territories": ["US"]}"#
    )]
    fn malformed_requests_fail(#[case] json: &str) {
        let result = price_table(request(json), Storefront::AppStore, &PricingTables::default());
        assert!(result.is_err());
    }

    #[rstest]
    fn territory_codes_follow_the_storefront() {
        let app_store = territory_table(Storefront::AppStore);
        let marketplace = territory_table(Storefront::Marketplace);

        assert!(app_store.iter().any(|row| row.code == "DEU"));
        assert!(marketplace.iter().any(|row| row.code == "DE"));
        assert!(app_store.iter().all(|row| row.code != "RUS"));
    }
}
