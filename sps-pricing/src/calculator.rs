use crate::{PricingTables, rounding::apply_rounding};
use sps_core::models::{
    CalculatedPrice, CurrencyCode, MultiplierSource, PricingStrategy, RoundingMode, Territory,
};
use tracing::{Level, event};

/// What to price: a base amount, the strategy to localize it and how to round it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Quote {
    /// The price in the base currency
    pub base_amount: f64,
    /// The currency of `base_amount`
    #[serde(default = "usd")]
    pub base_currency: CurrencyCode,
    /// How to localize the base price
    pub strategy: PricingStrategy,
    /// How to round localized prices
    #[serde(default)]
    pub rounding: RoundingMode,
}

fn usd() -> CurrencyCode {
    CurrencyCode::USD
}

/// Errors that prevent a territory from being priced
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    /// The base amount is not a positive, finite number
    #[error("base amount must be positive and finite, got {0}")]
    InvalidBaseAmount(f64),
    /// A custom multiplier is not a positive, finite number
    #[error("multiplier must be positive and finite, got {0}")]
    InvalidMultiplier(f64),
    /// No usable exchange rate is known for a currency
    #[error("no exchange rate for {0}")]
    MissingExchangeRate(CurrencyCode),
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Localize `quote` for a single territory.
///
/// The price is converted into the territory's billing currency, adjusted by
/// the strategy's multiplier, rounded, and finally raised to the currency's
/// minimum price if it fell below it.
///
/// For the parity strategy, a territory billed in its local currency is
/// priced as `base × factor`, with the base first expressed in US dollars.
/// A territory billed in a foreign currency is priced in local terms and
/// converted back, unless that would exceed a direct conversion, in which
/// case the affordability multiplier applies instead. Territories without
/// parity data use the static multiplier table.
pub fn calculate_regional_price(
    quote: &Quote,
    territory: &'static Territory,
    tables: &PricingTables,
) -> Result<CalculatedPrice, PricingError> {
    if !positive(quote.base_amount) {
        return Err(PricingError::InvalidBaseAmount(quote.base_amount));
    }

    let currency = tables.billing_currency(territory);
    let exchange_rate = tables.conversion(quote.base_currency, currency)?;
    let direct = quote.base_amount * exchange_rate;

    let (raw_amount, multiplier, multiplier_source) = match quote.strategy {
        PricingStrategy::Direct => (direct, 1.0, MultiplierSource::None),
        PricingStrategy::Ppp => parity_price(quote, territory, currency, direct, tables)?,
        PricingStrategy::CostOfGoodsIndex => {
            let multiplier = tables
                .index_multipliers
                .get(territory.alpha2)
                .copied()
                .filter(|m| positive(*m))
                .unwrap_or(tables.default_index_multiplier);
            (direct * multiplier, multiplier, MultiplierSource::Index)
        }
        PricingStrategy::Custom(multiplier) => {
            if !positive(multiplier) {
                return Err(PricingError::InvalidMultiplier(multiplier));
            }
            (direct * multiplier, multiplier, MultiplierSource::Custom)
        }
    };

    let mut rounded_amount = apply_rounding(raw_amount, quote.rounding, currency);
    let floor = tables.floor(currency)?;
    let floor_applied = rounded_amount < floor;
    if floor_applied {
        rounded_amount = floor;
    }

    Ok(CalculatedPrice {
        territory,
        currency,
        raw_amount,
        rounded_amount,
        strategy: quote.strategy,
        multiplier,
        multiplier_source,
        exchange_rate,
        floor_applied,
    })
}

fn parity_price(
    quote: &Quote,
    territory: &'static Territory,
    billing: CurrencyCode,
    direct: f64,
    tables: &PricingTables,
) -> Result<(f64, f64, MultiplierSource), PricingError> {
    let fallback = || {
        let multiplier = tables
            .static_multipliers
            .get(territory.alpha2)
            .copied()
            .filter(|m| positive(*m))
            .unwrap_or(1.0);
        event!(
            Level::DEBUG,
            territory = territory.alpha2,
            multiplier,
            "no parity data, using static multiplier"
        );
        (direct * multiplier, multiplier, MultiplierSource::Static)
    };

    let Some(factor) = tables
        .ppp_factors
        .get(territory.alpha2)
        .copied()
        .filter(|f| positive(*f))
    else {
        return Ok(fallback());
    };
    let Some(local_rate) = tables.rate(territory.currency) else {
        return Ok(fallback());
    };

    let base_usd = quote.base_amount * tables.conversion(quote.base_currency, CurrencyCode::USD)?;
    let local_price = base_usd * factor;

    if billing == territory.currency {
        return Ok((local_price, factor / local_rate, MultiplierSource::Ppp));
    }

    let billing_rate = tables
        .rate(billing)
        .ok_or(PricingError::MissingExchangeRate(billing))?;
    let converted = local_price / local_rate * billing_rate;
    if converted > direct {
        let multiplier = tables.affordability_multiplier;
        event!(
            Level::DEBUG,
            territory = territory.alpha2,
            converted,
            direct,
            "parity price exceeds direct conversion, capping"
        );
        Ok((direct * multiplier, multiplier, MultiplierSource::AffordabilityCap))
    } else {
        Ok((converted, factor / local_rate, MultiplierSource::Ppp))
    }
}

/// Localize `quote` for every territory in `territories`, in order.
///
/// A failure for one territory does not affect the others.
pub fn calculate_prices(
    quote: &Quote,
    territories: impl IntoIterator<Item = &'static Territory>,
    tables: &PricingTables,
) -> Vec<(&'static Territory, Result<CalculatedPrice, PricingError>)> {
    territories
        .into_iter()
        .map(|territory| (territory, calculate_regional_price(quote, territory, tables)))
        .collect()
}
