use super::{CurrencyCode, Money, MoneyError, Territory};

/// How a base price is translated into a territory's price.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PricingStrategy {
    /// Plain currency conversion
    Direct,
    /// Purchasing-power parity, falling back to static affordability multipliers
    Ppp,
    /// A multiplier from a cost-of-goods index, such as a burger index
    CostOfGoodsIndex,
    /// A caller-supplied multiplier applied uniformly
    Custom(f64),
}

/// How a converted price is rounded before submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    /// Round to the currency's minor unit only
    None,
    /// Round to a whole amount, in magnitude-aware steps for zero-decimal currencies
    Whole,
    /// Round to a psychological price ending in 9
    #[default]
    Charm,
}

/// Where the multiplier behind a calculated price came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiplierSource {
    /// No multiplier, a direct conversion
    None,
    /// Purchasing-power parity data
    Ppp,
    /// The static affordability table, used when parity data is missing
    Static,
    /// The affordability cap, used when parity pricing would exceed a direct conversion
    AffordabilityCap,
    /// The cost-of-goods index
    Index,
    /// A caller-supplied multiplier
    Custom,
}

/// The outcome of pricing a single territory.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize)]
pub struct CalculatedPrice {
    /// The territory priced
    pub territory: &'static Territory,
    /// The currency the storefront bills the territory in
    pub currency: CurrencyCode,
    /// The converted price before rounding
    pub raw_amount: f64,
    /// The price after rounding and minimum-price enforcement
    pub rounded_amount: f64,
    /// The strategy used
    pub strategy: PricingStrategy,
    /// The effective multiplier relative to a direct conversion
    pub multiplier: f64,
    /// Where the multiplier came from
    pub multiplier_source: MultiplierSource,
    /// Units of the billing currency per unit of the base currency
    pub exchange_rate: f64,
    /// Whether the price was raised to the currency's minimum
    pub floor_applied: bool,
}

impl CalculatedPrice {
    /// The rounded price as a fixed-point amount
    pub fn to_money(&self) -> Result<Money, MoneyError> {
        Money::from_amount(self.rounded_amount, self.currency)
    }
}
