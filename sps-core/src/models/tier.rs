/// A price tier as listed by a tier-based storefront for a single territory.
///
/// `id` is the opaque, encoded price-point identifier the storefront expects
/// back when the tier is submitted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PriceTier {
    /// The encoded price-point identifier
    pub id: String,
    /// The price a customer pays, in the territory's billing currency
    pub customer_price: f64,
    /// What the developer receives after the storefront's commission
    pub proceeds: f64,
}

/// A tier stripped of its territory, as shared by every territory billed in one currency.
///
/// Territories billed in the same currency are offered the same ladder of
/// tiers, so a ladder learned for one territory prices the others; each of them
/// still gets a price-point identifier of its own.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TierEntry {
    /// The storefront's tier code, e.g. `10010`
    pub tier: String,
    /// The price a customer pays
    pub customer_price: f64,
    /// What the developer receives
    pub proceeds: f64,
}
