use super::{Money, PricePointId, Territory};
use time::Date;

/// A price in the form a storefront accepts it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PricePoint {
    /// One of the storefront's discrete tiers
    Tier {
        /// The encoded price-point identifier
        id: PricePointId,
        /// The price a customer pays
        customer_price: f64,
        /// What the developer receives
        proceeds: f64,
    },
    /// An arbitrary decimal amount
    Amount {
        /// The amount
        price: Money,
    },
}

impl PricePoint {
    /// The price a customer pays, as a floating point number
    pub fn customer_price(&self) -> f64 {
        match self {
            Self::Tier { customer_price, .. } => *customer_price,
            Self::Amount { price } => price.amount(),
        }
    }
}

/// A price ready to be submitted for one territory.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize)]
pub struct ResolvedPrice {
    /// The territory the price applies to
    pub territory: &'static Territory,
    /// The price itself
    pub price: PricePoint,
    /// The day the price takes effect, or immediately if absent
    #[serde(with = "super::date_format::option")]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<String>"))]
    pub effective_date: Option<Date>,
}

/// A territory left out of a pricing run, with the reason why.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SkippedTerritory {
    /// The territory code as the caller supplied it
    pub territory: String,
    /// A human readable reason
    pub reason: String,
}

impl SkippedTerritory {
    /// Record `territory` as skipped
    pub fn new(territory: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            territory: territory.into(),
            reason: reason.into(),
        }
    }
}

/// A price change already scheduled on the storefront.
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize)]
pub struct ScheduledPrice {
    /// The storefront's identifier for the scheduled change
    pub id: String,
    /// The territory the change applies to
    pub territory: &'static Territory,
    /// The day the change takes effect
    #[serde(with = "super::date_format")]
    pub effective_date: Date,
}
