#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod calculator;
pub use calculator::{PricingError, Quote, calculate_prices, calculate_regional_price};

/// Rounding rules for converted prices.
///
/// Each rule is idempotent: rounding an already rounded price returns it
/// unchanged, so prices survive repeated runs without drifting.
pub mod rounding;

mod tables;
pub use tables::{AFFORDABILITY_MULTIPLIER, FloorPrice, PricingTables, TableOverrides};

mod tiers;
pub use tiers::{Tier, find_closest_tier};
