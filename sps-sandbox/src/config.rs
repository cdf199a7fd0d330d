//! Configuration types for the sandbox storefront.

use serde::{Deserialize, Serialize};
use sps_core::models::{CurrencyCode, Storefront};
use std::time::Duration;

/// Configuration for a sandbox storefront.
///
/// # Examples
///
/// ```
/// use sps_sandbox::config::SandboxConfig;
/// use sps_core::models::Storefront;
/// use std::time::Duration;
///
/// // A tier-based storefront answering instantly (default)
/// let config = SandboxConfig::default();
/// assert_eq!(config.storefront, Storefront::AppStore);
///
/// // A marketplace that takes a little while to answer
/// let config = SandboxConfig {
///     storefront: Storefront::Marketplace,
///     latency: Duration::from_millis(50),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SandboxConfig {
    /// Which storefront to imitate
    #[serde(default = "default_storefront")]
    pub storefront: Storefront,

    /// How long every call takes
    #[serde(default, with = "humantime_serde")]
    pub latency: Duration,

    /// How many tiers the ladder of every currency has
    #[serde(default = "default_tier_count")]
    pub tier_count: usize,

    /// The share of the customer price the developer receives
    #[serde(default = "default_proceeds_share")]
    pub proceeds_share: f64,

    /// Currencies offered no tiers at all
    #[serde(default)]
    pub empty_currencies: Vec<CurrencyCode>,
}

fn default_storefront() -> Storefront {
    Storefront::AppStore
}

fn default_tier_count() -> usize {
    80
}

fn default_proceeds_share() -> f64 {
    0.7
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            storefront: default_storefront(),
            latency: Duration::ZERO,
            tier_count: default_tier_count(),
            proceeds_share: default_proceeds_share(),
            empty_currencies: Vec::new(),
        }
    }
}
