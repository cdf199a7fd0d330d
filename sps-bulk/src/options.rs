//! Configuration for rate limiting, retries and caching.
//!
//! Every remote phase of a pricing run has its own pacing, since storefronts
//! tolerate far more concurrent reads than concurrent writes.

use serde::{Deserialize, Serialize};
use sps_core::ports::{DEFAULT_RETRYABLE_STATUS_CODES, PlatformError};
use std::time::Duration;

/// Pacing and retry behavior of the batch executor.
///
/// # Examples
///
/// ```
/// use sps_bulk::RateLimitOptions;
/// use std::time::Duration;
///
/// let options = RateLimitOptions {
///     concurrency: 5,
///     delay_between_batches: Duration::from_millis(250),
///     ..Default::default()
/// };
/// assert_eq!(options.max_retries, 3);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitOptions {
    /// How many tasks run at once within a window
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// The pause between consecutive windows
    #[serde(default = "default_delay", with = "humantime_serde")]
    pub delay_between_batches: Duration,

    /// How many times a retryable failure is retried before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// The base of the exponential backoff between retries
    #[serde(default = "default_retry_base_delay", with = "humantime_serde")]
    pub retry_base_delay: Duration,

    /// HTTP statuses that mark a failure as transient
    #[serde(default = "default_retryable_status_codes")]
    pub retryable_status_codes: Vec<u16>,
}

fn default_concurrency() -> usize {
    3
}

fn default_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_retryable_status_codes() -> Vec<u16> {
    DEFAULT_RETRYABLE_STATUS_CODES.to_vec()
}

impl Default for RateLimitOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            delay_between_batches: default_delay(),
            max_retries: default_max_retries(),
            retry_base_delay: default_retry_base_delay(),
            retryable_status_codes: default_retryable_status_codes(),
        }
    }
}

impl RateLimitOptions {
    /// Options with the given window size and pause
    pub fn paced(concurrency: usize, delay_between_batches: Duration) -> Self {
        Self {
            concurrency,
            delay_between_batches,
            ..Default::default()
        }
    }

    /// Classify an HTTP failure using these options' retryable statuses
    pub fn classify(&self, status: u16, message: impl Into<String>) -> PlatformError {
        PlatformError::from_status(status, message, &self.retryable_status_codes)
    }
}

/// Configuration of a bulk pricing run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BulkPricingOptions {
    /// Pacing of tier and source-identifier lookups
    #[serde(default = "default_resolve")]
    pub resolve: RateLimitOptions,

    /// Pacing of scheduled-price deletions
    #[serde(default = "default_delete")]
    pub delete: RateLimitOptions,

    /// Pacing of the final submission
    #[serde(default = "default_submit")]
    pub submit: RateLimitOptions,

    /// How long fetched tier tables stay valid
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub cache_ttl: Duration,
}

fn default_resolve() -> RateLimitOptions {
    RateLimitOptions::paced(3, Duration::from_millis(100))
}

fn default_delete() -> RateLimitOptions {
    RateLimitOptions::paced(2, Duration::from_millis(500))
}

fn default_submit() -> RateLimitOptions {
    RateLimitOptions::paced(1, Duration::ZERO)
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(60 * 60)
}

impl Default for BulkPricingOptions {
    fn default() -> Self {
        Self {
            resolve: default_resolve(),
            delete: default_delete(),
            submit: default_submit(),
            cache_ttl: default_cache_ttl(),
        }
    }
}
