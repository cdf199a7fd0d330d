#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod cache;
pub use cache::{PricingCache, TtlCache};

mod error;
pub use error::{BulkPricingError, ValidationError};

mod executor;
pub use executor::{
    BatchEvent, BatchFailure, Retryable, backoff_delay, execute_with_rate_limit, rate_limited,
};

mod options;
pub use options::{BulkPricingOptions, RateLimitOptions};

mod orchestrator;
pub use orchestrator::{BulkPricing, BulkPricingRequest, BulkPricingSummary};

/// Incremental progress reporting over a single long-lived stream.
///
/// A run writes any number of progress events followed by exactly one
/// terminal `done` or `error` event. The consuming half can be forwarded as
/// newline-delimited JSON.
pub mod progress;
pub use progress::{Phase, ProgressEvent, ProgressStream, ProgressWriter, progress_channel};

mod resolver;
pub use resolver::{Resolution, ResolvedTerritory, TierResolver};
