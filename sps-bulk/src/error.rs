use crate::{BatchFailure, Phase};
use sps_core::ports::PlatformError;

/// Problems with a bulk pricing request, found before any network call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The base amount is not a positive, finite number
    #[error("base amount must be positive and finite, got {0}")]
    InvalidBaseAmount(f64),
    /// A custom multiplier is not a positive, finite number
    #[error("custom multiplier must be positive and finite, got {0}")]
    InvalidMultiplier(f64),
    /// The request names no territories
    #[error("no territories requested")]
    NoTerritories,
    /// A territory code matches no known territory
    #[error("unknown territory code {0:?}")]
    UnknownTerritory(String),
    /// The base territory is not among the requested territories
    #[error("base territory {0} is not among the requested territories")]
    MissingBaseTerritory(String),
    /// The storefront does not sell into the base territory
    #[error("the storefront does not support base territory {0}")]
    UnsupportedBaseTerritory(String),
}

/// Ways a bulk pricing run can fail
#[derive(Debug, thiserror::Error)]
pub enum BulkPricingError {
    /// The request was rejected before any work started
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No price could be calculated for the base territory
    #[error("base territory {territory} could not be priced: {reason}")]
    BaseTerritoryUnpriced {
        /// The base territory's code
        territory: String,
        /// Why pricing failed
        reason: String,
    },

    /// The base territory's price could not be matched to a storefront price
    #[error("base territory {territory} could not be resolved: {reason}")]
    BaseTerritoryUnresolved {
        /// The base territory's code
        territory: String,
        /// Why resolution failed
        reason: String,
    },

    /// Every requested territory was skipped
    #[error("none of the {skipped} requested territories could be priced")]
    NothingResolved {
        /// How many territories were skipped
        skipped: usize,
    },

    /// A storefront call failed for good and the run stopped
    #[error("{phase:?} stopped after {success_count} of {total_count} calls: {error}")]
    Aborted {
        /// The phase that was running
        phase: Phase,
        /// Calls of that phase that succeeded
        success_count: usize,
        /// Calls the phase was going to make
        total_count: usize,
        /// The index of the failed call within the phase
        failed_index: usize,
        /// What the storefront answered
        #[source]
        error: PlatformError,
    },
}

impl BulkPricingError {
    /// Wrap a failed batch of storefront calls
    pub fn aborted<T>(phase: Phase, failure: BatchFailure<T, PlatformError>) -> Self {
        Self::Aborted {
            phase,
            success_count: failure.success_count,
            total_count: failure.total_count,
            failed_index: failure.failed_index,
            error: failure.error,
        }
    }

    /// The `(completed, total)` counts of the phase that was cut short, if any
    pub fn progress(&self) -> Option<(usize, usize)> {
        match self {
            Self::Aborted {
                success_count,
                total_count,
                ..
            } => Some((*success_count, *total_count)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_keeps_counts() {
        let failure = BatchFailure::<u32, _> {
            success_count: 5,
            total_count: 6,
            failed_index: 5,
            error: PlatformError::invalid("rejected"),
            completed: vec![Some(0), Some(1), Some(2), Some(3), Some(4), None],
        };
        let error = BulkPricingError::aborted(Phase::Deleting, failure);
        assert_eq!(error.progress(), Some((5, 6)));
        assert!(error.to_string().contains("5 of 6"));
    }

    #[test]
    fn validation_has_no_progress() {
        let error = BulkPricingError::from(ValidationError::NoTerritories);
        assert_eq!(error.progress(), None);
        assert_eq!(error.to_string(), "no territories requested");
    }
}
