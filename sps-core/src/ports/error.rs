/// HTTP statuses that signal a transient condition worth retrying
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// What went wrong when talking to a storefront
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlatformErrorKind {
    /// The storefront answered with an unsuccessful HTTP status
    Status(u16),
    /// The request did not complete in time
    Timeout,
    /// The storefront refused a change that conflicts with its current state
    Conflict,
    /// The storefront does not offer the requested resource
    Unsupported,
    /// The request itself was malformed
    Invalid,
}

impl std::fmt::Display for PlatformErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(status) => write!(f, "status {status}"),
            Self::Timeout => f.write_str("timeout"),
            Self::Conflict => f.write_str("conflict"),
            Self::Unsupported => f.write_str("unsupported"),
            Self::Invalid => f.write_str("invalid request"),
        }
    }
}

/// An error reported by a [`super::PlatformClient`].
///
/// Whether the error is transient is decided once, where the error is
/// classified, so that retry logic never has to parse messages.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PlatformError {
    /// The category of failure
    pub kind: PlatformErrorKind,
    /// The storefront's own description of the failure
    pub message: String,
    /// Whether repeating the request may succeed
    pub retryable: bool,
}

impl PlatformError {
    /// Classify an HTTP status against a set of retryable statuses
    pub fn from_status(status: u16, message: impl Into<String>, retryable_codes: &[u16]) -> Self {
        let kind = match status {
            409 => PlatformErrorKind::Conflict,
            400 | 422 => PlatformErrorKind::Invalid,
            404 => PlatformErrorKind::Unsupported,
            408 => PlatformErrorKind::Timeout,
            status => PlatformErrorKind::Status(status),
        };
        Self {
            kind,
            message: message.into(),
            retryable: retryable_codes.contains(&status),
        }
    }

    /// Classify an HTTP status against [`DEFAULT_RETRYABLE_STATUS_CODES`]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::from_status(status, message, &DEFAULT_RETRYABLE_STATUS_CODES)
    }

    /// A request that timed out, which is always retryable
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: PlatformErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    /// A change refused because it conflicts with the storefront's state
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            kind: PlatformErrorKind::Conflict,
            message: message.into(),
            retryable: false,
        }
    }

    /// A resource the storefront does not offer
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self {
            kind: PlatformErrorKind::Unsupported,
            message: message.into(),
            retryable: false,
        }
    }

    /// A request the storefront rejected as malformed
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            kind: PlatformErrorKind::Invalid,
            message: message.into(),
            retryable: false,
        }
    }

    /// Whether the storefront refused the change as conflicting
    pub fn is_conflict(&self) -> bool {
        self.kind == PlatformErrorKind::Conflict
    }

    /// Whether the storefront does not offer the requested resource
    pub fn is_unsupported(&self) -> bool {
        self.kind == PlatformErrorKind::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(408, true)]
    #[case(429, true)]
    #[case(500, true)]
    #[case(503, true)]
    #[case(400, false)]
    #[case(401, false)]
    #[case(409, false)]
    fn default_classification(#[case] status: u16, #[case] retryable: bool) {
        assert_eq!(PlatformError::status(status, "").retryable, retryable);
    }

    #[test]
    fn custom_codes_override_defaults() {
        let error = PlatformError::from_status(503, "maintenance", &[429]);
        assert_eq!(error.kind, PlatformErrorKind::Status(503));
        assert!(!error.retryable);
        assert!(PlatformError::status(409, "too late").is_conflict());
    }
}
