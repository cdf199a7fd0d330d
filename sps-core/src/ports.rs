mod error;
pub use error::{DEFAULT_RETRYABLE_STATUS_CODES, PlatformError, PlatformErrorKind};

mod platform;
pub use platform::PlatformClient;
