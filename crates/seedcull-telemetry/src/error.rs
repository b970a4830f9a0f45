//! Telemetry failures.

use std::error::Error;

use thiserror::Error;

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Failure while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Installing the tracing subscriber failed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Error returned by `try_init`.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}
