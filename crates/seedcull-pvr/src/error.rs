//! Error types for PVR access.

use thiserror::Error;

/// Primary error type for PVR operations.
#[derive(Debug, Error)]
pub enum PvrError {
    /// Configured base URL cannot address the API.
    #[error("invalid PVR URL")]
    InvalidUrl {
        /// URL as configured.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// Request could not be sent or its body could not be read.
    #[error("PVR request failed")]
    Http {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The PVR answered with a non-success status.
    #[error("PVR returned an error status")]
    HttpStatus {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
    },
    /// Response body did not match the expected shape.
    #[error("PVR response could not be decoded")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience alias for PVR results.
pub type PvrResult<T> = Result<T, PvrError>;
