//! Error types for download-client operations.

use std::error::Error;

use thiserror::Error;

/// Primary error type for download-client operations.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// Operation is not supported by the download client.
    #[error("torrent operation not supported")]
    Unsupported {
        /// Operation identifier.
        operation: &'static str,
    },
    /// The download client could not be reached.
    #[error("download client unavailable")]
    Unavailable {
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The download client refused the supplied credentials.
    #[error("download client rejected login")]
    LoginRejected {
        /// Response body returned by the client, when any.
        detail: Option<String>,
    },
    /// Request reached the client but failed in transit or decoding.
    #[error("torrent operation failed")]
    OperationFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The client answered with a non-success status.
    #[error("torrent operation returned an error status")]
    Status {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status code returned by the client.
        status: u16,
    },
}

impl TorrentError {
    /// Wrap an arbitrary failure as an operation failure.
    pub fn operation(
        operation: &'static str,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::OperationFailed {
            operation,
            source: source.into(),
        }
    }

    /// Wrap a connection failure.
    pub fn unavailable(source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Unavailable {
            source: source.into(),
        }
    }
}

/// Convenience alias for download-client results.
pub type TorrentResult<T> = Result<T, TorrentError>;
