//! # Design
//!
//! - Only failures that abort a whole run surface as `EngineError`.
//! - Per-torrent and per-PVR failures are logged and folded into the report.
//! - A failed cleanup action is an `ActionError`; its [`ActionError::describe`]
//!   text is what the report carries.

use std::iter;

use seedcull_pvr::PvrError;
use seedcull_torrent_core::TorrentError;
use thiserror::Error;

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Run-level engine failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Download-client call the run cannot proceed without failed.
    #[error("download client operation failed")]
    Client {
        /// Operation identifier.
        operation: &'static str,
        /// Source client error.
        #[source]
        source: TorrentError,
    },
}

impl EngineError {
    /// Whether the failure means the download client could not be reached.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Client {
                source: TorrentError::Unavailable { .. },
                ..
            }
        )
    }
}

/// Failure of a single cleanup action; never aborts the pass.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Download-client call failed.
    #[error("download client call {operation} failed")]
    Client {
        /// Operation identifier.
        operation: &'static str,
        /// Source client error.
        #[source]
        source: TorrentError,
    },
    /// PVR call failed.
    #[error("pvr call {operation} failed")]
    Pvr {
        /// Operation identifier.
        operation: &'static str,
        /// Source PVR error.
        #[source]
        source: PvrError,
    },
    /// A queue entry points at a PVR missing from the registry.
    #[error("pvr `{pvr}` is not registered")]
    UnregisteredPvr {
        /// PVR name recorded on the torrent.
        pvr: String,
    },
}

impl ActionError {
    /// One-line message including every source, outermost first.
    #[must_use]
    pub fn describe(&self) -> String {
        iter::successors(Some(self as &(dyn std::error::Error + 'static)), |&err| {
            err.source()
        })
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ")
    }
}
