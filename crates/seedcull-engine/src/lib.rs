#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, unreachable_pub)]
#![allow(clippy::module_name_repetitions)]

//! Decision engine: import-status reconciliation, per-torrent clean-up
//! decisions and the pause/resume optimizer.
//!
//! Layout: `reconcile.rs` (per-PVR event reconciliation), `assign.rs`
//! (category bindings and status stamping), `cleaner.rs` (decision state
//! machine), `resumes.rs` (quota optimizer), `queue.rs` (run-scoped queue
//! cache), `actions.rs` (dry-run gate), `report.rs` (run outcome),
//! `orchestrator.rs` (one full run), `error.rs` (`EngineError`).

pub mod actions;
pub mod assign;
pub mod cleaner;
pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod reconcile;
pub mod report;
pub mod resumes;

use std::collections::HashMap;
use std::sync::Arc;

use seedcull_pvr::Pvr;

pub use actions::Actions;
pub use assign::{AssignSummary, CategoryHandler, StatusAssigner};
pub use cleaner::{Cleaner, CleanerSettings, Decision, FailReason, SkipReason};
pub use error::{ActionError, EngineError, EngineResult};
pub use orchestrator::{Engine, EngineSettings, TorrentSnapshot};
pub use queue::{QueueCache, QueueIndex};
pub use reconcile::{Reconciler, Reconciliation, Resolution};
pub use report::{CleanReport, ResumeReport, RunReport, TorrentDecision};
pub use resumes::{Resumes, Throttle};

/// Configured PVRs keyed by name.
pub type PvrRegistry = HashMap<String, Arc<dyn Pvr>>;
