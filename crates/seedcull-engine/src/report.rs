//! Run outcome returned to the caller and summarised in the log.

use serde::Serialize;
use seedcull_torrent_core::{TorrentStatus, format_bytes};
use tracing::info;

use crate::assign::AssignSummary;
use crate::cleaner::Decision;

/// Decision taken for one torrent.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TorrentDecision {
    /// Torrent hash as reported by the client.
    pub hash: String,
    /// Display name.
    pub name: String,
    /// Category the torrent was filed under.
    pub category: String,
    /// Import status assigned for this run.
    pub status: Option<TorrentStatus>,
    /// What the cleaner decided.
    pub decision: Decision,
    /// Failure of the resulting action, when it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Totals of a cleaner pass.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CleanReport {
    /// Bytes released by deletions and failed downloads.
    pub freed_bytes: u64,
    /// Torrents deleted after seeding.
    pub deleted: usize,
    /// Torrents marked failed.
    pub failed: usize,
    /// Actions that errored; their torrents were left untouched.
    pub errors: usize,
    /// One entry per torrent, in evaluation order.
    pub decisions: Vec<TorrentDecision>,
}

/// Pause/resume instructions issued by the optimizer.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ResumeReport {
    /// Hashes paused.
    pub paused: Vec<String>,
    /// Hashes resumed.
    pub resumed: Vec<String>,
}

/// Everything one run did.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RunReport {
    /// Whether mutating calls were suppressed.
    pub dry_run: bool,
    /// How import statuses were assigned.
    pub assign: AssignSummary,
    /// Cleaner totals and decisions.
    pub clean: CleanReport,
    /// Optimizer output; `None` when no budget was available.
    pub resumes: Option<ResumeReport>,
}

impl RunReport {
    /// Emit the end-of-run summary line.
    pub fn log(&self) {
        info!(
            freed_bytes = self.clean.freed_bytes,
            freed = %format_bytes(self.clean.freed_bytes),
            deleted = self.clean.deleted,
            failed = self.clean.failed,
            errors = self.clean.errors,
            paused = self.resumes.as_ref().map_or(0, |plan| plan.paused.len()),
            resumed = self.resumes.as_ref().map_or(0, |plan| plan.resumed.len()),
            dry_run = self.dry_run,
            "run complete"
        );
    }
}
