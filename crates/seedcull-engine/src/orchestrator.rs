//! One full pruning run against a download client and its PVRs.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use seedcull_torrent_core::{
    DownloadClient, SeedStats, Torrent, TorrentError, TorrentRateLimit, format_bytes,
};
use tracing::{debug, info, warn};

use crate::PvrRegistry;
use crate::actions::Actions;
use crate::assign::{CategoryHandler, StatusAssigner};
use crate::cleaner::{Cleaner, CleanerSettings, Decision};
use crate::error::{EngineError, EngineResult};
use crate::queue::QueueCache;
use crate::report::{CleanReport, ResumeReport, RunReport};
use crate::resumes::Resumes;

/// Everything a run needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Category name to handler.
    pub bindings: HashMap<String, CategoryHandler>,
    /// Decision tunables.
    pub cleaner: CleanerSettings,
    /// Downloads the optimizer keeps resumed even without budget.
    pub min_active_downloads: usize,
    /// Global transfer caps applied before each run.
    pub speed_limits: Option<TorrentRateLimit>,
    /// Log mutating calls instead of issuing them.
    pub dry_run: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            bindings: HashMap::new(),
            cleaner: CleanerSettings::default(),
            min_active_downloads: 1,
            speed_limits: None,
            dry_run: false,
        }
    }
}

/// Torrent with its assigned status and current scores.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TorrentSnapshot {
    /// Client snapshot with assigned fields filled in.
    pub torrent: Torrent,
    /// Health and seeding scores at inspection time.
    pub stats: SeedStats,
}

/// Pruning engine bound to one download client.
pub struct Engine {
    client: Arc<dyn DownloadClient>,
    pvrs: PvrRegistry,
    settings: EngineSettings,
}

impl Engine {
    /// Bind the engine to its collaborators.
    #[must_use]
    pub fn new(client: Arc<dyn DownloadClient>, pvrs: PvrRegistry, settings: EngineSettings) -> Self {
        Self {
            client,
            pvrs,
            settings,
        }
    }

    /// Settings the engine was built with.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run once against the current time.
    ///
    /// # Errors
    ///
    /// Returns an error only when the torrent list cannot be fetched; every
    /// later failure is logged and reflected in the report.
    pub async fn run(&self) -> EngineResult<RunReport> {
        self.run_at(Utc::now()).await
    }

    /// Run once, scoring torrents as of `now`.
    ///
    /// # Errors
    ///
    /// See [`Engine::run`].
    pub async fn run_at(&self, now: DateTime<Utc>) -> EngineResult<RunReport> {
        let actions = Actions::new(self.client.as_ref(), self.settings.dry_run);
        self.apply_speed_limits(actions).await;

        let mut torrents = self.list_torrents().await?;
        info!(torrents = torrents.len(), dry_run = self.settings.dry_run, "fetched torrents");

        let queues = QueueCache::new();
        let assign = StatusAssigner::new(
            self.client.family(),
            &self.settings.bindings,
            &self.pvrs,
            &queues,
        )
        .assign(&mut torrents)
        .await;

        let clean = Cleaner::new(actions, &self.pvrs, &queues, &self.settings.cleaner)
            .clean(&torrents, now)
            .await;
        let resumes = self.rebalance(actions, &torrents, &clean).await;

        let report = RunReport {
            dry_run: self.settings.dry_run,
            assign,
            clean,
            resumes,
        };
        report.log();
        Ok(report)
    }

    /// Assign statuses and compute scores without acting on anything.
    ///
    /// # Errors
    ///
    /// Returns an error when the torrent list cannot be fetched.
    pub async fn inspect(&self, now: DateTime<Utc>) -> EngineResult<Vec<TorrentSnapshot>> {
        let mut torrents = self.list_torrents().await?;
        let queues = QueueCache::new();
        StatusAssigner::new(
            self.client.family(),
            &self.settings.bindings,
            &self.pvrs,
            &queues,
        )
        .assign(&mut torrents)
        .await;

        let limits = &self.settings.cleaner.limits;
        Ok(torrents
            .into_iter()
            .map(|torrent| {
                let stats = SeedStats::compute(&torrent, now, limits);
                TorrentSnapshot { torrent, stats }
            })
            .collect())
    }

    async fn list_torrents(&self) -> EngineResult<Vec<Torrent>> {
        self.client
            .list_torrents()
            .await
            .map_err(|source| EngineError::Client {
                operation: "torrents.list",
                source,
            })
    }

    async fn apply_speed_limits(&self, actions: Actions<'_>) {
        let Some(limits) = self.settings.speed_limits.filter(|limits| !limits.is_empty()) else {
            return;
        };
        match actions.set_speed_limits(limits).await {
            Ok(()) => debug!(?limits, "applied speed limits"),
            Err(TorrentError::Unsupported { operation }) => {
                debug!(operation, "client does not support speed limits");
            }
            Err(err) => warn!(error = %err, "failed to apply speed limits"),
        }
    }

    async fn rebalance(
        &self,
        actions: Actions<'_>,
        torrents: &[Torrent],
        clean: &CleanReport,
    ) -> Option<ResumeReport> {
        let budget = self.budget(torrents, clean).await?;
        let removed: HashSet<&str> = clean
            .decisions
            .iter()
            .filter(|entry| {
                entry.error.is_none()
                    && matches!(entry.decision, Decision::Delete | Decision::MarkFailed { .. })
            })
            .map(|entry| entry.hash.as_str())
            .collect();
        let remaining = torrents
            .iter()
            .filter(|torrent| !removed.contains(torrent.hash.as_str()));

        let plan =
            Resumes::plan(remaining, budget, self.settings.min_active_downloads).optimize();
        debug!(
            budget = %format_bytes(budget),
            pause = plan.paused.len(),
            resume = plan.resumed.len(),
            "resume plan"
        );
        if let Err(err) = actions.pause(&plan.paused).await {
            warn!(error = %err, "failed to pause downloads");
        }
        if let Err(err) = actions.resume(&plan.resumed).await {
            warn!(error = %err, "failed to resume downloads");
        }
        Some(plan)
    }

    /// Bytes available to incomplete downloads: quota headroom when a quota
    /// is configured, otherwise the client's free disk space.
    async fn budget(&self, torrents: &[Torrent], clean: &CleanReport) -> Option<u64> {
        if let Some(max) = self.settings.cleaner.max_used_bytes {
            let used: u64 = torrents.iter().map(Torrent::downloaded_bytes).sum();
            return Some(max.saturating_sub(used.saturating_sub(clean.freed_bytes)));
        }
        match self.client.free_space().await {
            Ok(Some(bytes)) => Some(bytes),
            Ok(None) => {
                debug!("no quota and no free-space report; skipping resume optimizer");
                None
            }
            Err(err) => {
                warn!(error = %err, "free space unavailable; skipping resume optimizer");
                None
            }
        }
    }
}
