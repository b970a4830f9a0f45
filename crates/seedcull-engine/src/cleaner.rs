//! Per-torrent decision state machine.
//!
//! # Design
//! - Rules are evaluated in a fixed order and the first match wins; see
//!   [`Cleaner::decide`].
//! - Torrents are visited by descending share ratio. Quota pressure is
//!   recomputed before each torrent from the bytes freed so far.
//! - A failing action is logged and counted; it never aborts the pass.
//! - Data that no PVR confirmed as imported is never deleted for space.

use chrono::{DateTime, Utc};
use serde::Serialize;
use seedcull_pvr::QueueItem;
use seedcull_torrent_core::{SeedLimits, SeedStats, Torrent, TorrentStatus, format_bytes};
use tracing::{debug, error, info, warn};

use crate::PvrRegistry;
use crate::actions::Actions;
use crate::error::ActionError;
use crate::queue::QueueCache;
use crate::report::{CleanReport, TorrentDecision};

/// Why a torrent was left alone.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Category has no binding; operator misconfiguration.
    UnknownCategory,
    /// Category is bound to no PVR on purpose.
    Unmanaged,
    /// Still downloading and healthy.
    Downloading,
    /// Complete but not seeded enough.
    Seeding,
    /// Fully seeded, but space is not needed.
    NoQuotaPressure,
}

/// Why a torrent was marked failed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailReason {
    /// The PVR reported a fatal problem with the queued download.
    QueueMessage(String),
    /// Download stalled past its grace period.
    Unhealthy,
}

/// Outcome of the state machine for one torrent.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    /// No action.
    Skip {
        /// Rule that matched.
        reason: SkipReason,
    },
    /// Delete the torrent and its payload.
    Delete,
    /// Give up on the download. With a queue entry the PVR drops and
    /// blacklists it; without one the torrent is deleted directly.
    MarkFailed {
        /// Rule that matched.
        reason: FailReason,
        /// PVR queue entry to drop, when one exists.
        queue_id: Option<u64>,
    },
    /// Seeded and under quota pressure, but not confirmed imported.
    Unhandled {
        /// Status that blocked deletion.
        status: Option<TorrentStatus>,
    },
}

/// Tunables for the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanerSettings {
    /// Health and seeding constants.
    pub limits: SeedLimits,
    /// Storage ceiling; `None` means always under pressure.
    pub max_used_bytes: Option<u64>,
    /// Queue status messages (case-insensitive substrings) that fail a download.
    pub fatal_queue_messages: Vec<String>,
}

impl Default for CleanerSettings {
    fn default() -> Self {
        Self {
            limits: SeedLimits::default(),
            max_used_bytes: None,
            fatal_queue_messages: vec!["unable to parse file".to_string()],
        }
    }
}

impl CleanerSettings {
    /// Whether used storage has reached the ceiling.
    #[must_use]
    pub fn quota_pressured(&self, used_bytes: u64) -> bool {
        self.max_used_bytes.is_none_or(|max| used_bytes >= max)
    }
}

/// Decision engine over a stamped torrent list.
pub struct Cleaner<'a> {
    actions: Actions<'a>,
    pvrs: &'a PvrRegistry,
    queues: &'a QueueCache,
    settings: &'a CleanerSettings,
}

impl<'a> Cleaner<'a> {
    /// Wire the cleaner to its collaborators.
    #[must_use]
    pub const fn new(
        actions: Actions<'a>,
        pvrs: &'a PvrRegistry,
        queues: &'a QueueCache,
        settings: &'a CleanerSettings,
    ) -> Self {
        Self {
            actions,
            pvrs,
            queues,
            settings,
        }
    }

    /// Decide and act on every torrent.
    pub async fn clean(&self, torrents: &[Torrent], now: DateTime<Utc>) -> CleanReport {
        let initial_used: u64 = torrents.iter().map(Torrent::downloaded_bytes).sum();
        let mut order: Vec<&Torrent> = torrents.iter().collect();
        order.sort_by(|left, right| right.effective_ratio().total_cmp(&left.effective_ratio()));

        let mut report = CleanReport::default();
        for torrent in order {
            let used = initial_used.saturating_sub(report.freed_bytes);
            let pressured = self.settings.quota_pressured(used);
            let stats = SeedStats::compute(torrent, now, &self.settings.limits);
            let decision = self.decide(torrent, &stats, pressured).await;
            log_decision(torrent, &stats, &decision);

            let error = match self.execute(torrent, &decision, &mut report).await {
                Ok(()) => None,
                Err(err) => {
                    let message = err.describe();
                    warn!(torrent = %torrent.name, error = %message, "action failed; leaving torrent in place");
                    report.errors += 1;
                    Some(message)
                }
            };
            report.decisions.push(TorrentDecision {
                hash: torrent.hash.clone(),
                name: torrent.name.clone(),
                category: torrent.category.clone(),
                status: torrent.status,
                decision,
                error,
            });
        }
        report
    }

    /// Apply the rules in order; the first that matches wins.
    ///
    /// 1. unknown category: skip
    /// 2. unmanaged category: skip
    /// 3. fatal PVR queue message: mark failed
    /// 4. unhealthy: mark failed
    /// 5. incomplete: skip
    /// 6. under-seeded: skip
    /// 7. no quota pressure: skip
    /// 8. imported: delete
    /// 9. anything else: unhandled
    pub async fn decide(&self, torrent: &Torrent, stats: &SeedStats, pressured: bool) -> Decision {
        match torrent.status {
            Some(TorrentStatus::UnknownCat) => {
                return Decision::Skip {
                    reason: SkipReason::UnknownCategory,
                };
            }
            Some(TorrentStatus::NoPvr) => {
                return Decision::Skip {
                    reason: SkipReason::Unmanaged,
                };
            }
            _ => {}
        }

        let queued = self.queue_entry(torrent).await;
        if let Some(entry) = &queued
            && let Some(message) = entry.fatal_message(&self.settings.fatal_queue_messages)
        {
            return Decision::MarkFailed {
                reason: FailReason::QueueMessage(message.to_string()),
                queue_id: Some(entry.id),
            };
        }
        if !stats.health.is_ok() {
            return Decision::MarkFailed {
                reason: FailReason::Unhealthy,
                queue_id: queued.map(|entry| entry.id),
            };
        }
        if !torrent.is_complete() {
            return Decision::Skip {
                reason: SkipReason::Downloading,
            };
        }
        if !stats.seeding.is_ok() {
            return Decision::Skip {
                reason: SkipReason::Seeding,
            };
        }
        if !pressured {
            return Decision::Skip {
                reason: SkipReason::NoQuotaPressure,
            };
        }
        if torrent.status == Some(TorrentStatus::Imported) {
            Decision::Delete
        } else {
            Decision::Unhandled {
                status: torrent.status,
            }
        }
    }

    async fn queue_entry(&self, torrent: &Torrent) -> Option<QueueItem> {
        let pvr = self.pvrs.get(torrent.pvr.as_deref()?)?;
        let index = self.queues.lookup(pvr.as_ref()).await?;
        index.find(&torrent.key()).cloned()
    }

    async fn execute(
        &self,
        torrent: &Torrent,
        decision: &Decision,
        report: &mut CleanReport,
    ) -> Result<(), ActionError> {
        let hashes = [torrent.hash.clone()];
        match decision {
            Decision::Skip { .. } | Decision::Unhandled { .. } => {}
            Decision::Delete => {
                self.delete(&hashes).await?;
                report.deleted += 1;
                report.freed_bytes += torrent.size;
            }
            Decision::MarkFailed {
                queue_id: Some(id), ..
            } => {
                let name = torrent.pvr.as_deref().unwrap_or_default();
                let pvr = self
                    .pvrs
                    .get(name)
                    .ok_or_else(|| ActionError::UnregisteredPvr {
                        pvr: name.to_string(),
                    })?;
                self.actions
                    .queue_delete(pvr.as_ref(), *id, true)
                    .await
                    .map_err(|source| ActionError::Pvr {
                        operation: "queue.delete",
                        source,
                    })?;
                report.failed += 1;
                report.freed_bytes += torrent.downloaded_bytes();
            }
            Decision::MarkFailed { queue_id: None, .. } => {
                self.delete(&hashes).await?;
                report.failed += 1;
                report.freed_bytes += torrent.downloaded_bytes();
            }
        }
        Ok(())
    }

    async fn delete(&self, hashes: &[String]) -> Result<(), ActionError> {
        self.actions
            .delete(hashes)
            .await
            .map_err(|source| ActionError::Client {
                operation: "torrents.delete",
                source,
            })
    }
}

fn log_decision(torrent: &Torrent, stats: &SeedStats, decision: &Decision) {
    let status = torrent.status.map_or("none", |status| status.as_str());
    match decision {
        Decision::Skip {
            reason: SkipReason::UnknownCategory,
        } => {
            error!(torrent = %torrent.name, category = %torrent.category, "unknown category");
        }
        Decision::Skip { reason } => debug!(
            torrent = %torrent.name,
            category = %torrent.category,
            status,
            health = %stats.health,
            seeding = %stats.seeding,
            ?reason,
            "skipping"
        ),
        Decision::Delete => info!(
            torrent = %torrent.name,
            category = %torrent.category,
            ratio = torrent.effective_ratio(),
            seeding = %stats.seeding,
            size = %format_bytes(torrent.size),
            "done, deleting"
        ),
        Decision::MarkFailed { reason, queue_id } => info!(
            torrent = %torrent.name,
            category = %torrent.category,
            health = %stats.health,
            ?reason,
            blacklist = queue_id.is_some(),
            "marking failed"
        ),
        Decision::Unhandled { .. } => warn!(
            torrent = %torrent.name,
            category = %torrent.category,
            status,
            "seeded and under quota pressure but not imported; keeping"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use seedcull_pvr::Pvr;
    use seedcull_test_support::{GIB, RecordingClient, StaticPvr, anchor, torrent};
    use seedcull_torrent_core::ClientState;

    fn with_status(mut torrent: Torrent, status: TorrentStatus) -> Torrent {
        torrent.status = Some(status);
        if !matches!(status, TorrentStatus::UnknownCat | TorrentStatus::NoPvr) {
            torrent.pvr = Some("radarr".to_string());
        }
        torrent
    }

    fn queue_item(id: u64, hash: &str, messages: &[&str]) -> QueueItem {
        QueueItem {
            id,
            download_id: Some(hash.to_ascii_uppercase()),
            title: format!("release-{hash}"),
            status_messages: messages.iter().map(|message| (*message).to_string()).collect(),
        }
    }

    struct Harness {
        client: RecordingClient,
        pvr: Arc<StaticPvr>,
        pvrs: PvrRegistry,
        settings: CleanerSettings,
    }

    impl Harness {
        fn new(queue: Vec<QueueItem>) -> Self {
            let pvr = Arc::new(StaticPvr::new("radarr").with_queue(queue));
            let mut pvrs: PvrRegistry = HashMap::new();
            pvrs.insert("radarr".to_string(), pvr.clone() as Arc<dyn Pvr>);
            let settings = CleanerSettings {
                limits: SeedLimits {
                    dl_grace: std::time::Duration::from_secs(86_400),
                    dl_time_limit: std::time::Duration::from_secs(86_400),
                    ..SeedLimits::default()
                },
                ..CleanerSettings::default()
            };
            Self {
                client: RecordingClient::default(),
                pvr,
                pvrs,
                settings,
            }
        }

        async fn clean(&self, torrents: &[Torrent], dry_run: bool) -> CleanReport {
            let queues = QueueCache::new();
            let cleaner = Cleaner::new(
                Actions::new(&self.client, dry_run),
                &self.pvrs,
                &queues,
                &self.settings,
            );
            cleaner.clean(torrents, anchor()).await
        }
    }

    fn seeded(hash: &str) -> Torrent {
        torrent(hash).ratio(20.0).completed_hours_ago(1).build()
    }

    fn stalled(hash: &str) -> Torrent {
        torrent(hash)
            .downloading(0.0, ClientState::StalledDownload)
            .added_days_ago(3)
            .build()
    }

    fn only(report: &CleanReport) -> &Decision {
        assert_eq!(report.decisions.len(), 1);
        &report.decisions[0].decision
    }

    #[tokio::test]
    async fn unknown_category_is_skipped_before_anything_else() {
        let harness = Harness::new(vec![queue_item(1, "aaa", &["Unable to parse file"])]);
        let report = harness
            .clean(&[with_status(stalled("aaa"), TorrentStatus::UnknownCat)], false)
            .await;
        assert_eq!(
            only(&report),
            &Decision::Skip {
                reason: SkipReason::UnknownCategory
            }
        );
        assert!(harness.client.deleted().await.is_empty());
        assert_eq!(harness.pvr.queue_fetches(), 0);
    }

    #[tokio::test]
    async fn unmanaged_category_is_skipped() {
        let harness = Harness::new(Vec::new());
        let report = harness
            .clean(&[with_status(stalled("aaa"), TorrentStatus::NoPvr)], false)
            .await;
        assert_eq!(
            only(&report),
            &Decision::Skip {
                reason: SkipReason::Unmanaged
            }
        );
    }

    #[tokio::test]
    async fn fatal_queue_message_fails_even_healthy_torrents() {
        let harness = Harness::new(vec![queue_item(7, "aaa", &["Unable to parse file"])]);
        let torrent = with_status(seeded("aaa"), TorrentStatus::Grabbed);
        let report = harness.clean(&[torrent], false).await;

        assert_eq!(
            only(&report),
            &Decision::MarkFailed {
                reason: FailReason::QueueMessage("Unable to parse file".into()),
                queue_id: Some(7),
            }
        );
        assert_eq!(harness.pvr.queue_deletes().await, vec![(7, true)]);
        assert!(harness.client.deleted().await.is_empty());
        assert_eq!(report.failed, 1);
        assert_eq!(report.freed_bytes, GIB);
    }

    #[tokio::test]
    async fn unhealthy_download_is_blacklisted_through_queue() {
        let harness = Harness::new(vec![queue_item(3, "aaa", &[])]);
        let report = harness
            .clean(&[with_status(stalled("aaa"), TorrentStatus::Grabbed)], false)
            .await;
        assert_eq!(
            only(&report),
            &Decision::MarkFailed {
                reason: FailReason::Unhealthy,
                queue_id: Some(3),
            }
        );
        assert_eq!(harness.pvr.queue_deletes().await, vec![(3, true)]);
        assert_eq!(report.failed, 1);
        assert_eq!(report.freed_bytes, 0, "nothing was downloaded");
    }

    #[tokio::test]
    async fn unhealthy_download_without_queue_entry_is_deleted() {
        let harness = Harness::new(Vec::new());
        let report = harness
            .clean(&[with_status(stalled("aaa"), TorrentStatus::Unknown)], false)
            .await;
        assert_eq!(
            only(&report),
            &Decision::MarkFailed {
                reason: FailReason::Unhealthy,
                queue_id: None,
            }
        );
        assert_eq!(harness.client.deleted().await, vec!["aaa".to_string()]);
        assert_eq!(report.failed, 1);
        assert_eq!(report.deleted, 0);
    }

    #[tokio::test]
    async fn healthy_download_and_short_seed_are_skipped() {
        let harness = Harness::new(Vec::new());
        let downloading = torrent("aaa")
            .downloading(0.4, ClientState::Downloading)
            .added_days_ago(30)
            .build();
        let fresh = torrent("bbb").ratio(0.5).completed_hours_ago(2).build();
        let report = harness
            .clean(
                &[
                    with_status(downloading, TorrentStatus::Grabbed),
                    with_status(fresh, TorrentStatus::Imported),
                ],
                false,
            )
            .await;

        let reasons: HashMap<_, _> = report
            .decisions
            .iter()
            .map(|entry| (entry.hash.as_str(), entry.decision.clone()))
            .collect();
        assert_eq!(
            reasons["aaa"],
            Decision::Skip {
                reason: SkipReason::Downloading
            }
        );
        assert_eq!(
            reasons["bbb"],
            Decision::Skip {
                reason: SkipReason::Seeding
            }
        );
        assert!(harness.client.deleted().await.is_empty());
    }

    #[tokio::test]
    async fn imported_and_seeded_is_deleted_under_pressure() {
        let harness = Harness::new(Vec::new());
        let report = harness
            .clean(&[with_status(seeded("aaa"), TorrentStatus::Imported)], false)
            .await;
        assert_eq!(only(&report), &Decision::Delete);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.freed_bytes, GIB);
        assert_eq!(harness.client.deleted().await, vec!["aaa".to_string()]);
    }

    #[tokio::test]
    async fn unconfirmed_import_is_never_deleted() {
        let harness = Harness::new(Vec::new());
        let report = harness
            .clean(
                &[
                    with_status(seeded("aaa"), TorrentStatus::Grabbed),
                    with_status(seeded("bbb"), TorrentStatus::DlFailed),
                ],
                false,
            )
            .await;
        assert!(report.decisions.iter().all(|entry| matches!(
            entry.decision,
            Decision::Unhandled { .. }
        )));
        assert!(harness.client.deleted().await.is_empty());
        assert_eq!(report.deleted, 0);
    }

    #[tokio::test]
    async fn pressure_is_recomputed_after_each_deletion() {
        let mut harness = Harness::new(Vec::new());
        harness.settings.max_used_bytes = Some(GIB + GIB / 2);
        let best = with_status(torrent("best").ratio(30.0).build(), TorrentStatus::Imported);
        let next = with_status(torrent("next").ratio(25.0).build(), TorrentStatus::Imported);

        let report = harness.clean(&[next, best], false).await;

        assert_eq!(report.decisions[0].hash, "best", "highest ratio goes first");
        assert_eq!(report.decisions[0].decision, Decision::Delete);
        assert_eq!(
            report.decisions[1].decision,
            Decision::Skip {
                reason: SkipReason::NoQuotaPressure
            }
        );
        assert_eq!(report.deleted, 1);
    }

    #[tokio::test]
    async fn failed_action_is_isolated_to_its_torrent() {
        let mut harness = Harness::new(Vec::new());
        harness.client = RecordingClient::default().failing_delete("aaa");
        let report = harness
            .clean(
                &[
                    with_status(torrent("aaa").ratio(30.0).build(), TorrentStatus::Imported),
                    with_status(torrent("bbb").ratio(20.0).build(), TorrentStatus::Imported),
                ],
                false,
            )
            .await;

        assert_eq!(report.errors, 1);
        assert_eq!(report.deleted, 1);
        assert_eq!(
            report.decisions[0].error.as_deref(),
            Some("download client call torrents.delete failed: torrent operation returned an error status")
        );
        assert_eq!(harness.client.deleted().await, vec!["bbb".to_string()]);
    }

    #[tokio::test]
    async fn dry_run_keeps_bookkeeping_but_touches_nothing() {
        let harness = Harness::new(vec![queue_item(4, "bbb", &[])]);
        let report = harness
            .clean(
                &[
                    with_status(seeded("aaa"), TorrentStatus::Imported),
                    with_status(stalled("bbb"), TorrentStatus::Grabbed),
                ],
                true,
            )
            .await;

        assert_eq!(report.deleted, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.freed_bytes, GIB);
        assert!(harness.client.deleted().await.is_empty());
        assert!(harness.pvr.queue_deletes().await.is_empty());
    }

    #[tokio::test]
    async fn queue_entry_for_unregistered_pvr_is_an_action_error() {
        let harness = Harness::new(Vec::new());
        let queues = QueueCache::new();
        let cleaner = Cleaner::new(
            Actions::new(&harness.client, false),
            &harness.pvrs,
            &queues,
            &harness.settings,
        );
        let mut orphan = with_status(stalled("aaa"), TorrentStatus::Grabbed);
        orphan.pvr = Some("lidarr".to_string());
        let decision = Decision::MarkFailed {
            reason: FailReason::Unhealthy,
            queue_id: Some(3),
        };
        let mut report = CleanReport::default();

        let err = cleaner
            .execute(&orphan, &decision, &mut report)
            .await
            .expect_err("no such pvr");
        assert!(matches!(err, ActionError::UnregisteredPvr { ref pvr } if pvr == "lidarr"));
        assert_eq!(report.failed, 0);
        assert!(harness.pvr.queue_deletes().await.is_empty());
    }

    #[test]
    fn missing_quota_means_always_pressured() {
        let settings = CleanerSettings::default();
        assert!(settings.quota_pressured(0));
        let capped = CleanerSettings {
            max_used_bytes: Some(100),
            ..CleanerSettings::default()
        };
        assert!(capped.quota_pressured(100));
        assert!(!capped.quota_pressured(99));
    }

    #[test]
    fn decisions_serialize_with_action_tag() {
        let json = serde_json::to_value(Decision::MarkFailed {
            reason: FailReason::Unhealthy,
            queue_id: None,
        })
        .expect("decision serializes");
        assert_eq!(json["action"], "mark_failed");
        assert_eq!(json["reason"], "unhealthy");
    }
}
