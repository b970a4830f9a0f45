//! Category bindings and per-run import-status stamping.

use std::collections::{BTreeMap, HashMap};

use futures_util::TryStreamExt;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use seedcull_pvr::{Pvr, PvrResult};
use seedcull_torrent_core::{ClientFamily, Torrent, TorrentStatus};
use tracing::{debug, info, warn};

use crate::PvrRegistry;
use crate::queue::QueueCache;
use crate::reconcile::{Reconciler, Reconciliation};

/// How torrents filed under one category are handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryHandler {
    /// Nothing manages these torrents; they are never touched.
    Unmanaged,
    /// Payload is trusted as already imported.
    PreImported,
    /// Status comes from the named PVR's history.
    Pvr(String),
}

/// Counts of how statuses were assigned in one run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AssignSummary {
    /// Torrents per assigned status.
    pub by_status: BTreeMap<TorrentStatus, usize>,
    /// PVRs whose history could not be read; their torrents stay `unknown`.
    pub failed_pvrs: Vec<String>,
    /// Imports demoted to `grabbed` because the PVR still queues them.
    pub import_pending: usize,
}

/// Stamps every torrent with a status, the owning PVR and the PVR's
/// correlation id.
pub struct StatusAssigner<'a> {
    family: ClientFamily,
    bindings: &'a HashMap<String, CategoryHandler>,
    pvrs: &'a PvrRegistry,
    queues: &'a QueueCache,
}

impl<'a> StatusAssigner<'a> {
    /// Assign for torrents of a client of `family`.
    #[must_use]
    pub const fn new(
        family: ClientFamily,
        bindings: &'a HashMap<String, CategoryHandler>,
        pvrs: &'a PvrRegistry,
        queues: &'a QueueCache,
    ) -> Self {
        Self {
            family,
            bindings,
            pvrs,
            queues,
        }
    }

    /// Overwrite `status`, `pvr` and `download_client_id` on every torrent.
    pub async fn assign(&self, torrents: &mut [Torrent]) -> AssignSummary {
        let mut pending: HashMap<&str, Vec<String>> = HashMap::new();
        for torrent in torrents.iter_mut() {
            torrent.pvr = None;
            torrent.download_client_id = None;
            torrent.status = Some(match self.bindings.get(&torrent.category) {
                None => TorrentStatus::UnknownCat,
                Some(CategoryHandler::Unmanaged) => TorrentStatus::NoPvr,
                Some(CategoryHandler::PreImported) => TorrentStatus::Imported,
                Some(CategoryHandler::Pvr(name)) => {
                    torrent.pvr = Some(name.clone());
                    pending.entry(name.as_str()).or_default().push(torrent.key());
                    TorrentStatus::Unknown
                }
            });
        }

        let runs = pending.into_iter().filter_map(|(name, keys)| {
            let Some(pvr) = self.pvrs.get(name) else {
                warn!(pvr = name, "category bound to an unconfigured pvr");
                return None;
            };
            let pvr = pvr.as_ref();
            Some(async move { (name.to_string(), reconcile(self.family, pvr, keys).await) })
        });
        let outcomes = join_all(runs).await;

        let mut summary = AssignSummary::default();
        let mut resolved: HashMap<String, Reconciliation> = HashMap::new();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(reconciliation) => {
                    info!(
                        pvr = %name,
                        matched = reconciliation.matched(),
                        unmatched = reconciliation.unmatched().len(),
                        events = reconciliation.observed(),
                        "reconciled history"
                    );
                    for key in reconciliation.unmatched() {
                        debug!(pvr = %name, download_id = %key, "no history event for torrent");
                    }
                    resolved.insert(name, reconciliation);
                }
                Err(err) => {
                    warn!(pvr = %name, error = %err, "history unavailable; statuses stay unknown");
                    summary.failed_pvrs.push(name);
                }
            }
        }
        summary.failed_pvrs.sort_unstable();

        for torrent in torrents.iter_mut() {
            let Some(resolution) = torrent
                .pvr
                .as_deref()
                .and_then(|name| resolved.get(name))
                .and_then(|reconciliation| reconciliation.get(&torrent.key()))
            else {
                continue;
            };
            torrent.status = Some(resolution.status);
            torrent.download_client_id = Some(resolution.download_client_id.clone());
        }

        for torrent in torrents.iter_mut() {
            if self.import_pending(torrent).await {
                warn!(
                    torrent = %torrent.name,
                    pvr = torrent.pvr.as_deref().unwrap_or_default(),
                    "imported but still queued; treating as grabbed"
                );
                torrent.status = Some(TorrentStatus::Grabbed);
                summary.import_pending += 1;
            }
            if let Some(status) = torrent.status {
                *summary.by_status.entry(status).or_default() += 1;
            }
        }
        summary
    }

    /// An import the PVR still lists in its queue has not finished copying.
    async fn import_pending(&self, torrent: &Torrent) -> bool {
        if torrent.status != Some(TorrentStatus::Imported) {
            return false;
        }
        let Some(pvr) = torrent.pvr.as_deref().and_then(|name| self.pvrs.get(name)) else {
            return false;
        };
        match self.queues.lookup(pvr.as_ref()).await {
            Some(index) => index.find(&torrent.key()).is_some(),
            None => false,
        }
    }
}

async fn reconcile(
    family: ClientFamily,
    pvr: &dyn Pvr,
    keys: Vec<String>,
) -> PvrResult<Reconciliation> {
    let mut reconciler = Reconciler::new(family, keys);
    if reconciler.is_settled() {
        return Ok(reconciler.finish());
    }
    let mut events = pvr.history_events();
    while let Some(event) = events.try_next().await? {
        if reconciler.observe(&event).is_break() {
            break;
        }
    }
    Ok(reconciler.finish())
}
