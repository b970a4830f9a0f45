//! Dry-run gate in front of every mutating call.

use seedcull_pvr::{Pvr, PvrResult};
use seedcull_torrent_core::{DownloadClient, TorrentRateLimit, TorrentResult};
use tracing::info;

/// Mutating operations, each checked against the dry-run flag.
///
/// In dry-run mode every call logs what it would have done and reports
/// success, so callers keep their bookkeeping identical in both modes.
#[derive(Clone, Copy)]
pub struct Actions<'a> {
    client: &'a dyn DownloadClient,
    dry_run: bool,
}

impl<'a> Actions<'a> {
    /// Gate calls to `client`.
    #[must_use]
    pub fn new(client: &'a dyn DownloadClient, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    /// Whether mutating calls are suppressed.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Delete torrents together with their payload.
    pub async fn delete(&self, hashes: &[String]) -> TorrentResult<()> {
        if self.dry_run {
            info!(hashes = ?hashes, "dry run: would delete");
            return Ok(());
        }
        self.client.delete_permanently(hashes).await
    }

    /// Pause torrents.
    pub async fn pause(&self, hashes: &[String]) -> TorrentResult<()> {
        if hashes.is_empty() {
            return Ok(());
        }
        if self.dry_run {
            info!(hashes = ?hashes, "dry run: would pause");
            return Ok(());
        }
        self.client.pause(hashes).await
    }

    /// Resume torrents.
    pub async fn resume(&self, hashes: &[String]) -> TorrentResult<()> {
        if hashes.is_empty() {
            return Ok(());
        }
        if self.dry_run {
            info!(hashes = ?hashes, "dry run: would resume");
            return Ok(());
        }
        self.client.resume(hashes).await
    }

    /// Apply global transfer limits.
    pub async fn set_speed_limits(&self, limits: TorrentRateLimit) -> TorrentResult<()> {
        if self.dry_run {
            info!(?limits, "dry run: would set speed limits");
            return Ok(());
        }
        self.client.set_speed_limits(limits).await
    }

    /// Drop a PVR queue entry, optionally blacklisting its release.
    pub async fn queue_delete(&self, pvr: &dyn Pvr, id: u64, blacklist: bool) -> PvrResult<()> {
        if self.dry_run {
            info!(pvr = pvr.name(), queue_id = id, blacklist, "dry run: would remove queue entry");
            return Ok(());
        }
        pvr.queue_delete(id, blacklist).await
    }
}
