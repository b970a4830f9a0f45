//! Recording fakes for the download client and PVR seams.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use seedcull_pvr::{EventStream, HistoryEvent, Pvr, PvrError, PvrResult, QueueItem};
use seedcull_torrent_core::{
    ClientFamily, DownloadClient, Torrent, TorrentError, TorrentRateLimit, TorrentResult,
};
use tokio::sync::RwLock;

/// Download client that serves a fixed torrent list and records every call.
#[derive(Debug, Default)]
pub struct RecordingClient {
    torrents: Vec<Torrent>,
    free_space: Option<u64>,
    failing: HashSet<String>,
    /// Hashes passed to `delete_permanently`, in call order.
    pub deleted: RwLock<Vec<String>>,
    /// Hashes passed to `pause`, in call order.
    pub paused: RwLock<Vec<String>>,
    /// Hashes passed to `resume`, in call order.
    pub resumed: RwLock<Vec<String>>,
    /// Limits passed to `set_speed_limits`.
    pub limits: RwLock<Vec<TorrentRateLimit>>,
}

impl RecordingClient {
    /// Serve `torrents` from `list_torrents`.
    #[must_use]
    pub fn with_torrents(torrents: Vec<Torrent>) -> Self {
        Self {
            torrents,
            ..Self::default()
        }
    }

    /// Report `bytes` of free space.
    #[must_use]
    pub fn with_free_space(mut self, bytes: u64) -> Self {
        self.free_space = Some(bytes);
        self
    }

    /// Make deletes of `hash` fail.
    #[must_use]
    pub fn failing_delete(mut self, hash: &str) -> Self {
        self.failing.insert(hash.to_ascii_lowercase());
        self
    }

    /// Snapshot of deleted hashes.
    pub async fn deleted(&self) -> Vec<String> {
        self.deleted.read().await.clone()
    }

    /// Snapshot of paused hashes.
    pub async fn paused(&self) -> Vec<String> {
        self.paused.read().await.clone()
    }

    /// Snapshot of resumed hashes.
    pub async fn resumed(&self) -> Vec<String> {
        self.resumed.read().await.clone()
    }
}

#[async_trait]
impl DownloadClient for RecordingClient {
    fn family(&self) -> ClientFamily {
        ClientFamily::Qbittorrent
    }

    async fn list_torrents(&self) -> TorrentResult<Vec<Torrent>> {
        Ok(self.torrents.clone())
    }

    async fn delete_permanently(&self, hashes: &[String]) -> TorrentResult<()> {
        if hashes
            .iter()
            .any(|hash| self.failing.contains(&hash.to_ascii_lowercase()))
        {
            return Err(TorrentError::Status {
                operation: "torrents.delete",
                status: 500,
            });
        }
        self.deleted.write().await.extend_from_slice(hashes);
        Ok(())
    }

    async fn pause(&self, hashes: &[String]) -> TorrentResult<()> {
        self.paused.write().await.extend_from_slice(hashes);
        Ok(())
    }

    async fn resume(&self, hashes: &[String]) -> TorrentResult<()> {
        self.resumed.write().await.extend_from_slice(hashes);
        Ok(())
    }

    async fn set_speed_limits(&self, limits: TorrentRateLimit) -> TorrentResult<()> {
        self.limits.write().await.push(limits);
        Ok(())
    }

    async fn free_space(&self) -> TorrentResult<Option<u64>> {
        Ok(self.free_space)
    }
}

/// PVR that serves canned history and queue data.
#[derive(Debug, Default)]
pub struct StaticPvr {
    name: String,
    events: Vec<HistoryEvent>,
    queue: Vec<QueueItem>,
    unavailable: bool,
    pulled: AtomicUsize,
    queue_fetches: AtomicUsize,
    /// `(queue id, blacklist)` pairs passed to `queue_delete`.
    pub queue_deletes: RwLock<Vec<(u64, bool)>>,
}

impl StaticPvr {
    /// Empty PVR called `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Serve `events` from `history_events`, in this order.
    #[must_use]
    pub fn with_events(mut self, events: Vec<HistoryEvent>) -> Self {
        self.events = events;
        self
    }

    /// Serve `queue` from `queue`.
    #[must_use]
    pub fn with_queue(mut self, queue: Vec<QueueItem>) -> Self {
        self.queue = queue;
        self
    }

    /// Fail every call with a 503.
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Number of history events handed to consumers so far.
    pub fn events_pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }

    /// Number of queue fetches served so far.
    pub fn queue_fetches(&self) -> usize {
        self.queue_fetches.load(Ordering::SeqCst)
    }

    /// Snapshot of queue deletions.
    pub async fn queue_deletes(&self) -> Vec<(u64, bool)> {
        self.queue_deletes.read().await.clone()
    }

    const fn outage(operation: &'static str) -> PvrError {
        PvrError::HttpStatus {
            operation,
            status: 503,
        }
    }
}

#[async_trait]
impl Pvr for StaticPvr {
    fn name(&self) -> &str {
        &self.name
    }

    fn history_events(&self) -> EventStream<'_> {
        if self.unavailable {
            return stream::once(async { Err(Self::outage("history.list")) }).boxed();
        }
        stream::iter(self.events.iter().cloned())
            .map(|event| {
                self.pulled.fetch_add(1, Ordering::SeqCst);
                Ok(event)
            })
            .boxed()
    }

    async fn queue(&self) -> PvrResult<Vec<QueueItem>> {
        self.queue_fetches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(Self::outage("queue.list"));
        }
        Ok(self.queue.clone())
    }

    async fn queue_delete(&self, id: u64, blacklist: bool) -> PvrResult<()> {
        if self.unavailable {
            return Err(Self::outage("queue.delete"));
        }
        self.queue_deletes.write().await.push((id, blacklist));
        Ok(())
    }
}
