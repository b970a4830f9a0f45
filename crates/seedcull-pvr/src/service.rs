//! The `Pvr` seam consumed by the decision engine.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::PvrResult;
use crate::model::{HistoryEvent, QueueItem};

/// Lazily produced history; consumers may drop it early to stop fetching.
pub type EventStream<'a> = BoxStream<'a, PvrResult<HistoryEvent>>;

/// Operations the engine needs from a media-library manager.
#[async_trait]
pub trait Pvr: Send + Sync {
    /// Name the PVR is configured under.
    fn name(&self) -> &str;

    /// History events, newest first as far as the PVR orders them.
    fn history_events(&self) -> EventStream<'_>;

    /// Current download queue.
    async fn queue(&self) -> PvrResult<Vec<QueueItem>>;

    /// Remove a queue entry, optionally blacklisting its release.
    async fn queue_delete(&self, id: u64, blacklist: bool) -> PvrResult<()>;
}
