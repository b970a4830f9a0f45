//! Run-scoped memo of each PVR's download queue.

use std::collections::HashMap;
use std::sync::Arc;

use seedcull_pvr::{Pvr, QueueItem};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Queue entries of one PVR indexed by lowercase correlation key.
#[derive(Debug, Default)]
pub struct QueueIndex {
    by_key: HashMap<String, QueueItem>,
}

impl QueueIndex {
    fn new(items: Vec<QueueItem>) -> Self {
        let mut by_key = HashMap::with_capacity(items.len());
        for item in items {
            if let Some(key) = item.correlation_key() {
                by_key.entry(key).or_insert(item);
            }
        }
        Self { by_key }
    }

    /// Queue entry for the download with correlation key `key`.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&QueueItem> {
        self.by_key.get(&key.to_ascii_lowercase())
    }

    /// Number of indexed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether the queue holds no torrent downloads.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// First fetch per PVR wins for the rest of the run; a failed fetch is
/// remembered as "no queue" and not retried.
#[derive(Debug, Default)]
pub struct QueueCache {
    entries: Mutex<HashMap<String, Option<Arc<QueueIndex>>>>,
}

impl QueueCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue of `pvr`, fetched on first use.
    pub async fn lookup(&self, pvr: &dyn Pvr) -> Option<Arc<QueueIndex>> {
        let mut entries = self.entries.lock().await;
        if let Some(cached) = entries.get(pvr.name()) {
            return cached.clone();
        }
        let fetched = match pvr.queue().await {
            Ok(items) => {
                let index = QueueIndex::new(items);
                debug!(pvr = pvr.name(), entries = index.len(), "fetched queue");
                Some(Arc::new(index))
            }
            Err(err) => {
                warn!(pvr = pvr.name(), error = %err, "queue unavailable; treating as empty for this run");
                None
            }
        };
        entries.insert(pvr.name().to_string(), fetched.clone());
        fetched
    }
}
