//! Builders for torrents and history events.
//!
//! Relative times are measured from [`anchor`], a fixed instant, so tests
//! that pass the same instant as "now" are deterministic.

use chrono::{DateTime, Duration, TimeZone, Utc};
use seedcull_pvr::{EventKind, GroupKey, HistoryEvent};
use seedcull_torrent_core::{ClientState, Torrent};

/// One gibibyte.
pub const GIB: u64 = 1024 * 1024 * 1024;

/// Fixed reference instant used by the builders.
#[must_use]
pub fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Start a torrent with the given hash, 1 GiB, complete, seeding.
#[must_use]
pub fn torrent(hash: &str) -> TorrentBuilder {
    TorrentBuilder::new(hash)
}

/// Start a history event reported through qBittorrent.
#[must_use]
pub fn event(kind: EventKind, download_id: &str, group_key: GroupKey) -> EventBuilder {
    EventBuilder::new(kind, download_id, group_key)
}

/// Fluent builder for [`Torrent`].
#[derive(Debug, Clone)]
pub struct TorrentBuilder {
    inner: Torrent,
}

impl TorrentBuilder {
    fn new(hash: &str) -> Self {
        Self {
            inner: Torrent {
                hash: hash.to_string(),
                name: format!("release-{hash}"),
                category: "radarr".to_string(),
                size: GIB,
                progress: 1.0,
                ratio: 0.0,
                state: ClientState::StalledUpload,
                added_on: anchor() - Duration::days(10),
                completion_on: Some(anchor() - Duration::days(9)),
                availability: 1.0,
                path: format!("/downloads/release-{hash}"),
                status: None,
                pvr: None,
                download_client_id: None,
            },
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.inner.name = name.to_string();
        self
    }

    /// Set the category.
    #[must_use]
    pub fn category(mut self, category: &str) -> Self {
        self.inner.category = category.to_string();
        self
    }

    /// Set the payload size in bytes.
    #[must_use]
    pub fn size(mut self, size: u64) -> Self {
        self.inner.size = size;
        self
    }

    /// Set the share ratio.
    #[must_use]
    pub fn ratio(mut self, ratio: f64) -> Self {
        self.inner.ratio = ratio;
        self
    }

    /// Set the client state token.
    #[must_use]
    pub fn state(mut self, state: ClientState) -> Self {
        self.inner.state = state;
        self
    }

    /// Mark as incomplete at `progress`; clears the completion time.
    #[must_use]
    pub fn downloading(mut self, progress: f64, state: ClientState) -> Self {
        self.inner.progress = progress;
        self.inner.state = state;
        self.inner.completion_on = None;
        self
    }

    /// Added `days` before the anchor.
    #[must_use]
    pub fn added_days_ago(mut self, days: i64) -> Self {
        self.inner.added_on = anchor() - Duration::days(days);
        self
    }

    /// Completed `hours` before the anchor.
    #[must_use]
    pub fn completed_hours_ago(mut self, hours: i64) -> Self {
        self.inner.completion_on = Some(anchor() - Duration::hours(hours));
        self
    }

    /// Finish the builder.
    #[must_use]
    pub fn build(self) -> Torrent {
        self.inner
    }
}

/// Fluent builder for [`HistoryEvent`].
#[derive(Debug, Clone)]
pub struct EventBuilder {
    inner: HistoryEvent,
}

impl EventBuilder {
    fn new(kind: EventKind, download_id: &str, group_key: GroupKey) -> Self {
        Self {
            inner: HistoryEvent {
                kind,
                date: anchor() - Duration::days(1),
                download_client: Some("qBittorrent".to_string()),
                download_id: Some(download_id.to_string()),
                source_title: format!("release-{}", download_id.to_ascii_lowercase()),
                group_key,
            },
        }
    }

    /// Recorded `hours` before the anchor.
    #[must_use]
    pub fn hours_ago(mut self, hours: i64) -> Self {
        self.inner.date = anchor() - Duration::hours(hours);
        self
    }

    /// Set the release title.
    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.inner.source_title = title.to_string();
        self
    }

    /// Set the declared download client.
    #[must_use]
    pub fn client(mut self, client: Option<&str>) -> Self {
        self.inner.download_client = client.map(str::to_string);
        self
    }

    /// Finish the builder.
    #[must_use]
    pub fn build(self) -> HistoryEvent {
        self.inner
    }
}
