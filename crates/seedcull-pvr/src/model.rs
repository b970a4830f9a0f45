//! History and queue records shared by every PVR flavour.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use seedcull_torrent_core::{ClientFamily, TorrentStatus};

/// Supported PVR flavours; they differ only in how history records
/// identify the media item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PvrKind {
    /// Movie manager; one media item per movie.
    Radarr,
    /// Series manager; one media item per episode.
    Sonarr,
}

impl PvrKind {
    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Radarr => "radarr",
            Self::Sonarr => "sonarr",
        }
    }
}

impl Display for PvrKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// History event type as reported by the PVR.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Release sent to the download client.
    #[serde(rename = "grabbed")]
    Grabbed,
    /// Completed download imported into the library.
    #[serde(rename = "downloadFolderImported")]
    Imported,
    /// Download reported as failed.
    #[serde(rename = "downloadFailed")]
    Failed,
    /// Any other event type (renames, deletions, ignored imports).
    #[serde(other)]
    Other,
}

impl EventKind {
    /// Import status an event of this kind implies.
    #[must_use]
    pub const fn status(self) -> TorrentStatus {
        match self {
            Self::Grabbed => TorrentStatus::Grabbed,
            Self::Imported => TorrentStatus::Imported,
            Self::Failed => TorrentStatus::DlFailed,
            Self::Other => TorrentStatus::Unknown,
        }
    }
}

/// Identity of the media item a download targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    /// A movie.
    Movie(u64),
    /// One episode of a series.
    Episode {
        /// Series identifier.
        series: u64,
        /// Episode identifier.
        episode: u64,
    },
}

impl Display for GroupKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie(id) => write!(formatter, "movie:{id}"),
            Self::Episode { series, episode } => {
                write!(formatter, "series:{series}/episode:{episode}")
            }
        }
    }
}

/// One history record, reduced to the fields reconciliation reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEvent {
    /// Event type.
    pub kind: EventKind,
    /// When the PVR recorded the event.
    pub date: DateTime<Utc>,
    /// Download-client family named by the event, verbatim.
    pub download_client: Option<String>,
    /// Correlation id recorded by the PVR (a torrent hash for torrent clients).
    pub download_id: Option<String>,
    /// Release title the event refers to.
    pub source_title: String,
    /// Media item the event belongs to.
    pub group_key: GroupKey,
}

impl HistoryEvent {
    /// Lowercase correlation key, when the event carries one.
    #[must_use]
    pub fn correlation_key(&self) -> Option<String> {
        self.download_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_ascii_lowercase)
    }

    /// Whether the event was produced through a client of `family`.
    ///
    /// Events naming an unrecognised client never match.
    #[must_use]
    pub fn is_from(&self, family: ClientFamily) -> bool {
        self.download_client
            .as_deref()
            .and_then(ClientFamily::parse)
            .is_some_and(|declared| declared == family)
    }
}

/// Entry of the PVR's download queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueItem {
    /// Queue entry identifier used for removal.
    pub id: u64,
    /// Correlation id of the underlying download.
    pub download_id: Option<String>,
    /// Release title.
    pub title: String,
    /// Flattened per-item status messages.
    pub status_messages: Vec<String>,
}

impl QueueItem {
    /// Lowercase correlation key, when present.
    #[must_use]
    pub fn correlation_key(&self) -> Option<String> {
        self.download_id.as_deref().map(str::to_ascii_lowercase)
    }

    /// First status message containing any of `needles`, case-insensitively.
    #[must_use]
    pub fn fatal_message<'a>(&'a self, needles: &[String]) -> Option<&'a str> {
        self.status_messages.iter().map(String::as_str).find(|message| {
            let message = message.to_ascii_lowercase();
            needles
                .iter()
                .any(|needle| message.contains(&needle.to_ascii_lowercase()))
        })
    }
}
