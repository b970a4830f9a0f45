//! Core torrent domain types shared across the workspace.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Download-client families a PVR may declare in its history records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClientFamily {
    /// qBittorrent WebUI.
    Qbittorrent,
    /// Transmission RPC.
    Transmission,
    /// Deluge.
    Deluge,
    /// rTorrent / ruTorrent.
    Rtorrent,
}

impl ClientFamily {
    /// Lowercase identifier used in configuration and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Qbittorrent => "qbittorrent",
            Self::Transmission => "transmission",
            Self::Deluge => "deluge",
            Self::Rtorrent => "rtorrent",
        }
    }

    /// Parse a declared family, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for anything unrecognised so callers never match a
    /// record against a client they do not know.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "qbittorrent" => Some(Self::Qbittorrent),
            "transmission" => Some(Self::Transmission),
            "deluge" => Some(Self::Deluge),
            "rtorrent" | "rutorrent" => Some(Self::Rtorrent),
            _ => None,
        }
    }
}

impl Display for ClientFamily {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Raw lifecycle token reported by the download client.
///
/// The variants mirror qBittorrent's `state` values; the 5.x `stopped*`
/// spellings are accepted as aliases of the paused states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// Actively downloading.
    #[serde(rename = "downloading")]
    Downloading,
    /// Downloading but no peer is sending data.
    #[serde(rename = "stalledDL")]
    StalledDownload,
    /// Fetching metadata for a magnet link.
    #[serde(rename = "metaDL")]
    FetchingMetadata,
    /// Fetching metadata while ignoring queue limits.
    #[serde(rename = "forcedMetaDL")]
    ForcedFetchingMetadata,
    /// Downloading while ignoring queue limits.
    #[serde(rename = "forcedDL")]
    ForcedDownload,
    /// Waiting for a download slot.
    #[serde(rename = "queuedDL")]
    QueuedDownload,
    /// Rechecking an incomplete payload.
    #[serde(rename = "checkingDL")]
    CheckingDownload,
    /// Preallocating disk space.
    #[serde(rename = "allocating")]
    Allocating,
    /// Incomplete and paused by the user or by this tool.
    #[serde(rename = "pausedDL", alias = "stoppedDL")]
    PausedDownload,
    /// Seeding with active peers.
    #[serde(rename = "uploading")]
    Uploading,
    /// Seeding without connected peers.
    #[serde(rename = "stalledUP")]
    StalledUpload,
    /// Seeding while ignoring queue limits.
    #[serde(rename = "forcedUP")]
    ForcedUpload,
    /// Waiting for a seeding slot.
    #[serde(rename = "queuedUP")]
    QueuedUpload,
    /// Rechecking a complete payload.
    #[serde(rename = "checkingUP")]
    CheckingUpload,
    /// Complete and paused.
    #[serde(rename = "pausedUP", alias = "stoppedUP")]
    PausedUpload,
    /// Loading resume data at startup.
    #[serde(rename = "checkingResumeData")]
    CheckingResumeData,
    /// Payload is being moved.
    #[serde(rename = "moving")]
    Moving,
    /// Payload files are missing on disk.
    #[serde(rename = "missingFiles")]
    MissingFiles,
    /// Client reported an error for this torrent.
    #[serde(rename = "error")]
    Error,
    /// Token not known to this build.
    #[serde(rename = "unknown")]
    #[serde(other)]
    Unknown,
}

impl ClientState {
    /// Stalled or still resolving metadata: the download phase is not moving.
    #[must_use]
    pub const fn is_stalled(self) -> bool {
        matches!(
            self,
            Self::StalledDownload | Self::FetchingMetadata | Self::ForcedFetchingMetadata
        )
    }

    /// Any download-phase state, paused or not.
    #[must_use]
    pub const fn is_downloading(self) -> bool {
        matches!(
            self,
            Self::Downloading
                | Self::StalledDownload
                | Self::FetchingMetadata
                | Self::ForcedFetchingMetadata
                | Self::ForcedDownload
                | Self::QueuedDownload
                | Self::CheckingDownload
                | Self::Allocating
                | Self::PausedDownload
        )
    }

    /// Whether the client is currently allowed to transfer this torrent.
    #[must_use]
    pub const fn is_running(self) -> bool {
        !matches!(self, Self::PausedDownload | Self::PausedUpload)
    }

    /// Wire token as reported by qBittorrent.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Downloading => "downloading",
            Self::StalledDownload => "stalledDL",
            Self::FetchingMetadata => "metaDL",
            Self::ForcedFetchingMetadata => "forcedMetaDL",
            Self::ForcedDownload => "forcedDL",
            Self::QueuedDownload => "queuedDL",
            Self::CheckingDownload => "checkingDL",
            Self::Allocating => "allocating",
            Self::PausedDownload => "pausedDL",
            Self::Uploading => "uploading",
            Self::StalledUpload => "stalledUP",
            Self::ForcedUpload => "forcedUP",
            Self::QueuedUpload => "queuedUP",
            Self::CheckingUpload => "checkingUP",
            Self::PausedUpload => "pausedUP",
            Self::CheckingResumeData => "checkingResumeData",
            Self::Moving => "moving",
            Self::MissingFiles => "missingFiles",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for ClientState {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let state = match value {
            "downloading" => Self::Downloading,
            "stalledDL" => Self::StalledDownload,
            "metaDL" => Self::FetchingMetadata,
            "forcedMetaDL" => Self::ForcedFetchingMetadata,
            "forcedDL" => Self::ForcedDownload,
            "queuedDL" => Self::QueuedDownload,
            "checkingDL" => Self::CheckingDownload,
            "allocating" => Self::Allocating,
            "pausedDL" | "stoppedDL" => Self::PausedDownload,
            "uploading" => Self::Uploading,
            "stalledUP" => Self::StalledUpload,
            "forcedUP" => Self::ForcedUpload,
            "queuedUP" => Self::QueuedUpload,
            "checkingUP" => Self::CheckingUpload,
            "pausedUP" | "stoppedUP" => Self::PausedUpload,
            "checkingResumeData" => Self::CheckingResumeData,
            "moving" => Self::Moving,
            "missingFiles" => Self::MissingFiles,
            "error" => Self::Error,
            _ => Self::Unknown,
        };
        Ok(state)
    }
}

impl Display for ClientState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.token())
    }
}

/// Import status derived for a torrent from its category binding and PVR history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TorrentStatus {
    /// Category has no configured binding.
    UnknownCat,
    /// Category is intentionally unmanaged.
    NoPvr,
    /// The PVR imported this download (or the category is pre-trusted).
    Imported,
    /// The PVR grabbed this download but has not imported it.
    Grabbed,
    /// The PVR recorded the download as failed.
    DlFailed,
    /// No usable evidence was found.
    Unknown,
}

impl TorrentStatus {
    /// Snake-case label used in logs and rendered output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownCat => "unknown_cat",
            Self::NoPvr => "no_pvr",
            Self::Imported => "imported",
            Self::Grabbed => "grabbed",
            Self::DlFailed => "dl_failed",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for TorrentStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Telemetry snapshot of one torrent plus the fields assigned during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Torrent {
    /// Info hash as reported by the client.
    pub hash: String,
    /// Display name.
    pub name: String,
    /// Client category, used to bind the torrent to a PVR.
    pub category: String,
    /// Total selected payload size in bytes.
    pub size: u64,
    /// Completion fraction in `0.0..=1.0`.
    pub progress: f64,
    /// Share ratio, clamped to be non-negative.
    pub ratio: f64,
    /// Lifecycle token reported by the client.
    pub state: ClientState,
    /// When the torrent was added to the client.
    pub added_on: DateTime<Utc>,
    /// When the download completed; only meaningful once `progress >= 1.0`.
    pub completion_on: Option<DateTime<Utc>>,
    /// Fraction of the piece set reachable from connected peers.
    pub availability: f64,
    /// Content path on disk.
    pub path: String,
    /// Import status assigned by the status assigner.
    #[serde(default)]
    pub status: Option<TorrentStatus>,
    /// Name of the PVR that owns this torrent, once matched.
    #[serde(default)]
    pub pvr: Option<String>,
    /// Correlation id the PVR recorded for this download.
    #[serde(default)]
    pub download_client_id: Option<String>,
}

impl Torrent {
    /// Correlation key: the info hash in lowercase.
    #[must_use]
    pub fn key(&self) -> String {
        self.hash.to_ascii_lowercase()
    }

    /// Whether every selected piece has been fetched.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    /// Bytes already fetched, derived from size and progress.
    #[must_use]
    pub fn downloaded_bytes(&self) -> u64 {
        scale(self.size, self.progress.clamp(0.0, 1.0))
    }

    /// Bytes still to fetch before the download completes.
    #[must_use]
    pub fn remaining_bytes(&self) -> u64 {
        self.size.saturating_sub(self.downloaded_bytes())
    }

    /// Share ratio with client-reported negatives clamped to zero.
    #[must_use]
    pub fn effective_ratio(&self) -> f64 {
        self.ratio.max(0.0)
    }
}

/// Global transfer caps applied to the download client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TorrentRateLimit {
    /// Maximum download rate in bytes per second; `None` leaves it untouched.
    pub download_bps: Option<u64>,
    /// Maximum upload rate in bytes per second; `None` leaves it untouched.
    pub upload_bps: Option<u64>,
}

impl TorrentRateLimit {
    /// Whether neither direction carries a value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.download_bps.is_none() && self.upload_bps.is_none()
    }
}

/// Render a byte count with IEC units (`1.50 GiB`).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = to_f64(bytes);
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.2} {unit}")
}

pub(crate) const fn to_f64(value: u64) -> f64 {
    #[expect(
        clippy::cast_precision_loss,
        reason = "byte counts are reported with two decimals"
    )]
    {
        value as f64
    }
}

fn scale(bytes: u64, fraction: f64) -> u64 {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "fraction is clamped to 0..=1 so the product fits in u64"
    )]
    {
        (to_f64(bytes) * fraction).round() as u64
    }
}
