//! Response shapes returned by the WebUI API.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use seedcull_torrent_core::{ClientState, Torrent};

/// One entry of `GET /api/v2/torrents/info`.
#[derive(Debug, Deserialize)]
pub(crate) struct TorrentInfo {
    hash: String,
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    progress: f64,
    #[serde(default)]
    ratio: f64,
    state: ClientState,
    #[serde(default)]
    added_on: i64,
    #[serde(default)]
    completion_on: i64,
    #[serde(default)]
    availability: f64,
    #[serde(default)]
    content_path: Option<String>,
    #[serde(default)]
    save_path: String,
}

impl TorrentInfo {
    pub(crate) fn into_torrent(self) -> Torrent {
        Torrent {
            hash: self.hash,
            name: self.name,
            category: self.category,
            size: u64::try_from(self.size).unwrap_or(0),
            progress: self.progress.clamp(0.0, 1.0),
            ratio: self.ratio.max(0.0),
            state: self.state,
            added_on: timestamp(self.added_on).unwrap_or(DateTime::UNIX_EPOCH),
            completion_on: timestamp(self.completion_on),
            availability: self.availability.max(0.0),
            path: self
                .content_path
                .filter(|path| !path.is_empty())
                .unwrap_or(self.save_path),
            status: None,
            pvr: None,
            download_client_id: None,
        }
    }
}

/// Subset of `GET /api/v2/sync/maindata`.
#[derive(Debug, Deserialize)]
pub(crate) struct MainData {
    #[serde(default)]
    pub(crate) server_state: Option<ServerState>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServerState {
    #[serde(default)]
    pub(crate) free_space_on_disk: Option<i64>,
}

fn timestamp(seconds: i64) -> Option<DateTime<Utc>> {
    (seconds > 0)
        .then(|| DateTime::from_timestamp(seconds, 0))
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_info_entry_onto_torrent() {
        let info: TorrentInfo = serde_json::from_value(json!({
            "hash": "ABCDEF",
            "name": "Movie.2020.1080p",
            "category": "radarr",
            "size": 1_073_741_824_i64,
            "progress": 1.0,
            "ratio": -1.0,
            "state": "stalledUP",
            "added_on": 1_700_000_000_i64,
            "completion_on": -1,
            "availability": -1,
            "content_path": "/data/Movie.2020.1080p",
            "save_path": "/data"
        }))
        .expect("info decodes");
        let torrent = info.into_torrent();
        assert_eq!(torrent.key(), "abcdef");
        assert_eq!(torrent.state, ClientState::StalledUpload);
        assert!(torrent.ratio.abs() < f64::EPSILON, "negative ratio clamps to zero");
        assert_eq!(torrent.completion_on, None);
        assert_eq!(torrent.added_on.timestamp(), 1_700_000_000);
        assert_eq!(torrent.path, "/data/Movie.2020.1080p");
        assert!(torrent.status.is_none());
    }

    #[test]
    fn unknown_state_tokens_are_tolerated() {
        let info: TorrentInfo = serde_json::from_value(json!({
            "hash": "01",
            "name": "x",
            "state": "someFutureState",
            "save_path": "/data"
        }))
        .expect("info decodes");
        let torrent = info.into_torrent();
        assert_eq!(torrent.state, ClientState::Unknown);
        assert_eq!(torrent.path, "/data");
        assert_eq!(torrent.added_on, DateTime::UNIX_EPOCH);
    }
}
