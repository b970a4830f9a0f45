//! Configuration document as written on disk, and the settings it
//! validates into.

use std::collections::BTreeMap;
use std::time::Duration;

use seedcull_engine::EngineSettings;
use seedcull_pvr::PvrKind;
use seedcull_torrent_core::ClientFamily;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults;

/// Root of the YAML document. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigDocument {
    /// Download-client connection.
    pub download_client: DownloadClientSection,
    /// PVRs consulted for import history.
    pub pvrs: Vec<PvrSection>,
    /// Category name to `none`, `imported`, or a PVR name.
    pub categories: BTreeMap<String, String>,
    /// Health and seeding tunables.
    pub seeding: SeedingSection,
    /// Storage ceiling and optimizer floor.
    pub quota: QuotaSection,
    /// Global transfer caps applied before each run.
    pub speed_limits: Option<SpeedLimitSection>,
    /// Queue status messages that fail a download; defaults apply when absent.
    pub fatal_queue_messages: Option<Vec<String>>,
    /// Log mutating calls instead of issuing them.
    pub dry_run: bool,
}

/// `download_client` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadClientSection {
    /// WebUI base URL; credentials go in the userinfo part.
    pub url: Option<String>,
    /// Upper bound on the connect and login handshake.
    pub connect_timeout_secs: u64,
    /// Client family named in PVR history records.
    pub family: String,
}

impl Default for DownloadClientSection {
    fn default() -> Self {
        Self {
            url: None,
            connect_timeout_secs: defaults::CONNECT_TIMEOUT_SECS,
            family: defaults::CLIENT_FAMILY.to_string(),
        }
    }
}

/// One entry of the `pvrs` list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PvrSection {
    /// Name categories bind to.
    pub name: String,
    /// Radarr or Sonarr.
    pub kind: PvrKind,
    /// API base URL.
    pub url: String,
    /// Value of the `X-Api-Key` header.
    pub api_key: String,
}

/// `seeding` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SeedingSection {
    /// Ratio a payload of `min_seed_max_size` bytes must reach.
    pub min_seed_ratio: f64,
    /// Reference payload size in bytes.
    pub min_seed_max_size: u64,
    /// Seed time after which a torrent is ok regardless of ratio.
    pub seed_time_limit_secs: u64,
    /// Time a stalled download is tolerated before losing health.
    pub dl_grace_secs: u64,
    /// Time over which a stalled download loses one unit of health.
    pub dl_time_limit_secs: u64,
}

impl Default for SeedingSection {
    fn default() -> Self {
        Self {
            min_seed_ratio: defaults::MIN_SEED_RATIO,
            min_seed_max_size: defaults::MIN_SEED_MAX_SIZE,
            seed_time_limit_secs: defaults::SEED_TIME_LIMIT_SECS,
            dl_grace_secs: defaults::DL_GRACE_SECS,
            dl_time_limit_secs: defaults::DL_TIME_LIMIT_SECS,
        }
    }
}

/// `quota` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct QuotaSection {
    /// Storage ceiling; absent means always under pressure.
    pub max_used_bytes: Option<u64>,
    /// Downloads kept resumed regardless of budget.
    pub min_active_downloads: usize,
}

impl Default for QuotaSection {
    fn default() -> Self {
        Self {
            max_used_bytes: None,
            min_active_downloads: defaults::MIN_ACTIVE_DOWNLOADS,
        }
    }
}

/// `speed_limits` section, in bytes per second; `0` is unlimited.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SpeedLimitSection {
    /// Upload cap; absent leaves the client's value untouched.
    pub upload_bps: Option<u64>,
    /// Download cap; absent leaves the client's value untouched.
    pub download_bps: Option<u64>,
}

/// Validated download-client connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// WebUI base URL, possibly carrying credentials.
    pub url: Url,
    /// Upper bound on the connect and login handshake.
    pub connect_timeout: Duration,
    /// Family PVR history records must name.
    pub family: ClientFamily,
}

impl ClientSettings {
    /// URL safe to log: the password is masked.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let mut url = self.url.clone();
        if url.password().is_some() {
            // Only fails for cannot-be-a-base URLs, which validation rejects.
            let _ = url.set_password(Some("***"));
        }
        url.to_string()
    }
}

/// Validated PVR connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvrSettings {
    /// Name categories bind to.
    pub name: String,
    /// Radarr or Sonarr.
    pub kind: PvrKind,
    /// API base URL.
    pub url: Url,
    /// Value of the `X-Api-Key` header.
    pub api_key: String,
}

/// Everything a run needs, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Download-client connection.
    pub client: ClientSettings,
    /// PVR connections in declaration order.
    pub pvrs: Vec<PvrSettings>,
    /// Engine tunables.
    pub engine: EngineSettings,
}
