//! Named defaults for every optional setting.
//!
//! The seeding defaults match [`seedcull_torrent_core::SeedLimits::default`].

/// File looked up in the working directory when no path is given.
pub const CONFIG_FILE: &str = "seedcull.yaml";
/// Upper bound on the whole download-client handshake.
pub const CONNECT_TIMEOUT_SECS: u64 = 2;
/// Download-client family assumed when none is configured.
pub const CLIENT_FAMILY: &str = "qbittorrent";
/// Ratio a 15 GiB payload must reach.
pub const MIN_SEED_RATIO: f64 = 10.0;
/// Reference payload size for [`MIN_SEED_RATIO`].
pub const MIN_SEED_MAX_SIZE: u64 = 15 * 1024 * 1024 * 1024;
/// Seed time that makes any torrent ok: 4 days.
pub const SEED_TIME_LIMIT_SECS: u64 = 4 * 86_400;
/// Grace before a stalled download loses health: 1 day.
pub const DL_GRACE_SECS: u64 = 86_400;
/// Time over which a stalled download loses one unit of health: 2 days.
pub const DL_TIME_LIMIT_SECS: u64 = 2 * 86_400;
/// Downloads kept resumed regardless of budget.
pub const MIN_ACTIVE_DOWNLOADS: usize = 1;
/// Category binding value for unmanaged categories.
pub const BINDING_NONE: &str = "none";
/// Category binding value for pre-trusted categories.
pub const BINDING_IMPORTED: &str = "imported";

/// Queue status messages that fail a download.
#[must_use]
pub fn fatal_queue_messages() -> Vec<String> {
    vec!["unable to parse file".to_string()]
}
