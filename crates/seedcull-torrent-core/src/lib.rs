#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, unreachable_pub)]
#![allow(clippy::module_name_repetitions)]

//! Client-agnostic torrent records, scoring, and the download-client seam.
//!
//! Layout: `model/` (torrent record, client state tokens, import status),
//! `score.rs` (`Score`), `stats.rs` (`SeedStats` health/seeding scoring),
//! `service/` (`DownloadClient` trait), `error.rs` (`TorrentError`).

pub mod error;
pub mod model;
pub mod score;
pub mod service;
pub mod stats;

pub use error::{TorrentError, TorrentResult};
pub use model::{
    ClientFamily, ClientState, Torrent, TorrentRateLimit, TorrentStatus, format_bytes,
};
pub use score::Score;
pub use service::DownloadClient;
pub use stats::{SeedLimits, SeedStats};
