#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, unreachable_pub)]
#![allow(clippy::module_name_repetitions)]

//! qBittorrent WebUI API v2 adapter for the `DownloadClient` seam.
//!
//! Layout: `client.rs` (session handling and endpoint calls), `wire.rs`
//! (response shapes and their mapping onto `Torrent`).

mod client;
mod wire;

pub use client::QbClient;
