#![forbid(unsafe_code)]
#![deny(
    unused_imports,
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (torrent and history builders), mocks.rs (recording download client, static PVR).

pub mod fixtures;
pub mod mocks;

pub use fixtures::{EventBuilder, GIB, TorrentBuilder, anchor, event, torrent};
pub use mocks::{RecordingClient, StaticPvr};
