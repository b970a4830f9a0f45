#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, unreachable_pub)]
#![allow(clippy::module_name_repetitions)]

//! Media-library manager ("PVR") history and queue access.
//!
//! Layout: `model.rs` (history events, group keys, queue items),
//! `service.rs` (`Pvr` trait), `client.rs` (Radarr/Sonarr v3 HTTP client),
//! `error.rs` (`PvrError`).

pub mod client;
pub mod error;
pub mod model;
pub mod service;

pub use client::PvrClient;
pub use error::{PvrError, PvrResult};
pub use model::{EventKind, GroupKey, HistoryEvent, PvrKind, QueueItem};
pub use service::{EventStream, Pvr};
