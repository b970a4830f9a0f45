#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, unreachable_pub)]
#![allow(clippy::module_name_repetitions)]

//! YAML configuration for seedcull.
//!
//! Layout: `model.rs` (document sections and validated settings),
//! `loader.rs` (file discovery, parsing, overrides), `validate.rs`
//! (document to settings), `defaults.rs` (named defaults), `error.rs`
//! (`ConfigError`).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Overrides};
pub use model::{
    ClientSettings, ConfigDocument, DownloadClientSection, PvrSection, PvrSettings, QuotaSection,
    SeedingSection, Settings, SpeedLimitSection,
};
pub use validate::validate;
