#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, unreachable_pub)]
#![allow(clippy::module_name_repetitions, clippy::redundant_pub_crate)]

//! Command-line entry point for seedcull.
//!
//! Layout:
//! - `cli.rs`: argument parsing and command dispatch
//! - `commands/`: `run` and `status` handlers
//! - `client.rs`: errors, exit codes, and collaborator wiring
//! - `output.rs`: table and JSON renderers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod output;

pub use cli::{run, run_with_args};
