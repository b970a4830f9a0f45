//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;

use anyhow::anyhow;
use seedcull_engine::{Decision, FailReason, RunReport, SkipReason, TorrentSnapshot};
use seedcull_torrent_core::{TorrentStatus, format_bytes};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

const HASH_PREFIX: usize = 8;

pub(crate) fn render_run_report(report: &RunReport, format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(report)?,
        OutputFormat::Table => run_report_table(report),
    };
    println!("{text}");
    Ok(())
}

pub(crate) fn render_snapshots(snapshots: &[TorrentSnapshot], format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(snapshots)?,
        OutputFormat::Table => snapshot_table(snapshots),
    };
    println!("{text}");
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

fn run_report_table(report: &RunReport) -> String {
    let mut out = String::new();
    let clean = &report.clean;
    let _ = writeln!(
        out,
        "{:<8} {:<16} {:<10} {:<18} NAME",
        "HASH", "CATEGORY", "STATUS", "DECISION"
    );
    for entry in &clean.decisions {
        let _ = writeln!(
            out,
            "{:<8} {:<16} {:<10} {:<18} {}",
            hash_prefix(&entry.hash),
            entry.category,
            status_label(entry.status),
            decision_label(&entry.decision),
            entry.name
        );
        if let Some(error) = &entry.error {
            let _ = writeln!(out, "         error: {error}");
        }
    }
    let _ = write!(
        out,
        "freed: {}  deleted: {}  failed: {}  errors: {}",
        format_bytes(clean.freed_bytes),
        clean.deleted,
        clean.failed,
        clean.errors
    );
    if let Some(resumes) = &report.resumes {
        let _ = write!(
            out,
            "  paused: {}  resumed: {}",
            resumes.paused.len(),
            resumes.resumed.len()
        );
    }
    if !report.assign.failed_pvrs.is_empty() {
        let _ = write!(out, "\nunreachable pvrs: {}", report.assign.failed_pvrs.join(", "));
    }
    if report.dry_run {
        out.push_str("\ndry run: no changes were made");
    }
    out
}

fn snapshot_table(snapshots: &[TorrentSnapshot]) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{:<8} {:<16} {:<10} {:>7} {:>7} {:>7} {:>7} NAME",
        "HASH", "CATEGORY", "STATUS", "PROG", "RATIO", "HEALTH", "SEEDING"
    );
    for snapshot in snapshots {
        let torrent = &snapshot.torrent;
        let progress = format!("{:.1}%", torrent.progress * 100.0);
        let ratio = format!("{:.2}", torrent.effective_ratio());
        let _ = write!(
            out,
            "\n{:<8} {:<16} {:<10} {:>7} {:>7} {:>7} {:>7} {}",
            hash_prefix(&torrent.hash),
            torrent.category,
            status_label(torrent.status),
            progress,
            ratio,
            snapshot.stats.health.to_string(),
            snapshot.stats.seeding.to_string(),
            torrent.name
        );
    }
    out
}

fn hash_prefix(hash: &str) -> &str {
    hash.get(..HASH_PREFIX).unwrap_or(hash)
}

fn status_label(status: Option<TorrentStatus>) -> &'static str {
    status.map_or("-", TorrentStatus::as_str)
}

fn decision_label(decision: &Decision) -> String {
    match decision {
        Decision::Skip { reason } => format!("skip:{}", skip_label(*reason)),
        Decision::Delete => "delete".to_string(),
        Decision::MarkFailed {
            reason: FailReason::QueueMessage(_),
            ..
        } => "fail:queue".to_string(),
        Decision::MarkFailed {
            reason: FailReason::Unhealthy,
            ..
        } => "fail:unhealthy".to_string(),
        Decision::Unhandled { .. } => "unhandled".to_string(),
    }
}

const fn skip_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::UnknownCategory => "unknown_category",
        SkipReason::Unmanaged => "unmanaged",
        SkipReason::Downloading => "downloading",
        SkipReason::Seeding => "seeding",
        SkipReason::NoQuotaPressure => "no_pressure",
    }
}
