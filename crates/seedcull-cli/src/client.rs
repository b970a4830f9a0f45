//! Error types, exit codes and construction of the engine's collaborators.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use seedcull_config::Settings;
use seedcull_engine::{Engine, EngineError, PvrRegistry};
use seedcull_pvr::{Pvr, PvrClient};
use seedcull_qbittorrent::QbClient;
use seedcull_torrent_core::TorrentError;
use tracing::{debug, warn};

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Outcome of wiring the engine: the download client may be down, which
/// ends the run quietly.
pub(crate) enum Connected {
    Ready(Engine),
    Unavailable,
}

/// Connect to the download client and build one PVR client per entry.
pub(crate) async fn connect(settings: Settings) -> CliResult<Connected> {
    let pvrs = build_pvrs(&settings)?;
    let redacted = settings.client.redacted_url();
    let connecting = QbClient::connect(settings.client.url.as_str(), settings.client.connect_timeout);
    let client = match connecting.await {
        Ok(client) => client,
        Err(err @ TorrentError::Unavailable { .. }) => {
            warn!(
                url = %redacted,
                error = %error_chain(&err),
                "download client unreachable; nothing to do"
            );
            return Ok(Connected::Unavailable);
        }
        Err(err) => {
            return Err(CliError::failure(
                anyhow::Error::new(err).context(format!("connecting to {redacted}")),
            ));
        }
    };
    debug!(pvrs = pvrs.len(), "pvr clients ready");
    Ok(Connected::Ready(Engine::new(
        Arc::new(client),
        pvrs,
        settings.engine,
    )))
}

fn build_pvrs(settings: &Settings) -> CliResult<PvrRegistry> {
    settings
        .pvrs
        .iter()
        .map(|pvr| {
            let client = PvrClient::new(
                pvr.name.clone(),
                pvr.kind,
                pvr.url.as_str(),
                pvr.api_key.clone(),
            )
            .map_err(|err| {
                CliError::failure(anyhow::Error::new(err).context(format!("pvr {}", pvr.name)))
            })?;
            Ok((pvr.name.clone(), Arc::new(client) as Arc<dyn Pvr>))
        })
        .collect()
}

/// Map an engine failure, treating an unreachable client as a clean stop.
pub(crate) fn engine_failure(err: EngineError) -> CliResult<()> {
    if err.is_unavailable() {
        warn!(error = %error_chain(&err), "download client became unreachable; stopping");
        return Ok(());
    }
    Err(CliError::failure(err))
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::io;

    #[test]
    fn exit_codes_follow_the_error_kind() {
        let validation = CliError::validation("bad config");
        assert_eq!(validation.exit_code(), 2);
        assert_eq!(validation.display_message(), "bad config");

        let failure = CliError::failure(anyhow!("boom").context("listing torrents"));
        assert_eq!(failure.exit_code(), 3);
        assert_eq!(failure.display_message(), "listing torrents: boom");
    }

    #[test]
    fn unavailable_engine_error_is_not_a_failure() {
        let err = EngineError::Client {
            operation: "torrents.list",
            source: TorrentError::unavailable(io::Error::other("connection refused")),
        };
        assert!(engine_failure(err).is_ok());

        let err = EngineError::Client {
            operation: "torrents.list",
            source: TorrentError::Status {
                operation: "torrents.list",
                status: 500,
            },
        };
        let mapped = engine_failure(err).expect_err("status errors fail the run");
        assert_eq!(mapped.exit_code(), 3);
    }

    #[test]
    fn error_chain_includes_sources() {
        let err = TorrentError::unavailable(io::Error::other("refused"));
        assert_eq!(error_chain(&err), "download client unavailable: refused");
    }
}
