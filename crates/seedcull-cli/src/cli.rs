//! Argument parsing and command dispatch.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use seedcull_config::{ConfigLoader, Overrides};
use seedcull_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, init_logging};
use tracing::debug;

use crate::client::{CliError, CliResult};
use crate::commands::{handle_run, handle_status};

/// Parse the process arguments, execute the command and return the exit code.
pub async fn run() -> i32 {
    run_with_args(env::args_os()).await
}

/// Same as [`run`] with explicit arguments; the first item is the binary name.
pub async fn run_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let exit_code = if err.use_stderr() { 2 } else { 0 };
            let _ = err.print();
            return exit_code;
        }
    };

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.map_or_else(LogFormat::infer, LogFormat::from),
        version: env!("CARGO_PKG_VERSION"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: logging not initialised: {err}");
    }

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let dry_run = matches!(&cli.command, Command::Run(args) if args.dry_run);
    let loader = cli.loader(dry_run);
    let settings = loader
        .load()
        .map_err(|err| CliError::validation(err.describe()))?;
    let command = cli.command.label();
    let context = GlobalContextGuard::new(command, settings.engine.dry_run);
    debug!(run_id = %context.run_id(), "configuration loaded");

    match cli.command {
        Command::Run(args) => handle_run(settings, args.output).await,
        Command::Status(args) => handle_status(settings, args.output).await,
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "seedcull",
    version,
    about = "Prune and throttle download-client torrents using PVR import history"
)]
pub(crate) struct Cli {
    /// YAML configuration file; `./seedcull.yaml` is used when present.
    #[arg(long, global = true, env = "SEEDCULL_CONFIG")]
    pub(crate) config: Option<PathBuf>,
    /// Download-client WebUI URL, credentials in the userinfo part.
    #[arg(long, global = true, env = "SEEDCULL_QBT_URL")]
    pub(crate) qbt_url: Option<String>,
    /// Upper bound on bytes held by the client.
    #[arg(long, global = true, env = "SEEDCULL_QUOTA_BYTES")]
    pub(crate) quota_bytes: Option<u64>,
    /// Log line format; defaults to pretty in debug builds and JSON otherwise.
    #[arg(long, global = true, value_enum)]
    pub(crate) log_format: Option<LogFormatArg>,
    /// Filter directive used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = seedcull_telemetry::DEFAULT_LOG_LEVEL)]
    pub(crate) log_level: String,
    #[command(subcommand)]
    pub(crate) command: Command,
}

impl Cli {
    fn loader(&self, dry_run: bool) -> ConfigLoader {
        let overrides = Overrides {
            client_url: self.qbt_url.clone(),
            dry_run,
            max_used_bytes: self.quota_bytes,
        };
        let loader = ConfigLoader::new().with_overrides(overrides);
        match &self.config {
            Some(path) => loader.with_path(path),
            None => loader,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Assign statuses, clean up and rebalance downloads.
    Run(RunArgs),
    /// Show assigned statuses and scores without changing anything.
    Status(StatusArgs),
}

impl Command {
    const fn label(&self) -> &'static str {
        match self {
            Self::Run(_) => "run",
            Self::Status(_) => "status",
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    /// Log and report actions without performing them.
    #[arg(
        long,
        env = "SEEDCULL_DRY_RUN",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub(crate) dry_run: bool,
    #[arg(long = "output", value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) output: OutputFormat,
}

#[derive(Debug, Args)]
pub(crate) struct StatusArgs {
    #[arg(long = "output", value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub(crate) enum LogFormatArg {
    Json,
    Pretty,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Json => Self::Json,
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn run_accepts_dry_run_and_output() {
        let cli = parse(&["seedcull", "run", "--dry-run", "--output", "json"]);
        match cli.command {
            Command::Run(args) => {
                assert!(args.dry_run);
                assert_eq!(args.output, OutputFormat::Json);
            }
            Command::Status(_) => panic!("expected run"),
        }
    }

    #[test]
    fn global_flags_feed_the_overrides() {
        let cli = parse(&["seedcull", "status", "--config", "/etc/seedcull.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/seedcull.yaml")));

        let cli = parse(&[
            "seedcull",
            "status",
            "--qbt-url",
            "http://127.0.0.1:8080",
            "--quota-bytes",
            "1024",
            "--log-format",
            "compact",
        ]);
        assert_eq!(cli.log_format, Some(LogFormatArg::Compact));
        assert_eq!(cli.log_level, "info");
        assert_eq!(cli.command.label(), "status");

        let document = cli.loader(false).document().expect("document");
        assert_eq!(
            document.download_client.url.as_deref(),
            Some("http://127.0.0.1:8080")
        );
        assert_eq!(document.quota.max_used_bytes, Some(1024));
        assert!(!document.dry_run);
    }

    #[test]
    fn output_defaults_to_table() {
        let cli = parse(&["seedcull", "status"]);
        match cli.command {
            Command::Status(args) => assert_eq!(args.output, OutputFormat::Table),
            Command::Run(_) => panic!("expected status"),
        }
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        let err = Cli::try_parse_from(["seedcull", "purge"]).expect_err("should fail");
        assert!(err.use_stderr());
    }

    #[test]
    fn quota_must_be_a_number() {
        assert!(Cli::try_parse_from(["seedcull", "run", "--quota-bytes", "lots"]).is_err());
    }
}
