use seedcull_config::Settings;
use tracing::info;

use crate::cli::OutputFormat;
use crate::client::{CliResult, Connected, connect, engine_failure};
use crate::output::render_run_report;

pub(crate) async fn handle_run(settings: Settings, format: OutputFormat) -> CliResult<()> {
    let engine = match connect(settings).await? {
        Connected::Ready(engine) => engine,
        Connected::Unavailable => return Ok(()),
    };
    if engine.settings().dry_run {
        info!("dry run: no torrent will be changed");
    }
    match engine.run().await {
        Ok(report) => render_run_report(&report, format),
        Err(err) => engine_failure(err),
    }
}
