use chrono::Utc;
use seedcull_config::Settings;

use crate::cli::OutputFormat;
use crate::client::{CliResult, Connected, connect, engine_failure};
use crate::output::render_snapshots;

pub(crate) async fn handle_status(settings: Settings, format: OutputFormat) -> CliResult<()> {
    let engine = match connect(settings).await? {
        Connected::Ready(engine) => engine,
        Connected::Unavailable => return Ok(()),
    };
    match engine.inspect(Utc::now()).await {
        Ok(snapshots) => render_snapshots(&snapshots, format),
        Err(err) => engine_failure(err),
    }
}
