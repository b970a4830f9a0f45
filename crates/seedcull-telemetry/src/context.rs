//! Process-wide span carrying the run identity.

use tracing::{Span, span::Entered};
use uuid::Uuid;

use crate::init::build_version;

/// Keeps the `run` span entered for the lifetime of the process, so every
/// log line carries the command, a run id and the dry-run flag.
pub struct GlobalContextGuard {
    run_id: Uuid,
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter a fresh `run` span for `command`.
    #[must_use]
    pub fn new(command: &str, dry_run: bool) -> Self {
        let run_id = Uuid::new_v4();
        let span: &'static Span = Box::leak(Box::new(tracing::info_span!(
            "run",
            command = %command,
            run_id = %run_id,
            dry_run,
            version = %build_version(),
        )));
        Self {
            run_id,
            _guard: span.enter(),
        }
    }

    /// Identifier recorded on the span.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }
}
