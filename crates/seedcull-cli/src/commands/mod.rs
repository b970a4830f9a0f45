//! Command handlers.

mod run;
mod status;

pub(crate) use run::handle_run;
pub(crate) use status::handle_status;
