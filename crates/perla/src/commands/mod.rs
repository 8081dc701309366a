//! Command dispatch: bridges CLI args -> coordinator -> output formatting.

pub mod config_cmd;
pub mod diagnostics;
pub mod setup;
pub mod status;
pub mod util;
pub mod watch;

use perla_core::Coordinator;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an appliance-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &Coordinator,
    entry_name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => status::handle(coordinator, entry_name, &args, global).await,
        Command::Watch(args) => watch::handle(coordinator, entry_name, &args, global).await,
        Command::Diagnostics => diagnostics::handle(coordinator, global).await,
        // Setup, Config and Completions are handled before dispatch
        Command::Setup(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
