//! `perla diagnostics`: one refresh, then a redacted report.

use perla_core::{Coordinator, diagnostics};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Always succeeds once the report is built: an unreachable appliance is
/// part of what the report describes.
pub async fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let outcome = coordinator.request_refresh().await;
    if let Some(err) = outcome.error() {
        tracing::info!(kind = %err.kind, "refresh failed; reporting last known state");
    }

    let report = diagnostics(coordinator.params(), &coordinator.state());

    // Bug-report friendly: table and plain fall back to pretty JSON.
    let format = match global.output {
        OutputFormat::Table | OutputFormat::Plain => OutputFormat::Json,
        other => other,
    };
    let rendered = output::render_single(format, &report, |_| String::new(), |_| String::new())?;

    output::print_output(&rendered, global.quiet);
    Ok(())
}
