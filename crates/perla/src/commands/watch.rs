//! `perla watch`: run the coordinator and print one line per cycle.

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::mpsc;

use perla_core::{Coordinator, CoordinatorState, Reading, ReadingValue, read_all};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

/// Headline readings shown on each line.
const SUMMARY_KEYS: [&str; 4] = [
    "RegenerativLevel",
    "RegenerativRemainingDays",
    "CurrentFlowrate_l_h",
    "WaterTreatedCurrentDay_l",
];

#[derive(Debug, Serialize)]
struct CycleLine {
    at: DateTime<Local>,
    cycle: u64,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
    readings: Vec<Reading>,
}

impl CycleLine {
    fn from_state(state: &CoordinatorState, entry_name: &str) -> Self {
        let readings = read_all(entry_name, state.snapshot.as_deref(), &Local)
            .into_iter()
            .filter(|r| {
                SUMMARY_KEYS.contains(&r.key) || matches!(r.value, ReadingValue::Problem(_))
            })
            .collect();

        Self {
            at: Local::now(),
            cycle: state.cycles,
            available: state.available,
            last_error: state.last_error.as_ref().map(|e| e.message.clone()),
            readings,
        }
    }

    fn text(&self, color: bool) -> String {
        let mut parts = vec![
            self.at.format("%H:%M:%S").to_string(),
            output::availability_label(self.available, color),
        ];
        for reading in &self.readings {
            let value = match reading.value {
                ReadingValue::Problem(on) => output::problem_label(on, color),
                _ => reading.display_value(),
            };
            parts.push(format!("{}: {value}", reading.name));
        }
        if let Some(ref err) = self.last_error {
            parts.push(format!("({err})"));
        }
        parts.join("  ")
    }
}

pub async fn handle(
    coordinator: &Coordinator,
    entry_name: &str,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let _subscription = coordinator.register(move |state: &CoordinatorState| {
        let _ = tx.send(state.clone());
    });
    coordinator.start();

    let mut seen: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                break;
            }
            state = rx.recv() => {
                let Some(state) = state else { break };
                let line = CycleLine::from_state(&state, entry_name);
                let rendered = match global.output {
                    // One document per line regardless of pretty/compact.
                    OutputFormat::Json | OutputFormat::JsonCompact => {
                        output::render_single(OutputFormat::JsonCompact, &line, |_| String::new(), |_| String::new())?
                    }
                    OutputFormat::Yaml => format!(
                        "---\n{}",
                        output::render_single(OutputFormat::Yaml, &line, |_| String::new(), |_| String::new())?
                    ),
                    OutputFormat::Table | OutputFormat::Plain => line.text(color && global.output == OutputFormat::Table),
                };
                output::print_output(&rendered, global.quiet);

                seen += 1;
                if args.count.is_some_and(|n| seen >= n) {
                    break;
                }
            }
        }
    }

    coordinator.shutdown().await;
    Ok(())
}
