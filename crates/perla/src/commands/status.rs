//! `perla status`: one refresh, every reading.

use chrono::Local;
use serde_json::Value;
use tabled::Tabled;

use perla_core::{Coordinator, Reading, ReadingValue, read_all};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Reading")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Field")]
    key: String,
}

#[derive(Tabled)]
struct RawRow {
    #[tabled(rename = "Field")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn reading_row(reading: &Reading, color: bool) -> ReadingRow {
    let value = match reading.value {
        ReadingValue::Problem(on) => output::problem_label(on, color),
        _ => reading.display_value(),
    };
    ReadingRow {
        name: reading.name.to_owned(),
        value,
        key: reading.key.to_owned(),
    }
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub async fn handle(
    coordinator: &Coordinator,
    entry_name: &str,
    args: &StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = util::refresh_once(coordinator).await?;
    let color = output::should_color(global.color);

    let rendered = if args.raw {
        let fields: Vec<(&String, &Value)> = snapshot.iter().collect();
        output::render_single(
            global.output,
            snapshot.as_ref(),
            |_| {
                let rows: Vec<RawRow> = fields
                    .iter()
                    .map(|(k, v)| RawRow {
                        key: (*k).clone(),
                        value: raw_text(v),
                    })
                    .collect();
                tabled::Table::new(rows)
                    .with(tabled::settings::Style::rounded())
                    .to_string()
            },
            |_| {
                fields
                    .iter()
                    .map(|(k, v)| format!("{k}={}", raw_text(v)))
                    .collect::<Vec<_>>()
                    .join("\n")
            },
        )?
    } else {
        let readings: Vec<Reading> = read_all(entry_name, Some(&snapshot), &Local)
            .into_iter()
            .filter(|r| args.all || util::is_reported(r, &snapshot))
            .collect();

        output::render_list(
            global.output,
            &readings,
            |r| reading_row(r, color),
            |r| format!("{}={}", r.key, util::plain_value(r)),
        )?
    };

    output::print_output(&rendered, global.quiet);
    Ok(())
}
