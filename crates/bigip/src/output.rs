//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders driver answers in the format selected by `--output`. Table uses
//! `tabled`, structured formats use serde, plain emits one value per line.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use bigip_core::Answer;

use crate::cli::OutputFormat;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, which returns a pre-formatted string.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Render a driver answer.
pub fn render_answer(format: &OutputFormat, answer: &Answer) -> String {
    render_single(format, answer, answer_table, answer_plain)
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Answer views ─────────────────────────────────────────────────────

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Result")]
    result: String,
}

#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Bytes Out")]
    bytes_out: i64,
    #[tabled(rename = "Bytes In")]
    bytes_in: i64,
}

fn answer_table(answer: &Answer) -> String {
    match answer {
        Answer::Ready => "Appliance ready".into(),
        Answer::Maintain => "Maintenance acknowledged".into(),
        Answer::IpAssoc { results } => {
            let rows: Vec<ResultRow> = results
                .iter()
                .enumerate()
                .map(|(i, r)| ResultRow {
                    index: i + 1,
                    result: r.clone(),
                })
                .collect();
            render_table(&rows)
        }
        Answer::Status { success, details } => {
            let state = if *success { "success" } else { "failed" };
            match details {
                Some(d) => format!("Status:  {state}\nDetails: {d}"),
                None => format!("Status:  {state}"),
            }
        }
        Answer::Usage { ip_bytes, error } => {
            let rows: Vec<UsageRow> = ip_bytes
                .iter()
                .map(|(address, counts)| UsageRow {
                    address: address.clone(),
                    bytes_out: counts.bytes_out,
                    bytes_in: counts.bytes_in,
                })
                .collect();
            let table = render_table(&rows);
            match error {
                Some(e) => format!("{table}\nError: {e}"),
                None => table,
            }
        }
        Answer::Unsupported { command } => format!("Unsupported command: {command}"),
    }
}

fn answer_plain(answer: &Answer) -> String {
    match answer {
        Answer::Ready => "ready".into(),
        Answer::Maintain => "maintain".into(),
        Answer::IpAssoc { results } => results.join("\n"),
        Answer::Status { success, .. } => success.to_string(),
        Answer::Usage { ip_bytes, .. } => ip_bytes
            .iter()
            .map(|(addr, c)| format!("{addr}\t{}\t{}", c.bytes_out, c.bytes_in))
            .collect::<Vec<_>>()
            .join("\n"),
        Answer::Unsupported { command } => command.clone(),
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    if compact {
        serde_json::to_string(data).expect("serialization should not fail")
    } else {
        serde_json::to_string_pretty(data).expect("serialization should not fail")
    }
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}
