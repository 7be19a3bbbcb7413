use std::io::{IsTerminal, Write};

use chrono::NaiveDateTime;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use extrulink_frame::{telemetry_name, Frame};
use extrulink_telemetry::{Datapoint, LiveEvent, Metric, Snapshot, SpoolMetric, SpoolStats};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One command written to the controller.
#[derive(Debug, Serialize)]
pub struct SentCommand<'a> {
    pub command: &'a str,
    pub id: u8,
    pub value: u32,
    pub endpoint: String,
    pub wire: String,
}

/// Result of feeding a recorded log through the decoders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub lines: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub rollovers: usize,
    pub snapshot: Snapshot,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodedFrame<'a> {
    id: u8,
    metric: &'a str,
    value: u32,
    hex: String,
}

pub fn print_event(event: &LiveEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(event),
        OutputFormat::Table => {
            let (kind, at, body) = match event {
                LiveEvent::Line { text } => ("line", String::new(), text.clone()),
                LiveEvent::Message {
                    received_at,
                    id,
                    value,
                    ..
                } => (
                    "message",
                    format_time(Some(*received_at)),
                    format!("{}={value}", telemetry_name(*id)),
                ),
            };
            let mut table = new_table(vec!["KIND", "RECEIVED", "RECORD"]);
            table.add_row(vec![kind.to_string(), at, body]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", pretty_event(event)),
        OutputFormat::Raw => println!("{event}"),
    }
}

pub fn print_snapshot(snapshot: &Snapshot, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => print_json(snapshot),
        OutputFormat::Table => println!("{}", snapshot_table(snapshot)),
        OutputFormat::Pretty => {
            for (group, name, point) in snapshot_rows(snapshot) {
                println!(
                    "{group}.{name}={} @ {}",
                    point.value,
                    format_time(point.timestamp)
                );
            }
        }
    }
}

pub fn print_sent(sent: &SentCommand<'_>, wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(sent),
        OutputFormat::Table => {
            let mut table = new_table(vec!["COMMAND", "ID", "VALUE", "ENDPOINT", "WIRE"]);
            table.add_row(vec![
                sent.command.to_string(),
                format!("0x{:02x}", sent.id),
                sent.value.to_string(),
                sent.endpoint.clone(),
                sent.wire.clone(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "sent {} (0x{:02x}) value={} to {}",
            sent.command, sent.id, sent.value, sent.endpoint
        ),
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_decoded(frame: &Frame, format: OutputFormat) {
    let decoded = DecodedFrame {
        id: frame.id,
        metric: telemetry_name(frame.id),
        value: frame.value,
        hex: frame.to_hex(),
    };
    match format {
        OutputFormat::Json => print_json(&decoded),
        OutputFormat::Table => {
            let mut table = new_table(vec!["ID", "METRIC", "VALUE", "HEX"]);
            table.add_row(vec![
                format!("0x{:02x}", decoded.id),
                decoded.metric.to_string(),
                decoded.value.to_string(),
                decoded.hex,
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "id=0x{:02x} ({}) value={}",
            decoded.id, decoded.metric, decoded.value
        ),
        OutputFormat::Raw => println!("{}", decoded.value),
    }
}

pub fn print_replay(summary: &ReplaySummary, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => print_json(summary),
        OutputFormat::Table => {
            let mut table = new_table(vec!["LINES", "ACCEPTED", "REJECTED", "ROLLOVERS"]);
            table.add_row(vec![
                summary.lines.to_string(),
                summary.accepted.to_string(),
                summary.rejected.to_string(),
                summary.rollovers.to_string(),
            ]);
            println!("{table}");
            println!("{}", snapshot_table(&summary.snapshot));
        }
        OutputFormat::Pretty => {
            println!(
                "lines={} accepted={} rejected={} rollovers={}",
                summary.lines, summary.accepted, summary.rejected, summary.rollovers
            );
            print_snapshot(&summary.snapshot, format);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn snapshot_table(snapshot: &Snapshot) -> Table {
    let mut table = new_table(vec!["GROUP", "METRIC", "VALUE", "UPDATED"]);
    for (group, name, point) in snapshot_rows(snapshot) {
        table.add_row(vec![
            group.to_string(),
            name.to_string(),
            point.value.to_string(),
            format_time(point.timestamp),
        ]);
    }
    table
}

fn snapshot_rows(snapshot: &Snapshot) -> Vec<(&'static str, &'static str, Datapoint)> {
    let mut rows: Vec<_> = Metric::ALL
        .into_iter()
        .map(|metric| ("dataset", metric.name(), *snapshot.dataset.get(metric)))
        .collect();
    rows.extend(spool_rows("currentSpool", &snapshot.current_spool));
    rows.extend(spool_rows("previousSpool", &snapshot.previous_spool));
    rows
}

fn spool_rows<'a>(
    group: &'static str,
    stats: &'a SpoolStats,
) -> impl Iterator<Item = (&'static str, &'static str, Datapoint)> + 'a {
    SpoolMetric::ALL
        .into_iter()
        .map(move |metric| (group, metric.name(), *stats.get(metric)))
}

fn pretty_event(event: &LiveEvent) -> String {
    match event {
        LiveEvent::Line { text } => format!("line: {text}"),
        LiveEvent::Message {
            received_at,
            id,
            value,
            hex,
        } => format!(
            "message: {} {}={value} ({hex})",
            received_at.format("%H:%M:%S%.3f"),
            telemetry_name(*id)
        ),
    }
}

fn format_time(at: Option<NaiveDateTime>) -> String {
    at.map(|at| at.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| "-".to_string())
}
