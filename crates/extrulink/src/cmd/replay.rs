use std::fs;

use chrono::{Local, NaiveDate};
use extrulink_telemetry::{LineError, LineScope, Telemetry};
use tracing::{debug, info, warn};

use crate::cmd::ReplayArgs;
use crate::config::BridgeConfig;
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::{print_replay, OutputFormat, ReplaySummary};

pub fn run(args: ReplayArgs, config: &BridgeConfig, format: OutputFormat) -> CliResult<i32> {
    let text = fs::read_to_string(&args.file)
        .map_err(|err| io_error(&format!("failed reading {}", args.file.display()), err))?;

    let scope = if args.stats_only {
        LineScope::SpoolOnly
    } else {
        LineScope::All
    };
    let telemetry = config.telemetry();
    let summary = replay(
        &telemetry,
        &text,
        &config.delimiter,
        scope,
        Local::now().date_naive(),
    );
    info!(
        lines = summary.lines,
        accepted = summary.accepted,
        rollovers = summary.rollovers,
        "replay finished"
    );
    print_replay(&summary, format);
    Ok(SUCCESS)
}

fn replay(
    telemetry: &Telemetry,
    text: &str,
    delimiter: &str,
    scope: LineScope,
    date: NaiveDate,
) -> ReplaySummary {
    let mut summary = ReplaySummary {
        lines: 0,
        accepted: 0,
        rejected: 0,
        rollovers: 0,
        snapshot: Default::default(),
    };

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        summary.lines += 1;
        match telemetry.ingest_line_on(line, delimiter, scope, date) {
            Ok(report) => {
                summary.accepted += 1;
                if report.rolled_over.is_some() {
                    summary.rollovers += 1;
                }
            }
            Err(err @ LineError::TooFewTokens { .. }) => {
                summary.rejected += 1;
                debug!(line = index + 1, error = %err, "row skipped");
            }
            Err(err) => {
                summary.rejected += 1;
                warn!(line = index + 1, error = %err, "row rejected");
            }
        }
    }

    summary.snapshot = telemetry.store().snapshot();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
# recorded 2025-05-20
12:00:00.000 | 0 | 10 | 20 | 50 | 1.70 | 200.0 | 0 | 40 | 1.75 | 100 | 180
12:00:01.000 | 0 | 10 | 20 | 50 | 1.72 | 201.5 | 1 | 60 | 1.74 | 150 | 200

12:00:02.000 | 0 | 10 | 20 | 50 | 1.71 | 202.0 | 0 | 10 | 1.75 | 2 | 50
12:00:03.000 | 0 | 10 | 20 | 50 | 1.69 | xx | 0 | 11 | 1.75 | 4 | 60
";

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    #[test]
    fn replay_counts_rows_and_rollovers() {
        let telemetry = Telemetry::default();
        let summary = replay(&telemetry, LOG, "|", LineScope::All, day());

        assert_eq!(summary.lines, 5);
        assert_eq!(summary.accepted, 4);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.rollovers, 1);

        let snapshot = summary.snapshot;
        assert_eq!(snapshot.previous_spool.filament_mass.value, 200.0);
        assert_eq!(snapshot.previous_spool.winding_diameter.value, 60.0);
        assert_eq!(snapshot.current_spool.filament_mass.value, 60.0);
        assert_eq!(snapshot.dataset.temperature.value, 0.0);
        assert_eq!(
            snapshot.dataset.temperature.timestamp,
            day().and_hms_opt(12, 0, 3)
        );
    }

    #[test]
    fn stats_only_replay_leaves_live_metrics() {
        let telemetry = Telemetry::default();
        let summary = replay(&telemetry, LOG, "|", LineScope::SpoolOnly, day());
        assert_eq!(summary.rollovers, 1);
        assert_eq!(summary.snapshot.dataset.diameter.timestamp, None);
    }
}
