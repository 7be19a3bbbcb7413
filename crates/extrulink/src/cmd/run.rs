use std::sync::Arc;
use std::time::Duration;

use extrulink_link::{Bridge, LinkSettings};
#[cfg(unix)]
use extrulink_transport::{create_fifo, DEFAULT_FIFO_MODE};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval_at, Instant, Interval};
use tracing::{info, warn};

use crate::cmd::RunArgs;
use crate::config::BridgeConfig;
#[cfg(unix)]
use crate::exit::transport_error;
use crate::exit::{io_error, link_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_event, print_snapshot, OutputFormat};

pub fn run(args: RunArgs, config: &BridgeConfig, format: OutputFormat) -> CliResult<i32> {
    let snapshot_every = args
        .snapshot_every
        .as_deref()
        .map(parse_duration)
        .transpose()?;
    let settings = config.link_settings();

    if args.create_pipes {
        create_pipes(&settings)?;
    }

    let runtime = super::runtime()?;
    let telemetry = Arc::new(config.telemetry());
    runtime.block_on(async move {
        let bridge = Bridge::start(&settings, telemetry);
        serve(bridge, snapshot_every, format).await
    })
}

#[cfg(unix)]
fn create_pipes(settings: &LinkSettings) -> CliResult<()> {
    for path in settings.pipe_paths() {
        let created = create_fifo(path, DEFAULT_FIFO_MODE)
            .map_err(|err| transport_error("failed creating pipe", err))?;
        if created {
            info!(path = %path.display(), "created named pipe");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn create_pipes(_settings: &LinkSettings) -> CliResult<()> {
    Err(CliError::new(
        USAGE,
        "--create-pipes is not supported on this platform",
    ))
}

async fn serve(
    mut bridge: Bridge,
    snapshot_every: Option<Duration>,
    format: OutputFormat,
) -> CliResult<i32> {
    let telemetry = bridge.telemetry().clone();
    let mut events = telemetry.events().subscribe();
    let mut ticker = snapshot_every.map(|period| interval_at(Instant::now() + period, period));
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let outcome = loop {
        tokio::select! {
            signal = &mut interrupt => {
                match signal {
                    Ok(()) => {
                        info!("interrupt received, shutting down");
                        break Ok(());
                    }
                    Err(err) => break Err(io_error("signal handler setup failed", err)),
                }
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event, format),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "live output fell behind"),
                Err(RecvError::Closed) => break Ok(()),
            },
            _ = tick(&mut ticker) => print_snapshot(&telemetry.store().snapshot(), format),
            ended = bridge.join_next(), if bridge.running_feeds() > 0 => {
                if let Some(Err(err)) = ended {
                    break Err(link_error("feed stopped", err));
                }
            }
        }
    };

    let stopped = bridge.shutdown().await;
    outcome?;
    stopped.map_err(|err| link_error("shutdown failed", err))?;
    Ok(SUCCESS)
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" | "" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
