use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

/// Targets that follow `--log-level`; everything else stays at warn or quieter.
const BRIDGE_TARGETS: [&str; 5] = [
    "extrulink",
    "extrulink_frame",
    "extrulink_transport",
    "extrulink_telemetry",
    "extrulink_link",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Install the stderr subscriber. Stdout is reserved for command output.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);
    let registry = tracing_subscriber::registry().with(filter(level));

    let _ = match format {
        LogFormat::Text => registry.with(layer).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    };
}

fn filter(level: LogLevel) -> Targets {
    let level = LevelFilter::from(level);
    Targets::new()
        .with_targets(BRIDGE_TARGETS.map(|target| (target, level)))
        .with_default(level.min(LevelFilter::WARN))
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn bridge_crates_follow_the_level() {
        let targets = filter(LogLevel::Debug);
        assert!(targets.would_enable("extrulink_link::inbound", &Level::DEBUG));
        assert!(!targets.would_enable("extrulink_link::inbound", &Level::TRACE));
        assert!(targets.would_enable("mio::poll", &Level::WARN));
        assert!(!targets.would_enable("mio::poll", &Level::INFO));
    }

    #[test]
    fn quiet_levels_apply_everywhere() {
        let targets = filter(LogLevel::Error);
        assert!(!targets.would_enable("extrulink_telemetry::store", &Level::WARN));
        assert!(!targets.would_enable("tokio_util::codec", &Level::WARN));
        assert!(targets.would_enable("tokio_util::codec", &Level::ERROR));
    }
}
