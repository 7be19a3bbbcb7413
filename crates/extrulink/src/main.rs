mod cmd;
mod config;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;
use extrulink_link::Mode;

use crate::cmd::{Command, ConfigSource};
use crate::config::{Overrides, DEFAULT_CONFIG_PATH};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "extrulink", version, about = "Extruder telemetry and command bridge")]
struct Cli {
    /// Bridge config file (JSON).
    #[arg(
        long,
        value_name = "PATH",
        env = "EXTRULINK_CONFIG",
        default_value = DEFAULT_CONFIG_PATH,
        global = true
    )]
    config: PathBuf,

    /// Transport mode (sim, pipe, tcp); overrides the config file.
    #[arg(long, value_name = "MODE", env = "EXTRULINK_MODE", global = true)]
    mode: Option<Mode>,

    /// Controller address for TCP mode; overrides the config file.
    #[arg(long, value_name = "HOST:PORT", env = "EXTRULINK_TCP_ADDRESS", global = true)]
    tcp_address: Option<String>,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let config = ConfigSource {
        path: cli.config,
        overrides: Overrides {
            mode: cli.mode,
            tcp_address: cli.tcp_address,
        },
    };
    let result = cmd::run(cli.command, &config, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::CommandName;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "extrulink",
            "--mode",
            "tcp",
            "send",
            "heater-pwm",
            "80",
        ])
        .expect("send args should parse");

        assert_eq!(cli.mode, Some(Mode::Tcp));
        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.command, CommandName::HeaterPwm);
                assert_eq!(args.value, Some(80));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn send_value_is_optional() {
        let cli = Cli::try_parse_from(["extrulink", "send", "emergency-stop"])
            .expect("button commands parse without a value");
        assert!(matches!(cli.command, Command::Send(ref args) if args.value.is_none()));
    }

    #[test]
    fn rejects_unknown_command_name() {
        let err = Cli::try_parse_from(["extrulink", "send", "self-destruct", "1"])
            .expect_err("unknown command should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn parses_run_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "extrulink",
            "run",
            "--snapshot-every",
            "5s",
            "--create-pipes",
            "--log-level",
            "debug",
            "--config",
            "/etc/extrulink/ExtruderConfig.json",
        ])
        .expect("run args should parse");

        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(
            cli.config,
            PathBuf::from("/etc/extrulink/ExtruderConfig.json")
        );
        assert!(matches!(
            cli.command,
            Command::Run(ref args) if args.create_pipes && args.snapshot_every.as_deref() == Some("5s")
        ));
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = Cli::try_parse_from(["extrulink", "--mode", "serial", "run"])
            .expect_err("unknown mode should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
