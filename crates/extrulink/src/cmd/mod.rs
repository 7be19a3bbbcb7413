use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use extrulink_frame::ControlCommand;

use crate::config::{BridgeConfig, Overrides};
use crate::exit::{CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod decode;
pub mod replay;
pub mod run;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the bridge and print live telemetry.
    Run(RunArgs),
    /// Send a single command to the controller.
    Send(SendArgs),
    /// Feed a recorded simulator log through the decoders.
    Replay(ReplayArgs),
    /// Decode one hex-encoded reading.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Where the bridge config comes from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub overrides: Overrides,
}

impl ConfigSource {
    pub fn load(&self) -> CliResult<BridgeConfig> {
        Ok(BridgeConfig::load(&self.path)?.with_overrides(&self.overrides))
    }
}

pub fn run(command: Command, config: &ConfigSource, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, &config.load()?, format),
        Command::Send(args) => send::run(args, &config.load()?, format),
        Command::Replay(args) => replay::run(args, &config.load()?, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

pub(crate) fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("failed to start runtime: {err}")))
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Print a full snapshot at this interval (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub snapshot_every: Option<String>,
    /// Create missing named pipes before starting.
    #[arg(long)]
    pub create_pipes: bool,
}

/// Operator commands, by their wire name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CommandName {
    ModeSwitch,
    AutoStart,
    SpoolerRpm,
    ScrewRpm,
    HeaterPwm,
    EmergencyStop,
}

impl From<CommandName> for ControlCommand {
    fn from(name: CommandName) -> Self {
        match name {
            CommandName::ModeSwitch => ControlCommand::ModeSwitch,
            CommandName::AutoStart => ControlCommand::AutoStart,
            CommandName::SpoolerRpm => ControlCommand::SpoolerRpm,
            CommandName::ScrewRpm => ControlCommand::ScrewRpm,
            CommandName::HeaterPwm => ControlCommand::HeaterPwm,
            CommandName::EmergencyStop => ControlCommand::EmergencyStop,
        }
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Command to send.
    pub command: CommandName,
    /// Command value. Optional for auto-start and emergency-stop.
    pub value: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Recorded simulator log.
    pub file: PathBuf,
    /// Apply spool statistics only, as in pipe mode.
    #[arg(long)]
    pub stats_only: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// 16 hex digits of one inbound frame.
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
