use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use extrulink_telemetry::Telemetry;
use extrulink_transport::Endpoint;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{LinkError, Result};
use crate::inbound::{Feed, InboundConfig, InboundLoop};
use crate::outbound::{CommandLink, PipeCommandLink, TcpCommandLink};

/// Which transports carry telemetry in and commands out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Simulator rows carry every metric.
    #[serde(rename = "SimMode")]
    Sim,
    /// Simulator rows carry spool statistics; readings and commands use the
    /// controller's binary pipes.
    #[default]
    #[serde(rename = "PipeMode")]
    Pipe,
    /// Hex readings and commands over TCP.
    #[serde(rename = "TCPMode")]
    Tcp,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Sim => "SimMode",
            Mode::Pipe => "PipeMode",
            Mode::Tcp => "TCPMode",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sim" | "simmode" => Ok(Mode::Sim),
            "pipe" | "pipemode" => Ok(Mode::Pipe),
            "tcp" | "tcpmode" => Ok(Mode::Tcp),
            other => Err(format!("unknown mode '{other}' (expected sim, pipe or tcp)")),
        }
    }
}

/// Endpoints and tuning for every transport a mode may use.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub mode: Mode,
    pub tcp_address: String,
    pub sim_pipe: PathBuf,
    pub msg_from_pipe: PathBuf,
    pub msg_to_pipe: PathBuf,
    pub inbound: InboundConfig,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            tcp_address: "localhost:8081".to_string(),
            sim_pipe: PathBuf::from("/tmp/simulator"),
            msg_from_pipe: PathBuf::from("/tmp/msgFromSim"),
            msg_to_pipe: PathBuf::from("/tmp/msgToSim"),
            inbound: InboundConfig::default(),
        }
    }
}

impl LinkSettings {
    /// Inbound feeds for the configured mode.
    pub fn feeds(&self) -> Vec<(Endpoint, Feed)> {
        match self.mode {
            Mode::Sim => vec![(
                Endpoint::NamedPipe(self.sim_pipe.clone()),
                Feed::SimText {
                    include_telemetry: true,
                },
            )],
            Mode::Pipe => vec![
                (
                    Endpoint::NamedPipe(self.sim_pipe.clone()),
                    Feed::SimText {
                        include_telemetry: false,
                    },
                ),
                (
                    Endpoint::NamedPipe(self.msg_from_pipe.clone()),
                    Feed::PipeMessages,
                ),
            ],
            Mode::Tcp => vec![(Endpoint::Tcp(self.tcp_address.clone()), Feed::TcpHexLines)],
        }
    }

    /// Command link for the configured mode. TCP mode sends over TCP;
    /// both pipe-based modes write to the command pipe.
    pub fn command_link(&self) -> CommandLink {
        match self.mode {
            Mode::Tcp => CommandLink::Tcp(TcpCommandLink::new(self.tcp_address.clone())),
            Mode::Sim | Mode::Pipe => {
                CommandLink::Pipe(PipeCommandLink::new(self.msg_to_pipe.clone()))
            }
        }
    }

    /// Named pipes the mode reads from or writes to.
    pub fn pipe_paths(&self) -> Vec<&PathBuf> {
        match self.mode {
            Mode::Sim => vec![&self.sim_pipe, &self.msg_to_pipe],
            Mode::Pipe => vec![&self.sim_pipe, &self.msg_from_pipe, &self.msg_to_pipe],
            Mode::Tcp => Vec::new(),
        }
    }
}

/// A running bridge: one task per inbound feed plus the command link.
#[derive(Debug)]
pub struct Bridge {
    telemetry: Arc<Telemetry>,
    commands: Arc<CommandLink>,
    cancel: CancellationToken,
    feeds: JoinSet<Result<()>>,
}

impl Bridge {
    /// Spawn the feeds of `settings.mode` on the current runtime.
    pub fn start(settings: &LinkSettings, telemetry: Arc<Telemetry>) -> Self {
        let cancel = CancellationToken::new();
        let mut feeds = JoinSet::new();
        for (endpoint, feed) in settings.feeds() {
            let inbound = InboundLoop::new(endpoint, feed, telemetry.clone())
                .with_config(settings.inbound.clone());
            info!(endpoint = %inbound.endpoint(), ?feed, "starting feed");
            feeds.spawn(inbound.run(cancel.clone()));
        }

        let commands = Arc::new(settings.command_link());
        info!(mode = %settings.mode, commands = %commands.endpoint(), "bridge started");
        Self {
            telemetry,
            commands,
            cancel,
            feeds,
        }
    }

    pub fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    pub fn commands(&self) -> &Arc<CommandLink> {
        &self.commands
    }

    /// Number of feeds still running.
    pub fn running_feeds(&self) -> usize {
        self.feeds.len()
    }

    /// Wait for the next feed to end. `None` once no feed is left.
    pub async fn join_next(&mut self) -> Option<Result<()>> {
        let joined = self.feeds.join_next().await?;
        Some(joined.map_err(LinkError::from).and_then(|result| result))
    }

    /// Cancel every feed, wait for them, then close the command link.
    ///
    /// Returns the first error a feed ended with.
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel.cancel();
        let mut first_error = None;
        while let Some(result) = self.join_next().await {
            if let Err(err) = result {
                warn!(error = %err, "feed ended with error");
                first_error.get_or_insert(err);
            }
        }
        self.commands.close().await;
        info!("bridge stopped");
        first_error.map_or(Ok(()), Err)
    }
}
