use std::path::PathBuf;

use extrulink_frame::{ControlCommand, FrameWriter};
use extrulink_transport::{open_outbound, Endpoint, OutboundStream};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Writes commands to the controller's command pipe.
///
/// The pipe is opened for every send and closed right after, so each command
/// is delivered as one 8-byte write to whoever is reading at the time.
#[derive(Debug, Clone)]
pub struct PipeCommandLink {
    endpoint: Endpoint,
}

impl PipeCommandLink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: Endpoint::NamedPipe(path.into()),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send one command. Fails when nobody has the pipe open for reading.
    pub async fn send(&self, id: u8, value: u32) -> Result<()> {
        let stream = open_outbound(&self.endpoint).await?;
        let mut writer = FrameWriter::new(stream);
        writer.send(id, value).await?;
        Ok(())
    }
}

/// Writes commands over one long-lived TCP connection.
///
/// The connection is made on the first send and reused afterwards. A failed
/// write drops it; the next send reconnects.
#[derive(Debug)]
pub struct TcpCommandLink {
    endpoint: Endpoint,
    writer: Mutex<Option<FrameWriter<OutboundStream>>>,
}

impl TcpCommandLink {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::Tcp(address.into()),
            writer: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Whether a connection is currently held.
    pub async fn is_connected(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    /// Send one command, connecting first if needed.
    pub async fn send(&self, id: u8, value: u32) -> Result<()> {
        let mut slot = self.writer.lock().await;
        let mut writer = match slot.take() {
            Some(writer) => writer,
            None => {
                let stream = open_outbound(&self.endpoint).await?;
                info!(endpoint = %self.endpoint, "command link connected");
                FrameWriter::new(stream)
            }
        };

        match writer.send(id, value).await {
            Ok(()) => {
                *slot = Some(writer);
                Ok(())
            }
            Err(err) => {
                warn!(endpoint = %self.endpoint, error = %err, "command link dropped");
                Err(err.into())
            }
        }
    }

    /// Shut the connection down, if one is held.
    pub async fn close(&self) {
        let Some(writer) = self.writer.lock().await.take() else {
            return;
        };
        let mut stream = writer.into_inner();
        if let Err(err) = stream.shutdown().await {
            debug!(endpoint = %self.endpoint, error = %err, "command link shutdown failed");
        }
        info!(endpoint = %self.endpoint, "command link closed");
    }
}

/// The outbound path to the controller for the active mode.
#[derive(Debug)]
pub enum CommandLink {
    Pipe(PipeCommandLink),
    Tcp(TcpCommandLink),
}

impl CommandLink {
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            CommandLink::Pipe(link) => link.endpoint(),
            CommandLink::Tcp(link) => link.endpoint(),
        }
    }

    /// Send a raw command id and value.
    pub async fn send(&self, id: u8, value: u32) -> Result<()> {
        match self {
            CommandLink::Pipe(link) => link.send(id, value).await,
            CommandLink::Tcp(link) => link.send(id, value).await,
        }
    }

    pub async fn send_command(&self, command: ControlCommand, value: u32) -> Result<()> {
        debug!(command = command.name(), value, "sending command");
        self.send(command.id(), value).await
    }

    /// Release any held connection. Pipe links hold none.
    pub async fn close(&self) {
        if let CommandLink::Tcp(link) = self {
            link.close().await;
        }
    }
}
