use std::io::ErrorKind;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::codec::{encode_command, reverse_frame, FRAME_SIZE};
use crate::error::{FrameError, Result};
use crate::ids::ControlCommand;

/// Writes outbound command frames to any `AsyncWrite` stream.
#[derive(Debug)]
pub struct FrameWriter<T> {
    inner: T,
}

impl<T: AsyncWrite + Unpin> FrameWriter<T> {
    /// Create a new frame writer.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Encode and send one command frame, then flush.
    ///
    /// Exactly 8 bytes are written.
    pub async fn send(&mut self, id: u8, value: u32) -> Result<()> {
        let wire = encode_command(id, value);

        let mut offset = 0usize;
        while offset < FRAME_SIZE {
            match self.inner.write(&wire[offset..]).await {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        self.inner.flush().await?;

        debug!(frame = %hex::encode(reverse_frame(wire)), "command frame sent");
        Ok(())
    }

    /// Send a typed control command.
    pub async fn send_command(&mut self, command: ControlCommand, value: u32) -> Result<()> {
        self.send(command.id(), value).await
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
