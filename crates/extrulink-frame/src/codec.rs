use bytes::{Buf, BufMut};

use crate::error::{FrameError, Result};

/// Every control-channel message is exactly this many bytes.
pub const FRAME_SIZE: usize = 8;

/// A decoded control-channel message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    /// Metric (inbound) or command (outbound) identifier.
    pub id: u8,
    /// The 32-bit payload value.
    pub value: u32,
}

impl Frame {
    /// Create a new frame.
    pub fn new(id: u8, value: u32) -> Self {
        Self { id, value }
    }

    /// Render the frame in the inbound convention.
    ///
    /// ```text
    /// ┌──────┬─────────────┬──────────────────┐
    /// │ Id   │ Unused (3B) │ Value (4B BE)    │
    /// └──────┴─────────────┴──────────────────┘
    /// ```
    pub fn to_bytes(&self) -> [u8; FRAME_SIZE] {
        let mut out = [0u8; FRAME_SIZE];
        out[0] = self.id;
        let mut dst = &mut out[4..];
        dst.put_u32(self.value);
        out
    }

    /// Lowercase hex of [`Frame::to_bytes`], as carried on the TCP feed.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

/// Decode an inbound-convention frame.
///
/// Bytes 1-3 are ignored. Unknown ids are not rejected here; mapping them to
/// a metric is the caller's business.
pub fn decode_frame(src: &[u8]) -> Result<Frame> {
    if src.len() != FRAME_SIZE {
        return Err(FrameError::InvalidLength { len: src.len() });
    }
    let id = src[0];
    let mut value = &src[4..FRAME_SIZE];
    Ok(Frame {
        id,
        value: value.get_u32(),
    })
}

/// Encode an outbound command in wire order.
///
/// ```text
/// ┌──────────────────┬─────────────┬──────┐
/// │ Value (4B LE)    │ Zero (3B)   │ Id   │
/// └──────────────────┴─────────────┴──────┘
/// ```
///
/// The result is written to the peer unchanged. Its byte-reversal is an
/// inbound-convention frame.
pub fn encode_command(id: u8, value: u32) -> [u8; FRAME_SIZE] {
    let mut out = [0u8; FRAME_SIZE];
    {
        let mut dst = &mut out[..4];
        dst.put_u32_le(value);
    }
    out[FRAME_SIZE - 1] = id;
    out
}

/// Reverse the byte order of a frame buffer.
pub fn reverse_frame(mut frame: [u8; FRAME_SIZE]) -> [u8; FRAME_SIZE] {
    frame.reverse();
    frame
}

/// Decode one line of the TCP feed: a hex string of an inbound frame.
pub fn decode_hex_frame(line: &str) -> Result<Frame> {
    let raw = hex::decode(line.trim())?;
    decode_frame(&raw)
}
