/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The message is not exactly 8 bytes long.
    #[error("expected 8 bytes, got {len} bytes")]
    InvalidLength { len: usize },

    /// A hex-encoded frame line could not be decoded.
    #[error("invalid hex frame: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The stream ended in the middle of a frame.
    #[error("stream closed with {len} trailing bytes (incomplete frame)")]
    Truncated { len: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer stopped accepting bytes before a frame was fully written.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
