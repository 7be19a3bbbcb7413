/// Errors that can occur on a feed or command link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] extrulink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] extrulink_frame::FrameError),

    /// Read failure on a text feed.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),

    /// A feed task panicked or was aborted.
    #[error("feed task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, LinkError>;
