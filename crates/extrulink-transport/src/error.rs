use std::path::PathBuf;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open or connect to the endpoint.
    #[error("failed to open {endpoint}: {source}")]
    Open {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to create a named pipe.
    #[error("failed to create fifo {path}: {source}")]
    CreateFifo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The medium is not available on this platform.
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

impl TransportError {
    /// The underlying I/O error, if any.
    pub fn io_source(&self) -> Option<&std::io::Error> {
        match self {
            TransportError::Open { source, .. } | TransportError::CreateFifo { source, .. } => {
                Some(source)
            }
            TransportError::Io(err) => Some(err),
            TransportError::Unsupported(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
