use std::fmt;
use std::path::PathBuf;

/// Where a feed is read from or commands are written to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// A named pipe (FIFO) on the local filesystem.
    NamedPipe(PathBuf),
    /// A TCP peer, as `host:port`.
    Tcp(String),
}

impl Endpoint {
    pub fn named_pipe(path: impl Into<PathBuf>) -> Self {
        Endpoint::NamedPipe(path.into())
    }

    pub fn tcp(address: impl Into<String>) -> Self {
        Endpoint::Tcp(address.into())
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match self {
            Endpoint::NamedPipe(_) => "named-pipe",
            Endpoint::Tcp(_) => "tcp",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::NamedPipe(path) => write!(f, "pipe:{}", path.display()),
            Endpoint::Tcp(address) => write!(f, "tcp:{address}"),
        }
    }
}
