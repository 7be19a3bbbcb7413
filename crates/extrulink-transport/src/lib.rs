//! Stream transport for the extruder bridge.
//!
//! Provides a unified interface over the two media a controller can be
//! reached through:
//! - Named pipes (FIFOs, Unix only)
//! - TCP sockets
//!
//! This is the lowest layer of extrulink. Inbound feeds read from an
//! [`InboundStream`]; commands are written to an [`OutboundStream`].

pub mod endpoint;
pub mod error;
pub mod stream;

#[cfg(unix)]
pub mod fifo;

pub use endpoint::Endpoint;
pub use error::{Result, TransportError};
pub use stream::{open_inbound, open_outbound, InboundStream, OutboundStream};

#[cfg(unix)]
pub use fifo::{create_fifo, DEFAULT_FIFO_MODE};
