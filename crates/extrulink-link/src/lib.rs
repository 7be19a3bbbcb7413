//! Transport channel of the extruder bridge.
//!
//! Inbound feeds are kept alive by an [`InboundLoop`] that reconnects after
//! every disconnect; commands go out through a [`CommandLink`]. A [`Bridge`]
//! wires both directions for one [`Mode`].

pub mod bridge;
pub mod error;
pub mod inbound;
pub mod lines;
pub mod outbound;

pub use bridge::{Bridge, LinkSettings, Mode};
pub use error::{LinkError, Result};
pub use inbound::{Feed, InboundConfig, InboundLoop, ReadErrorPolicy, SessionEnd, DEFAULT_BACKOFF};
pub use lines::{LineCodec, Malformed, Record, DEFAULT_MAX_LINE_LENGTH};
pub use outbound::{CommandLink, PipeCommandLink, TcpCommandLink};
