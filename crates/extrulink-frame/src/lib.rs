//! Fixed-width message codec for the extruder control channel.
//!
//! Every message on the control channel is exactly 8 bytes:
//! - Inbound telemetry: byte 0 is the metric id, bytes 4-7 a big-endian `u32`
//! - Outbound commands: bytes 0-3 a little-endian `u32`, byte 7 the command id
//!
//! The two layouts are byte-reversals of each other. Pipe peers write their
//! readings in the outbound order, so [`FrameCodec`] reverses before decoding.

pub mod codec;
pub mod error;
pub mod ids;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, decode_hex_frame, encode_command, reverse_frame, Frame, FRAME_SIZE,
};
pub use error::{FrameError, Result};
pub use ids::{telemetry_name, ControlCommand};
pub use reader::FrameCodec;
pub use writer::FrameWriter;
