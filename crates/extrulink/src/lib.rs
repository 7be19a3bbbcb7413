//! Telemetry and command bridge for a filament extruder line.
//!
//! extrulink reads live readings from a simulator or a controller, keeps the
//! latest value of every metric, notices when a spool is replaced and sends
//! operator commands back as 8-byte frames.
//!
//! # Crate Structure
//!
//! - [`transport`]: named pipe and TCP endpoints
//! - [`frame`]: the 8-byte message codec and command ids
//! - [`telemetry`]: line decoder, state store, rollover detection, live events
//! - [`link`]: reconnecting feeds, command links and mode wiring

/// Re-export transport types.
pub mod transport {
    pub use extrulink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use extrulink_frame::*;
}

/// Re-export telemetry types.
pub mod telemetry {
    pub use extrulink_telemetry::*;
}

/// Re-export link types.
pub mod link {
    pub use extrulink_link::*;
}
