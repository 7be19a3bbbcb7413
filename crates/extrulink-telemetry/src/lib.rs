//! Latest-value telemetry state for the extruder line.
//!
//! Decoded readings land in a single [`StateStore`]: one [`Dataset`] of live
//! metrics plus the in-progress and previous [`SpoolStats`]. Simulator rows
//! are decoded by [`line`], binary frames by their id, and every accepted
//! record is fanned out through the [`EventNotifier`].

pub mod error;
pub mod hub;
pub mod line;
pub mod mapping;
pub mod notifier;
pub mod rollover;
pub mod store;

pub use error::{LineError, MappingError};
pub use hub::{LineReport, LineScope, Telemetry};
pub use line::{parse_line, ParsedLine, TIMESTAMP_FORMAT};
pub use mapping::{FieldMap, Metric, SpoolMetric};
pub use notifier::{EventNotifier, LiveEvent, DEFAULT_EVENT_CAPACITY};
pub use rollover::ROLLOVER_MIN_WINDING_DIAMETER;
pub use store::{Datapoint, Dataset, Snapshot, SpoolStats, SpoolUpdate, StateStore};
