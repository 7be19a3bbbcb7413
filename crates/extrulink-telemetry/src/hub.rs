use chrono::{Local, NaiveDate, NaiveDateTime};
use extrulink_frame::Frame;

use crate::error::LineError;
use crate::line::parse_line;
use crate::mapping::Metric;
use crate::notifier::{EventNotifier, LiveEvent};
use crate::store::{SpoolStats, StateStore};

/// Which tables a simulator row feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineScope {
    /// Spool statistics and live telemetry (simulator mode).
    All,
    /// Spool statistics only; live telemetry arrives as binary frames.
    SpoolOnly,
}

/// What one accepted row changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineReport {
    pub telemetry_fields: usize,
    pub spool_fields: usize,
    pub rolled_over: Option<SpoolStats>,
}

/// The store plus the live event feed: the single entry point for decoders.
#[derive(Debug, Default)]
pub struct Telemetry {
    store: StateStore,
    events: EventNotifier,
}

impl Telemetry {
    pub fn new(store: StateStore, events: EventNotifier) -> Self {
        Self { store, events }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn events(&self) -> &EventNotifier {
        &self.events
    }

    /// Decode one simulator row received now.
    pub fn ingest_line(
        &self,
        line: &str,
        delimiter: &str,
        scope: LineScope,
    ) -> Result<LineReport, LineError> {
        self.ingest_line_on(line, delimiter, scope, Local::now().date_naive())
    }

    /// Decode one row whose time of day belongs to `date`.
    ///
    /// Spool statistics are applied first, then live telemetry. An accepted
    /// row is published once, whatever its individual fields held.
    pub fn ingest_line_on(
        &self,
        line: &str,
        delimiter: &str,
        scope: LineScope,
        date: NaiveDate,
    ) -> Result<LineReport, LineError> {
        let parsed = parse_line(line, delimiter, date)?;

        let spool = self.store.apply_spool_stats(&parsed);
        let telemetry_fields = match scope {
            LineScope::All => self.store.apply_telemetry(&parsed),
            LineScope::SpoolOnly => 0,
        };

        self.events.publish(LiveEvent::line(line));
        Ok(LineReport {
            telemetry_fields,
            spool_fields: spool.updated,
            rolled_over: spool.rolled_over,
        })
    }

    /// Apply one binary reading received now.
    pub fn ingest_frame(&self, frame: &Frame) -> Option<Metric> {
        self.ingest_frame_at(frame, Local::now().naive_local())
    }

    /// Apply one binary reading. Frames with an unmapped id are dropped
    /// without an event.
    pub fn ingest_frame_at(&self, frame: &Frame, at: NaiveDateTime) -> Option<Metric> {
        let metric = self.store.apply_message(frame, at)?;
        self.events.publish(LiveEvent::message(frame, at));
        Some(metric)
    }
}
