use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use extrulink_frame::Frame;
use serde::Serialize;
use tracing::{debug, info};

use crate::line::ParsedLine;
use crate::mapping::{FieldMap, Metric, SpoolMetric};
use crate::rollover;

/// The last known reading of one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Datapoint {
    /// When the value was read; `None` until the first update.
    pub timestamp: Option<NaiveDateTime>,
    pub value: f32,
}

impl Datapoint {
    pub fn new(value: f32, timestamp: Option<NaiveDateTime>) -> Self {
        Self { timestamp, value }
    }

    /// Overwrite value and timestamp together.
    pub fn set(&mut self, value: f32, at: NaiveDateTime) {
        self.value = value;
        self.timestamp = Some(at);
    }
}

/// Live process metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub temperature: Datapoint,
    pub diameter: Datapoint,
    pub spooler_rpm: Datapoint,
    pub screw_rpm: Datapoint,
    pub heater_pwm: Datapoint,
    pub contact_switch: Datapoint,
}

impl Dataset {
    pub fn get(&self, metric: Metric) -> &Datapoint {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Diameter => &self.diameter,
            Metric::SpoolerRpm => &self.spooler_rpm,
            Metric::ScrewRpm => &self.screw_rpm,
            Metric::HeaterPwm => &self.heater_pwm,
            Metric::ContactSwitch => &self.contact_switch,
        }
    }

    fn slot_mut(&mut self, metric: Metric) -> &mut Datapoint {
        match metric {
            Metric::Temperature => &mut self.temperature,
            Metric::Diameter => &mut self.diameter,
            Metric::SpoolerRpm => &mut self.spooler_rpm,
            Metric::ScrewRpm => &mut self.screw_rpm,
            Metric::HeaterPwm => &mut self.heater_pwm,
            Metric::ContactSwitch => &mut self.contact_switch,
        }
    }
}

/// Winding statistics of one spool.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpoolStats {
    pub winding_diameter: Datapoint,
    pub avg_filament_diameter: Datapoint,
    pub winding_count: Datapoint,
    pub filament_mass: Datapoint,
}

impl SpoolStats {
    pub fn get(&self, metric: SpoolMetric) -> &Datapoint {
        match metric {
            SpoolMetric::WindingDiameter => &self.winding_diameter,
            SpoolMetric::AvgFilamentDiameter => &self.avg_filament_diameter,
            SpoolMetric::WindingCount => &self.winding_count,
            SpoolMetric::FilamentMass => &self.filament_mass,
        }
    }

    fn slot_mut(&mut self, metric: SpoolMetric) -> &mut Datapoint {
        match metric {
            SpoolMetric::WindingDiameter => &mut self.winding_diameter,
            SpoolMetric::AvgFilamentDiameter => &mut self.avg_filament_diameter,
            SpoolMetric::WindingCount => &mut self.winding_count,
            SpoolMetric::FilamentMass => &mut self.filament_mass,
        }
    }
}

/// A consistent copy of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub dataset: Dataset,
    pub current_spool: SpoolStats,
    pub previous_spool: SpoolStats,
}

/// Result of applying one stats row.
#[derive(Debug, Clone, PartialEq)]
pub struct SpoolUpdate {
    /// Number of spool fields written.
    pub updated: usize,
    /// The finished spool, if this row triggered a rollover.
    pub rolled_over: Option<SpoolStats>,
}

#[derive(Debug, Default)]
struct State {
    dataset: Dataset,
    current: SpoolStats,
    previous: SpoolStats,
}

/// Process-wide latest-value store.
///
/// All writers go through one mutex, so a value and its timestamp are always
/// written together, and the rollover check sees the spool exactly as it was
/// before the row that is being applied.
#[derive(Debug, Default)]
pub struct StateStore {
    map: FieldMap,
    state: Mutex<State>,
}

impl StateStore {
    /// A zeroed store with the standard field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// A zeroed store with explicit mapping tables.
    pub fn with_field_map(map: FieldMap) -> Self {
        Self {
            map,
            state: Mutex::new(State::default()),
        }
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.map
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write a row's telemetry columns into the dataset.
    ///
    /// Returns how many fields were written; columns past the end of the row
    /// are left untouched.
    pub fn apply_telemetry(&self, line: &ParsedLine<'_>) -> usize {
        let at = line.timestamp();
        let mut state = self.lock();
        let mut updated = 0;
        for &(column, metric) in self.map.telemetry_columns() {
            if let Some(value) = line.value_at(column) {
                state.dataset.slot_mut(metric).set(value, at);
                updated += 1;
            }
        }
        updated
    }

    /// Write a row's spool columns and run rollover detection.
    ///
    /// When the filament mass drops on a spool wound past the threshold, the
    /// spool as it stood before this row becomes the previous spool.
    pub fn apply_spool_stats(&self, line: &ParsedLine<'_>) -> SpoolUpdate {
        let at = line.timestamp();
        let mut state = self.lock();
        let before = state.current.clone();

        let mut updated = 0;
        for &(column, metric) in self.map.spool_columns() {
            if let Some(value) = line.value_at(column) {
                state.current.slot_mut(metric).set(value, at);
                updated += 1;
            }
        }

        let rolled_over = if rollover::detect(&before, &state.current) {
            info!(
                mass = before.filament_mass.value,
                winding_diameter = before.winding_diameter.value,
                windings = before.winding_count.value,
                "spool rollover detected"
            );
            state.previous = before.clone();
            Some(before)
        } else {
            None
        };

        SpoolUpdate {
            updated,
            rolled_over,
        }
    }

    /// Write a binary reading into the dataset.
    ///
    /// Frames whose id has no mapped metric change nothing and return `None`.
    pub fn apply_message(&self, frame: &Frame, at: NaiveDateTime) -> Option<Metric> {
        let Some(metric) = self.map.metric_for_id(frame.id) else {
            debug!(id = frame.id, "no metric for message id");
            return None;
        };
        self.lock()
            .dataset
            .slot_mut(metric)
            .set(frame.value as f32, at);
        Some(metric)
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            dataset: state.dataset.clone(),
            current_spool: state.current.clone(),
            previous_spool: state.previous.clone(),
        }
    }

    pub fn dataset(&self) -> Dataset {
        self.lock().dataset.clone()
    }

    pub fn current_spool(&self) -> SpoolStats {
        self.lock().current.clone()
    }

    pub fn previous_spool(&self) -> SpoolStats {
        self.lock().previous.clone()
    }
}
