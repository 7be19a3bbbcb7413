//! Field mapping: which column or message id feeds which metric slot.
//!
//! The tables are fixed when a store is built and never change afterwards.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use extrulink_frame::ids;
use serde::Serialize;

use crate::error::MappingError;

/// A live metric slot in the [`Dataset`](crate::Dataset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Temperature,
    Diameter,
    SpoolerRpm,
    ScrewRpm,
    HeaterPwm,
    ContactSwitch,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Diameter,
        Metric::Temperature,
        Metric::SpoolerRpm,
        Metric::ScrewRpm,
        Metric::HeaterPwm,
        Metric::ContactSwitch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Diameter => "diameter",
            Metric::SpoolerRpm => "spoolerRpm",
            Metric::ScrewRpm => "screwRpm",
            Metric::HeaterPwm => "heaterPwm",
            Metric::ContactSwitch => "contactSwitch",
        }
    }
}

/// A slot in [`SpoolStats`](crate::SpoolStats).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SpoolMetric {
    WindingDiameter,
    AvgFilamentDiameter,
    WindingCount,
    FilamentMass,
}

impl SpoolMetric {
    pub const ALL: [SpoolMetric; 4] = [
        SpoolMetric::WindingDiameter,
        SpoolMetric::AvgFilamentDiameter,
        SpoolMetric::WindingCount,
        SpoolMetric::FilamentMass,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpoolMetric::WindingDiameter => "windingDiameter",
            SpoolMetric::AvgFilamentDiameter => "avgFilamentDiameter",
            SpoolMetric::WindingCount => "windingCount",
            SpoolMetric::FilamentMass => "filamentMass",
        }
    }
}

/// Simulator columns feeding the live dataset.
pub const TELEMETRY_COLUMNS: [(usize, Metric); 6] = [
    (2, Metric::ScrewRpm),
    (3, Metric::SpoolerRpm),
    (4, Metric::HeaterPwm),
    (5, Metric::Diameter),
    (6, Metric::Temperature),
    (7, Metric::ContactSwitch),
];

/// Simulator columns feeding the in-progress spool statistics.
pub const SPOOL_COLUMNS: [(usize, SpoolMetric); 4] = [
    (8, SpoolMetric::WindingDiameter),
    (9, SpoolMetric::AvgFilamentDiameter),
    (10, SpoolMetric::WindingCount),
    (11, SpoolMetric::FilamentMass),
];

/// Inbound message ids feeding the live dataset.
pub const MESSAGE_IDS: [(u8, Metric); 6] = [
    (ids::DIAMETER, Metric::Diameter),
    (ids::TEMPERATURE, Metric::Temperature),
    (ids::SPOOLER_RPM_READING, Metric::SpoolerRpm),
    (ids::SCREW_RPM_READING, Metric::ScrewRpm),
    (ids::HEATER_PWM_READING, Metric::HeaterPwm),
    (ids::CONTACT_SWITCH, Metric::ContactSwitch),
];

/// The three source tables: telemetry columns, spool columns, message ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    telemetry_columns: Vec<(usize, Metric)>,
    spool_columns: Vec<(usize, SpoolMetric)>,
    message_ids: Vec<(u8, Metric)>,
}

impl FieldMap {
    /// Build a map from explicit tables. Each table must be one-to-one.
    pub fn new(
        telemetry_columns: Vec<(usize, Metric)>,
        spool_columns: Vec<(usize, SpoolMetric)>,
        message_ids: Vec<(u8, Metric)>,
    ) -> Result<Self, MappingError> {
        check_one_to_one("telemetry column", &telemetry_columns)?;
        check_one_to_one("spool column", &spool_columns)?;
        check_one_to_one("message id", &message_ids)?;
        Ok(Self {
            telemetry_columns,
            spool_columns,
            message_ids,
        })
    }

    pub fn telemetry_columns(&self) -> &[(usize, Metric)] {
        &self.telemetry_columns
    }

    pub fn spool_columns(&self) -> &[(usize, SpoolMetric)] {
        &self.spool_columns
    }

    pub fn message_ids(&self) -> &[(u8, Metric)] {
        &self.message_ids
    }

    /// The metric an inbound message id updates, if any.
    pub fn metric_for_id(&self, id: u8) -> Option<Metric> {
        self.message_ids
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, metric)| *metric)
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            telemetry_columns: TELEMETRY_COLUMNS.to_vec(),
            spool_columns: SPOOL_COLUMNS.to_vec(),
            message_ids: MESSAGE_IDS.to_vec(),
        }
    }
}

fn check_one_to_one<K, V>(table: &'static str, entries: &[(K, V)]) -> Result<(), MappingError>
where
    K: Copy + Eq + Hash + Debug,
    V: Copy + Eq + Hash + Debug,
{
    let mut keys = HashSet::new();
    let mut targets = HashSet::new();
    for (key, target) in entries {
        if !keys.insert(*key) {
            return Err(MappingError::DuplicateKey {
                table,
                key: format!("{key:?}"),
            });
        }
        if !targets.insert(*target) {
            return Err(MappingError::DuplicateTarget {
                table,
                target: format!("{target:?}"),
            });
        }
    }
    Ok(())
}
