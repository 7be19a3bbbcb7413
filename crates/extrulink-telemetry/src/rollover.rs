//! Spool changeover heuristic.
//!
//! A new spool shows up as the filament-mass reading dropping. The winding
//! diameter must have grown past a threshold first, so resets near zero are
//! not taken for a finished spool. There is no debounce: every stats row is
//! judged on its own.

use crate::store::SpoolStats;

/// Winding diameter a spool must exceed before a mass drop counts.
pub const ROLLOVER_MIN_WINDING_DIAMETER: f32 = 12.0;

/// Whether the step from `before` to `after` finished a spool.
pub fn detect(before: &SpoolStats, after: &SpoolStats) -> bool {
    before.filament_mass.value > after.filament_mass.value
        && before.winding_diameter.value > ROLLOVER_MIN_WINDING_DIAMETER
}
