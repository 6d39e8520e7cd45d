//! Schema configuration for health-data exports.

use super::registry::SchemaRegistry;
use crate::types::{FieldSpec, TableTag};

/// Columns of every `Record`-derived table.
pub const RECORD_FIELDS: &[FieldSpec] = &[
    FieldSpec::string("sourceName"),
    FieldSpec::string("sourceVersion"),
    FieldSpec::string("device"),
    FieldSpec::string("type"),
    FieldSpec::string("unit"),
    FieldSpec::datetime("creationDate"),
    FieldSpec::datetime("startDate"),
    FieldSpec::datetime("endDate"),
    FieldSpec::number("value"),
];

/// Columns of the `ActivitySummary` table.
///
/// Exercise time and its goal are strings in the export, not numbers.
pub const ACTIVITY_SUMMARY_FIELDS: &[FieldSpec] = &[
    FieldSpec::datetime("dateComponents"),
    FieldSpec::number("activeEnergyBurned"),
    FieldSpec::number("activeEnergyBurnedGoal"),
    FieldSpec::string("activeEnergyBurnedUnit"),
    FieldSpec::string("appleExerciseTime"),
    FieldSpec::string("appleExerciseTimeGoal"),
    FieldSpec::number("appleStandHours"),
    FieldSpec::number("appleStandHoursGoal"),
];

/// Columns of the `Workout` table.
pub const WORKOUT_FIELDS: &[FieldSpec] = &[
    FieldSpec::string("sourceName"),
    FieldSpec::string("sourceVersion"),
    FieldSpec::string("device"),
    FieldSpec::datetime("creationDate"),
    FieldSpec::datetime("startDate"),
    FieldSpec::datetime("endDate"),
    FieldSpec::string("workoutActivityType"),
    FieldSpec::number("duration"),
    FieldSpec::string("durationUnit"),
    FieldSpec::number("totalDistance"),
    FieldSpec::string("totalDistanceUnit"),
    FieldSpec::number("totalEnergyBurned"),
    FieldSpec::string("totalEnergyBurnedUnit"),
];

/// Create the schema registry for health-data exports.
///
/// ```text
/// Record           -> RECORD_FIELDS            (one table per record type)
/// Workout          -> WORKOUT_FIELDS           (single table)
/// ActivitySummary  -> ACTIVITY_SUMMARY_FIELDS  (single table)
/// ```
#[must_use]
pub fn create_health_schema_registry() -> SchemaRegistry {
    SchemaRegistry::from_schemas([
        (TableTag::Record, RECORD_FIELDS),
        (TableTag::Workout, WORKOUT_FIELDS),
        (TableTag::ActivitySummary, ACTIVITY_SUMMARY_FIELDS),
    ])
}
