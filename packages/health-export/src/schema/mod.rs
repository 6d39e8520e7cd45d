//! Table schemas for the export's record-bearing tags.
//!
//! Every kind discovered under a tag shares that tag's schema; the kind only
//! decides which rows land in which table.

mod config;
mod registry;

pub use config::{
    create_health_schema_registry, ACTIVITY_SUMMARY_FIELDS, RECORD_FIELDS, WORKOUT_FIELDS,
};
pub use registry::SchemaRegistry;
