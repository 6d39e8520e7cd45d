//! Health Export - Convert a personal health-data XML export into CSV tables.
//!
//! This crate reads the XML document a phone's health app exports, sorts its
//! top-level elements into kinds (one per record type, plus workouts and
//! activity summaries) and publishes one CSV table per kind to a blob store.
//!
//! # Example
//!
//! ```
//! use health_export::export::{export_tables, ExportOptions};
//! use health_export::store::{BlobLocation, MemoryStore};
//!
//! let xml = br#"<HealthData>
//!   <Record type="HKQuantityTypeIdentifierStepCount" unit="count" value="120"/>
//! </HealthData>"#;
//! let sink = MemoryStore::new();
//!
//! let summary = export_tables(xml, &sink, "health", &ExportOptions::default()).unwrap();
//! assert_eq!(summary.published[0].key, "StepCount.csv");
//! assert!(sink.get(&BlobLocation::new("health", "StepCount.csv").unwrap()).is_some());
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration constants, validation and environment settings
//! - [`types`]: Core data types (Tag, FieldType, RecordNode, etc.)
//! - [`error`]: Error types and Result alias
//! - [`schema`]: Table schemas per tag
//! - [`format`]: Field value formatting and the table reader
//! - [`xml`]: XML reading
//! - [`classify`]: Tag classification and kind derivation
//! - [`stats`]: Frequency statistics and their report
//! - [`extract`]: Extraction engine and column projections
//! - [`store`]: Blob sources and sinks
//! - [`export`]: Export service tying everything together
//! - [`aggregate`]: Daily totals over a produced table
//! - [`cli`]: Command-line interface

pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod format;
pub mod schema;
pub mod stats;
pub mod store;
pub mod types;
pub mod xml;

// Re-export main functions
pub use export::{export_from_source, export_tables, parse_export};

// Re-export commonly used items
pub use classify::{classify, Classification, ClassifierOptions, Kind};
pub use error::{ExportError, Result};
pub use extract::{ExtractionEngine, ProjectionConfig, Table, TableView};
pub use schema::{create_health_schema_registry, SchemaRegistry};
pub use types::{FieldSpec, FieldType, RecordNode, TableTag, Tag};
