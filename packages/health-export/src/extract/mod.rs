//! Extraction engine: turns classified nodes into one table per kind.
//!
//! Tables are produced one kind at a time. A caller iterates the kinds
//! discovered by the classifier and extracts (or streams) each in turn.

mod engine;
mod projection;
mod table;

pub use engine::ExtractionEngine;
pub use projection::{Projection, ProjectionConfig, TableView};
pub use table::{write_line, Table};
