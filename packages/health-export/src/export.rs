//! Export service that ties parsing, classification, extraction and
//! publishing together.

use std::collections::HashSet;
use std::time::Instant;

use serde::Serialize;

use crate::classify::{classify, Classification, ClassifierOptions, Kind};
use crate::config::{table_key, validate_container, TABLE_EXTENSION};
use crate::error::{ExportError, Result};
use crate::extract::{ExtractionEngine, TableView};
use crate::schema::create_health_schema_registry;
use crate::stats::ExportStats;
use crate::store::{publish_with_retry, BlobLocation, BlobSink, BlobSource, RetryPolicy};
use crate::xml::read_nodes;

/// Knobs for one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub view: TableView,
    pub classifier: ClassifierOptions,
    pub retry: RetryPolicy,
    /// Stop between kinds once this instant has passed.
    pub deadline: Option<Instant>,
}

/// One table that reached the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedTable {
    pub kind: String,
    pub container: String,
    pub key: String,
    /// Data rows, header excluded.
    pub rows: usize,
}

/// Outcome of a completed export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    /// Published tables, in publish order.
    pub published: Vec<PublishedTable>,
    pub stats: ExportStats,
    /// Non-fatal problems found while classifying.
    pub warnings: Vec<String>,
}

impl ExportSummary {
    /// Total data rows across all published tables.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.published.iter().map(|t| t.rows).sum()
    }
}

/// Parse and classify an export document.
///
/// # Errors
/// `ExportError::MalformedInput` if the bytes are not a well-formed document.
pub fn parse_export(bytes: &[u8], options: &ClassifierOptions) -> Result<Classification> {
    let nodes = read_nodes(bytes)?;
    Ok(classify(nodes, options))
}

/// Turn an export document into one published table per discovered kind.
///
/// Nothing is published unless the whole document parses. Each table is
/// built in full before it is handed to the sink, so a sink never sees a
/// partial table.
///
/// # Errors
/// - `MalformedInput` before anything is published
/// - `InvalidProjection` if the view does not fit the schemas
/// - `Sink` once a table's publish retries run out
/// - `DeadlineExceeded` if the deadline passes between kinds
pub fn export_tables(
    bytes: &[u8],
    sink: &dyn BlobSink,
    container: &str,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    validate_container(container)?;

    let classification = parse_export(bytes, &options.classifier)?;
    let registry = create_health_schema_registry();
    let engine = ExtractionEngine::new(&classification, &registry, options.view.clone())?;

    let kinds = classification.kinds();
    tracing::info!(
        kinds = kinds.len(),
        nodes = classification.nodes.len(),
        warnings = classification.warnings.len(),
        "Classified export"
    );

    let mut published = Vec::with_capacity(kinds.len());
    let mut used_keys = HashSet::new();

    for kind in &kinds {
        if options.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            tracing::warn!(
                published = published.len(),
                remaining = kinds.len() - published.len(),
                "Deadline passed, stopping export"
            );
            return Err(ExportError::DeadlineExceeded {
                published: published.len(),
            });
        }

        let table = engine.extract(kind);
        let location = BlobLocation::new(container, unique_key(kind, &mut used_keys))?;

        publish_with_retry(sink, &location, table.to_csv().as_bytes(), options.retry)?;
        tracing::info!(kind = %kind, location = %location, rows = table.len(), "Published table");

        published.push(PublishedTable {
            kind: kind.name.clone(),
            container: location.container,
            key: location.key,
            rows: table.len(),
        });
    }

    Ok(ExportSummary {
        published,
        stats: classification.stats,
        warnings: classification.warnings,
    })
}

/// Fetch an export from a source, then run [`export_tables`] on it.
pub fn export_from_source(
    source: &dyn BlobSource,
    input: &BlobLocation,
    sink: &dyn BlobSink,
    container: &str,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let bytes = source.fetch(input)?;
    tracing::info!(input = %input, bytes = bytes.len(), "Fetched export");
    export_tables(&bytes, sink, container, options)
}

/// Key for a kind, never one an earlier kind already took.
///
/// A taken key is prefixed with the kind's tag; if that is taken too, a
/// counter is added to the stem.
fn unique_key(kind: &Kind, used: &mut HashSet<String>) -> String {
    let key = table_key(&kind.name);
    if used.insert(key.clone()) {
        return key;
    }
    let qualified = format!("{}-{key}", kind.tag);
    if used.insert(qualified.clone()) {
        return qualified;
    }
    let stem = qualified.strip_suffix(TABLE_EXTENSION).unwrap_or(&qualified);
    let mut n = 2usize;
    loop {
        let candidate = format!("{stem}-{n}{TABLE_EXTENSION}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
