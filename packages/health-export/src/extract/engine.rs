//! Extraction engine that renders classified nodes into per-kind tables.

use std::io::Write;

use super::projection::TableView;
use super::table::{write_line, Table};
use crate::classify::{Classification, ClassifiedNode, Kind};
use crate::error::Result;
use crate::format::format_field;
use crate::schema::SchemaRegistry;
use crate::types::{FieldSpec, TableTag};

/// Engine for extracting one kind's table at a time.
///
/// Holds the classified nodes read-only; any number of kinds can be
/// extracted, in any order, from the same engine.
pub struct ExtractionEngine<'a> {
    classification: &'a Classification,
    registry: &'a SchemaRegistry,
    view: TableView,
}

impl<'a> ExtractionEngine<'a> {
    /// Create a new engine.
    ///
    /// # Errors
    /// `ExportError::InvalidProjection` if the view's projection does not
    /// fit the registry's schemas.
    pub fn new(
        classification: &'a Classification,
        registry: &'a SchemaRegistry,
        view: TableView,
    ) -> Result<Self> {
        if let TableView::Projected(config) = &view {
            config.validate(registry)?;
        }
        Ok(Self {
            classification,
            registry,
            view,
        })
    }

    /// Header for a tag's tables under the active view.
    #[must_use]
    pub fn header(&self, tag: TableTag) -> Vec<String> {
        match self.view.projection(tag) {
            Some(projection) => projection.headers.clone(),
            None => self
                .registry
                .schema(tag)
                .iter()
                .map(|f| f.name.to_string())
                .collect(),
        }
    }

    /// Lazily format the rows of a kind, in document order.
    pub fn rows<'s>(&'s self, kind: &'s Kind) -> impl Iterator<Item = Vec<String>> + 's {
        let fields = self.visible_fields(kind.tag);
        let nodes: &'s [ClassifiedNode] = &self.classification.nodes;
        nodes
            .iter()
            .filter(move |node| node.kind.as_ref() == Some(kind))
            .map(move |node| format_row(node, fields))
    }

    /// Build the full table for a kind.
    ///
    /// A kind with no matching nodes yields a header-only table.
    #[must_use]
    pub fn extract(&self, kind: &Kind) -> Table {
        Table {
            kind: kind.clone(),
            header: self.header(kind.tag),
            rows: self.rows(kind).collect(),
        }
    }

    /// Build the table for a kind given by name.
    ///
    /// Names the classifier never saw are treated as record kinds with no
    /// rows.
    #[must_use]
    pub fn extract_named(&self, name: &str) -> Table {
        let kind = self
            .classification
            .find_kind(name)
            .unwrap_or_else(|| Kind::record(name));
        self.extract(&kind)
    }

    /// Stream a kind's table to a writer without building it in memory.
    ///
    /// Returns the number of data rows written.
    pub fn write_table(&self, kind: &Kind, mut writer: impl Write) -> Result<usize> {
        write_line(&mut writer, &self.header(kind.tag))?;
        let mut count = 0;
        for row in self.rows(kind) {
            write_line(&mut writer, &row)?;
            count += 1;
        }
        writer.flush()?;
        Ok(count)
    }

    /// Schema fields that survive the active projection.
    fn visible_fields(&self, tag: TableTag) -> &'static [FieldSpec] {
        let fields = self.registry.schema(tag);
        match self.view.projection(tag) {
            Some(projection) => &fields[projection.skip_leading.min(fields.len())..],
            None => fields,
        }
    }
}

/// Format one node in schema order, independent of attribute order.
fn format_row(node: &ClassifiedNode, fields: &[FieldSpec]) -> Vec<String> {
    fields
        .iter()
        .map(|field| format_field(node.attribute(field.name), field.field_type))
        .collect()
}
