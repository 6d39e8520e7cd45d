//! Schema registry mapping table tags to ordered field lists.

use std::collections::HashMap;

use crate::error::{ExportError, Result};
use crate::types::{FieldSpec, TableTag};

/// Read-only registry of table schemas.
///
/// Built once at startup; there is no way to alter a schema after
/// construction.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<TableTag, &'static [FieldSpec]>,
}

impl SchemaRegistry {
    /// Build a registry from `(tag, fields)` pairs.
    #[must_use]
    pub fn from_schemas(
        schemas: impl IntoIterator<Item = (TableTag, &'static [FieldSpec])>,
    ) -> Self {
        Self {
            schemas: schemas.into_iter().collect(),
        }
    }

    /// Get the ordered fields for a table tag.
    ///
    /// Returns an empty slice for a tag that was not registered.
    #[must_use]
    pub fn schema(&self, tag: TableTag) -> &'static [FieldSpec] {
        self.schemas.get(&tag).copied().unwrap_or_default()
    }

    /// Get the ordered fields for a tag given by name.
    ///
    /// # Errors
    /// `ExportError::UnknownSchema` if the name is not a registered tag.
    pub fn fields_for(&self, tag: &str) -> Result<&'static [FieldSpec]> {
        let table_tag: TableTag = tag.parse()?;
        self.schemas
            .get(&table_tag)
            .copied()
            .ok_or_else(|| ExportError::UnknownSchema(tag.to_string()))
    }

    /// Column names of a tag's schema, in order.
    #[must_use]
    pub fn header(&self, tag: TableTag) -> Vec<&'static str> {
        self.schema(tag).iter().map(|f| f.name).collect()
    }

    /// Check if a schema is registered for a tag.
    #[must_use]
    pub fn has_schema(&self, tag: TableTag) -> bool {
        self.schemas.contains_key(&tag)
    }
}
