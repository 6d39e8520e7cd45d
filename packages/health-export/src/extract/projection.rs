//! Column projection: emit only a trailing subset of a schema's columns
//! under caller-chosen header names.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ExportError, Result};
use crate::schema::SchemaRegistry;
use crate::types::TableTag;

/// Trailing-columns projection for one table tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Projection {
    /// Number of leading schema fields dropped from every row.
    pub skip_leading: usize,
    /// Header names for the remaining columns, in schema order.
    pub headers: Vec<String>,
}

/// Projections keyed by table tag.
///
/// Loaded from YAML shaped like:
///
/// ```yaml
/// Record:
///   skip_leading: 3
///   headers: [activity, unit, time, starttime, endtime, value]
/// ```
///
/// Tags without an entry render with their full schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ProjectionConfig {
    tables: BTreeMap<TableTag, Projection>,
}

impl ProjectionConfig {
    /// Add or replace the projection for a tag.
    #[must_use]
    pub fn with_projection(mut self, tag: TableTag, projection: Projection) -> Self {
        self.tables.insert(tag, projection);
        self
    }

    /// Record tables without source and device columns:
    /// `activity,unit,time,starttime,endtime,value`.
    #[must_use]
    pub fn trailing_record_columns() -> Self {
        Self::default().with_projection(
            TableTag::Record,
            Projection {
                skip_leading: 3,
                headers: ["activity", "unit", "time", "starttime", "endtime", "value"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
        )
    }

    /// Parse from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Projection for a tag, if one is configured.
    #[must_use]
    pub fn get(&self, tag: TableTag) -> Option<&Projection> {
        self.tables.get(&tag)
    }

    /// Check every projection against its schema.
    ///
    /// # Errors
    /// `ExportError::InvalidProjection` if a projection would drop every
    /// column, or if its header count differs from the number of columns
    /// it keeps.
    pub fn validate(&self, registry: &SchemaRegistry) -> Result<()> {
        for (tag, projection) in &self.tables {
            let field_count = registry.schema(*tag).len();
            if projection.skip_leading >= field_count {
                return Err(ExportError::InvalidProjection {
                    tag: tag.to_string(),
                    reason: format!(
                        "skip_leading {} leaves no columns of {field_count}",
                        projection.skip_leading
                    ),
                });
            }
            let kept = field_count - projection.skip_leading;
            if projection.headers.len() != kept {
                return Err(ExportError::InvalidProjection {
                    tag: tag.to_string(),
                    reason: format!(
                        "{} header name(s) for {kept} projected column(s)",
                        projection.headers.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Which columns the engine emits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TableView {
    /// Every schema field under its schema name.
    #[default]
    Full,
    /// Trailing columns per tag, as configured.
    Projected(ProjectionConfig),
}

impl TableView {
    /// The active projection for a tag, if any.
    #[must_use]
    pub fn projection(&self, tag: TableTag) -> Option<&Projection> {
        match self {
            Self::Full => None,
            Self::Projected(config) => config.get(tag),
        }
    }
}
