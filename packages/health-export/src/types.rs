//! Core data types for the extractor.
//!
//! These types represent the top-level elements of a health-data export
//! and the field layout of the tables derived from them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::ExportError;

/// Tag of a top-level export element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Timestamped measurement with a `type` attribute.
    Record,
    /// Workout session.
    Workout,
    /// Daily activity ring summary.
    ActivitySummary,
    /// Export metadata element.
    Export,
    /// Personal characteristics element.
    Me,
    /// Anything else.
    Other(String),
}

impl Tag {
    /// Classify a tag name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "Record" => Self::Record,
            "Workout" => Self::Workout,
            "ActivitySummary" => Self::ActivitySummary,
            "Export" => Self::Export,
            "Me" => Self::Me,
            other => Self::Other(other.to_string()),
        }
    }

    /// The tag name as it appears in the document.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Record => "Record",
            Self::Workout => "Workout",
            Self::ActivitySummary => "ActivitySummary",
            Self::Export => "Export",
            Self::Me => "Me",
            Self::Other(name) => name,
        }
    }

    /// The table tag this element produces rows for, if any.
    #[must_use]
    pub fn table_tag(&self) -> Option<TableTag> {
        match self {
            Self::Record => Some(TableTag::Record),
            Self::Workout => Some(TableTag::Workout),
            Self::ActivitySummary => Some(TableTag::ActivitySummary),
            _ => None,
        }
    }

    /// Whether the tag is known but carries no table data.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Export | Self::Me)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tags that own a table schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum TableTag {
    Record,
    Workout,
    ActivitySummary,
}

impl TableTag {
    pub const ALL: [TableTag; 3] = [Self::Record, Self::Workout, Self::ActivitySummary];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Record => "Record",
            Self::Workout => "Workout",
            Self::ActivitySummary => "ActivitySummary",
        }
    }
}

impl FromStr for TableTag {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Record" => Ok(Self::Record),
            "Workout" => Ok(Self::Workout),
            "ActivitySummary" => Ok(Self::ActivitySummary),
            other => Err(ExportError::UnknownSchema(other.to_string())),
        }
    }
}

impl fmt::Display for TableTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic type of a table field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Quoted and escaped.
    String,
    /// Bare token.
    Number,
    /// Bare token.
    DateTime,
}

impl FieldType {
    /// Single-letter type code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::String => "s",
            Self::Number => "n",
            Self::DateTime => "d",
        }
    }
}

impl FromStr for FieldType {
    type Err = ExportError;

    /// Parse a type code (`s`, `n`, `d`) or its long name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" | "string" => Ok(Self::String),
            "n" | "number" => Ok(Self::Number),
            "d" | "datetime" => Ok(Self::DateTime),
            other => Err(ExportError::UnsupportedType(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

/// One column of a table schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Attribute name read from the element.
    pub name: &'static str,
    /// How the attribute value is rendered.
    pub field_type: FieldType,
}

impl FieldSpec {
    #[must_use]
    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::String,
        }
    }

    #[must_use]
    pub const fn number(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::Number,
        }
    }

    #[must_use]
    pub const fn datetime(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::DateTime,
        }
    }
}

/// One top-level element of the export, detached from the XML tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordNode {
    /// Element tag.
    pub tag: Tag,
    /// Raw attribute values by name.
    pub attributes: HashMap<String, String>,
}

impl RecordNode {
    /// Create a node with no attributes.
    #[must_use]
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute (builder style).
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Get a raw attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}
