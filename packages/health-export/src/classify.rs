//! Tag classification: assigns every top-level node its table kind and
//! collects frequency statistics in a single pass.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::stats::ExportStats;
use crate::types::{RecordNode, TableTag, Tag};

/// Verbose identifier prefix, e.g. `HKQuantityTypeIdentifierStepCount`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TYPE_PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^HK.*TypeIdentifier(.+)$").expect("valid regex"));

/// Strip the verbose `HK*TypeIdentifier` prefix from a record type.
///
/// Values that don't match the prefix pattern pass through unchanged, so
/// applying this twice gives the same result as applying it once.
///
/// # Examples
/// ```
/// use health_export::classify::abbreviate;
///
/// assert_eq!(abbreviate("HKQuantityTypeIdentifierStepCount"), "StepCount");
/// assert_eq!(abbreviate("HKCategoryTypeIdentifierSleepAnalysis"), "SleepAnalysis");
/// assert_eq!(abbreviate("StepCount"), "StepCount");
/// ```
#[must_use]
pub fn abbreviate(value: &str) -> &str {
    TYPE_PREFIX_PATTERN
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map_or(value, |m| m.as_str())
}

/// Options for the classifier.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierOptions {
    /// Strip the verbose prefix from record types.
    pub abbreviate: bool,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self { abbreviate: true }
    }
}

/// Logical output table: one per record type, plus one each for workouts and
/// activity summaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kind {
    /// Tag whose schema the table uses.
    pub tag: TableTag,
    /// Kind name: the (abbreviated) record type, or the tag name.
    pub name: String,
}

impl Kind {
    /// Kind for a record type.
    #[must_use]
    pub fn record(name: impl Into<String>) -> Self {
        Self {
            tag: TableTag::Record,
            name: name.into(),
        }
    }

    /// Kind for a non-record tag, named after the tag.
    #[must_use]
    pub fn for_tag(tag: TableTag) -> Self {
        Self {
            tag,
            name: tag.as_str().to_string(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A node together with the kind derived for it.
///
/// The raw attributes are never rewritten; the abbreviated record type lives
/// in `kind` and is served through [`ClassifiedNode::attribute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedNode {
    pub node: RecordNode,
    /// `None` for ignored and unexpected tags.
    pub kind: Option<Kind>,
}

impl ClassifiedNode {
    /// Attribute value as it should appear in the node's table.
    ///
    /// For `Record` nodes the `type` attribute resolves to the kind name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        let raw = self.node.attribute(name)?;
        match (&self.node.tag, &self.kind) {
            (Tag::Record, Some(kind)) if name == "type" => Some(kind.name.as_str()),
            _ => Some(raw),
        }
    }
}

/// Result of classifying an export's nodes.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// All nodes in document order.
    pub nodes: Vec<ClassifiedNode>,
    /// Frequency statistics.
    pub stats: ExportStats,
    /// Non-fatal problems, such as unexpected tags.
    pub warnings: Vec<String>,
}

impl Classification {
    /// Discovered kinds: record kinds sorted by name, then workout and
    /// activity summary kinds.
    #[must_use]
    pub fn kinds(&self) -> Vec<Kind> {
        let records = self.stats.record_kind_counts.keys().map(Kind::record);
        let others = self
            .stats
            .other_kind_counts
            .keys()
            .filter_map(|name| name.parse::<TableTag>().ok())
            .map(Kind::for_tag);
        records.chain(others).collect()
    }

    /// Resolve a kind by name, preferring record kinds.
    #[must_use]
    pub fn find_kind(&self, name: &str) -> Option<Kind> {
        if self.stats.record_kind_counts.contains_key(name) {
            return Some(Kind::record(name));
        }
        if self.stats.other_kind_counts.contains_key(name) {
            return name.parse::<TableTag>().ok().map(Kind::for_tag);
        }
        None
    }

    /// Number of nodes assigned to a kind.
    #[must_use]
    pub fn count_for(&self, kind: &Kind) -> usize {
        let counts = match kind.tag {
            TableTag::Record => &self.stats.record_kind_counts,
            _ => &self.stats.other_kind_counts,
        };
        counts.get(&kind.name).copied().unwrap_or(0)
    }

    /// Number of nodes that belong to some table.
    #[must_use]
    pub fn table_node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.kind.is_some()).count()
    }
}

/// Classify nodes, derive kinds and count tags, fields and kinds.
///
/// Single linear scan over nodes and their attributes.
#[must_use]
pub fn classify(nodes: Vec<RecordNode>, options: &ClassifierOptions) -> Classification {
    let mut stats = ExportStats::default();
    let mut warnings = Vec::new();
    let mut classified = Vec::with_capacity(nodes.len());

    for node in nodes {
        bump(&mut stats.tag_counts, node.tag.as_str());
        for name in node.attributes.keys() {
            bump(&mut stats.field_counts, name);
        }

        let kind = match &node.tag {
            Tag::Record => {
                let name = match node.attribute("type") {
                    Some(raw) if options.abbreviate => abbreviate(raw).to_string(),
                    Some(raw) => raw.to_string(),
                    None => {
                        warnings.push("Record node without type attribute.".to_string());
                        tracing::warn!("Record node without type attribute");
                        TableTag::Record.as_str().to_string()
                    }
                };
                bump(&mut stats.record_kind_counts, &name);
                Some(Kind::record(name))
            }
            Tag::Workout | Tag::ActivitySummary => {
                bump(&mut stats.other_kind_counts, node.tag.as_str());
                node.tag.table_tag().map(Kind::for_tag)
            }
            Tag::Export | Tag::Me => None,
            Tag::Other(name) => {
                warnings.push(format!("Unexpected node of type {name}."));
                tracing::warn!(tag = %name, "Unexpected node, excluded from all tables");
                None
            }
        };

        classified.push(ClassifiedNode { node, kind });
    }

    Classification {
        nodes: classified,
        stats,
        warnings,
    }
}

fn bump(counts: &mut BTreeMap<String, usize>, key: &str) {
    *counts.entry(key.to_string()).or_insert(0) += 1;
}
