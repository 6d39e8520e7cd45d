//! Frequency statistics collected by the classifier, and their text report.
//!
//! Diagnostics only; nothing downstream reads these counts back.

use std::collections::BTreeMap;

use serde::Serialize;

/// Counts gathered while classifying an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    /// Occurrences of each tag.
    pub tag_counts: BTreeMap<String, usize>,
    /// Occurrences of each attribute name across all nodes.
    pub field_counts: BTreeMap<String, usize>,
    /// Occurrences of each (abbreviated) record type.
    pub record_kind_counts: BTreeMap<String, usize>,
    /// Occurrences of `Workout` and `ActivitySummary`.
    pub other_kind_counts: BTreeMap<String, usize>,
}

impl ExportStats {
    /// Render all counts as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        format!(
            "Tags:\n{}\n\nFields:\n{}\n\nRecord types:\n{}\n\nOther types:\n{}\n",
            format_freqs(&self.tag_counts),
            format_freqs(&self.field_counts),
            format_freqs(&self.record_kind_counts),
            format_freqs(&self.other_kind_counts),
        )
    }
}

/// Format counts as `key: count` lines sorted by key.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use health_export::stats::format_freqs;
///
/// let counts = BTreeMap::from([("Workout".to_string(), 2), ("Record".to_string(), 10)]);
/// assert_eq!(format_freqs(&counts), "Record: 10\nWorkout: 2");
/// ```
#[must_use]
pub fn format_freqs(counts: &BTreeMap<String, usize>) -> String {
    counts
        .iter()
        .map(|(key, count)| format!("{key}: {count}"))
        .collect::<Vec<_>>()
        .join("\n")
}
