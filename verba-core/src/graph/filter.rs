//! Filtering and drill-down over exported tables.

use serde::{Deserialize, Serialize};

use crate::aggregate::{Category, ConfusionCounts, ConfusionEntry};
use crate::analysis::ErrorRecord;

/// Row filter over a confusion table. Every set criterion must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfusionFilter {
    /// Categories to keep. Empty keeps every category.
    pub categories: Vec<Category>,
    /// Substring the source word must contain. Never matches `NIL`.
    pub source_contains: Option<String>,
    /// Substring the destination word must contain. Never matches `NIL`.
    pub destination_contains: Option<String>,
    /// Inclusive lower bound on `Count`.
    pub min_count: Option<u64>,
    /// Inclusive upper bound on `Count`.
    pub max_count: Option<u64>,
}

impl ConfusionFilter {
    pub fn matches(&self, entry: &ConfusionEntry) -> bool {
        let contains = |needle: &Option<String>, word: Option<&str>| match needle.as_deref() {
            None | Some("") => true,
            Some(needle) => word.is_some_and(|w| w.contains(needle)),
        };

        (self.categories.is_empty() || self.categories.contains(&entry.category))
            && contains(&self.source_contains, entry.source.as_word())
            && contains(&self.destination_contains, entry.destination.as_word())
            && self.min_count.map_or(true, |min| entry.count >= min)
            && self.max_count.map_or(true, |max| entry.count <= max)
    }

    pub fn apply(&self, entries: &[ConfusionEntry]) -> Vec<ConfusionEntry> {
        entries.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}

/// Which side of the table a selected word is looked up on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordMode {
    /// Match the `Source` (reference) column.
    #[default]
    Reference,
    /// Match the `Destination` (hypothesis) column.
    Hypothesis,
}

/// Rows whose source (reference mode) or destination (hypothesis mode)
/// equals `word`. An empty word selects nothing.
pub fn select_word(entries: &[ConfusionEntry], word: &str, mode: WordMode) -> Vec<ConfusionEntry> {
    if word.is_empty() {
        return Vec::new();
    }
    entries
        .iter()
        .filter(|e| {
            let side = match mode {
                WordMode::Reference => &e.source,
                WordMode::Hypothesis => &e.destination,
            };
            side.as_word() == Some(word)
        })
        .cloned()
        .collect()
}

/// Split a comma-separated keyword list. Blank entries are dropped.
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Headline numbers of a confusion table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionSummary {
    pub word_error_rate: f64,
    /// Reference words: correct + substitutions + deletions.
    pub total_words: u64,
    /// Substitutions + deletions + insertions.
    pub total_errors: u64,
    pub correct: u64,
    pub substitutions: u64,
    pub deletions: u64,
    pub insertions: u64,
}

impl ConfusionSummary {
    pub fn from_entries(entries: &[ConfusionEntry]) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            match entry.category {
                Category::Correct => summary.correct += entry.count,
                Category::Substitutions => summary.substitutions += entry.count,
                Category::Deletions => summary.deletions += entry.count,
                Category::Insertions => summary.insertions += entry.count,
            }
        }
        summary.total_words = summary.correct + summary.substitutions + summary.deletions;
        summary.total_errors = summary.substitutions + summary.deletions + summary.insertions;
        if summary.total_words > 0 {
            summary.word_error_rate = summary.total_errors as f64 / summary.total_words as f64;
        }
        summary
    }

    pub fn from_counts(counts: &ConfusionCounts) -> Self {
        Self::from_entries(&counts.entries())
    }
}

/// Drill-down from a confusion row to the individual error records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorQuery {
    pub category: Category,
    pub source_word: Option<String>,
    pub destination_word: Option<String>,
}

impl ErrorQuery {
    /// Matching records, in table order.
    ///
    /// Words are compared after trimming the alignment padding. The source
    /// word constrains deletions and substitutions, the destination word
    /// insertions and substitutions. A query with neither word, or for the
    /// `Correct` category, selects nothing.
    pub fn select<'a>(&self, errors: &'a [ErrorRecord]) -> Vec<&'a ErrorRecord> {
        let Some(kind) = self.category.error_kind() else {
            return Vec::new();
        };
        let source = self.source_word.as_deref().filter(|w| !w.is_empty());
        let destination = self.destination_word.as_deref().filter(|w| !w.is_empty());
        if source.is_none() && destination.is_none() {
            return Vec::new();
        }

        let by_source = matches!(self.category, Category::Deletions | Category::Substitutions);
        let by_destination = matches!(
            self.category,
            Category::Insertions | Category::Substitutions
        );

        errors
            .iter()
            .filter(|r| r.error_type == kind)
            .filter(|r| !by_source || source.map_or(true, |w| r.ref_word.trim() == w))
            .filter(|r| !by_destination || destination.map_or(true, |w| r.hyp_word.trim() == w))
            .collect()
    }
}
