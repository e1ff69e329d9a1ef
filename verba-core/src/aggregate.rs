//! Cross-file reduction of pair analyses.
//!
//! Every accumulator here is an explicit value that is built per pair (or per
//! worker) and combined by key-wise summation. `merge` is commutative and
//! associative, so a batch can be split across workers in any way and the
//! partial aggregates combined in any order.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::align::{AlignmentChunk, ChunkKind, EditCounts};
use crate::analysis::{ChannelAnalysis, PairAnalysis};
use crate::report::{AlignmentDump, BatchReport};

/// Label used for an absent word in exported tables.
pub const NIL_LABEL: &str = "NIL";

/// One side of a confusion key: a word, or nothing (insertion source /
/// deletion destination).
///
/// Normalized words are always lower-case, so the upper-case `NIL` label can
/// never collide with a real word at the serialization boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Word(String),
    Absent,
}

impl Slot {
    pub fn word(word: impl Into<String>) -> Self {
        Slot::Word(word.into())
    }

    /// Table label: the word itself, or `NIL`.
    pub fn label(&self) -> &str {
        match self {
            Slot::Word(w) => w,
            Slot::Absent => NIL_LABEL,
        }
    }

    pub fn from_label(label: &str) -> Self {
        if label == NIL_LABEL || label.is_empty() {
            Slot::Absent
        } else {
            Slot::Word(label.to_string())
        }
    }

    pub fn as_word(&self) -> Option<&str> {
        match self {
            Slot::Word(w) => Some(w),
            Slot::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Slot::Absent)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Slot::from_label(&raw))
    }
}

/// Confusion table category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Correct,
    Substitutions,
    Deletions,
    Insertions,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Correct,
        Category::Substitutions,
        Category::Deletions,
        Category::Insertions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Correct => "Correct",
            Category::Substitutions => "Substitutions",
            Category::Deletions => "Deletions",
            Category::Insertions => "Insertions",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.as_str() == raw)
    }

    /// Error type of the `errors_context` rows behind this category.
    pub fn error_kind(self) -> Option<ChunkKind> {
        match self {
            Category::Correct => None,
            Category::Substitutions => Some(ChunkKind::Substitute),
            Category::Deletions => Some(ChunkKind::Delete),
            Category::Insertions => Some(ChunkKind::Insert),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `word_errors` row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfusionEntry {
    #[serde(rename = "Source")]
    pub source: Slot,
    #[serde(rename = "Destination")]
    pub destination: Slot,
    #[serde(rename = "Count")]
    pub count: u64,
    #[serde(rename = "Category")]
    pub category: Category,
}

/// Word-level confusion counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    correct: HashMap<String, u64>,
    substitutions: HashMap<(String, String), u64>,
    deletions: HashMap<String, u64>,
    insertions: HashMap<String, u64>,
}

impl ConfusionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild counters from table rows (e.g. a re-loaded `word_errors`).
    ///
    /// Rows with a NIL on the wrong side for their category are ignored.
    pub fn from_entries(entries: &[ConfusionEntry]) -> Self {
        let mut counts = Self::default();
        for entry in entries {
            match (entry.category, entry.source.as_word(), entry.destination.as_word()) {
                (Category::Correct, Some(word), _) => {
                    bump(&mut counts.correct, word.to_string(), entry.count)
                }
                (Category::Substitutions, Some(src), Some(dst)) => bump(
                    &mut counts.substitutions,
                    (src.to_string(), dst.to_string()),
                    entry.count,
                ),
                (Category::Deletions, Some(word), None) => {
                    bump(&mut counts.deletions, word.to_string(), entry.count)
                }
                (Category::Insertions, None, Some(word)) => {
                    bump(&mut counts.insertions, word.to_string(), entry.count)
                }
                _ => {}
            }
        }
        counts
    }

    /// Count every aligned position of one channel alignment.
    pub fn record_alignment<S: AsRef<str>>(
        &mut self,
        reference: &[S],
        hypothesis: &[S],
        chunks: &[AlignmentChunk],
    ) {
        for chunk in chunks {
            match chunk.kind {
                ChunkKind::Equal => {
                    for i in chunk.reference.clone() {
                        bump(&mut self.correct, reference[i].as_ref().to_string(), 1);
                    }
                }
                ChunkKind::Substitute => {
                    for (i, j) in chunk.reference.clone().zip(chunk.hypothesis.clone()) {
                        let key = (
                            reference[i].as_ref().to_string(),
                            hypothesis[j].as_ref().to_string(),
                        );
                        bump(&mut self.substitutions, key, 1);
                    }
                }
                ChunkKind::Delete => {
                    for i in chunk.reference.clone() {
                        bump(&mut self.deletions, reference[i].as_ref().to_string(), 1);
                    }
                }
                ChunkKind::Insert => {
                    for j in chunk.hypothesis.clone() {
                        bump(&mut self.insertions, hypothesis[j].as_ref().to_string(), 1);
                    }
                }
            }
        }
    }

    /// Key-wise sum of `other` into `self`.
    pub fn merge(&mut self, other: ConfusionCounts) {
        for (k, v) in other.correct {
            bump(&mut self.correct, k, v);
        }
        for (k, v) in other.substitutions {
            bump(&mut self.substitutions, k, v);
        }
        for (k, v) in other.deletions {
            bump(&mut self.deletions, k, v);
        }
        for (k, v) in other.insertions {
            bump(&mut self.insertions, k, v);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.correct.is_empty()
            && self.substitutions.is_empty()
            && self.deletions.is_empty()
            && self.insertions.is_empty()
    }

    /// Summed counters across all keys.
    pub fn totals(&self) -> EditCounts {
        EditCounts {
            hits: self.correct.values().sum(),
            substitutions: self.substitutions.values().sum(),
            deletions: self.deletions.values().sum(),
            insertions: self.insertions.values().sum(),
        }
    }

    /// Table rows sorted by `(Source, Destination)` labels.
    pub fn entries(&self) -> Vec<ConfusionEntry> {
        let mut rows = Vec::with_capacity(
            self.correct.len()
                + self.substitutions.len()
                + self.deletions.len()
                + self.insertions.len(),
        );
        for (word, &count) in &self.correct {
            rows.push(ConfusionEntry {
                source: Slot::word(word.as_str()),
                destination: Slot::word(word.as_str()),
                count,
                category: Category::Correct,
            });
        }
        for (word, &count) in &self.deletions {
            rows.push(ConfusionEntry {
                source: Slot::word(word.as_str()),
                destination: Slot::Absent,
                count,
                category: Category::Deletions,
            });
        }
        for ((src, dst), &count) in &self.substitutions {
            rows.push(ConfusionEntry {
                source: Slot::word(src.as_str()),
                destination: Slot::word(dst.as_str()),
                count,
                category: Category::Substitutions,
            });
        }
        for (word, &count) in &self.insertions {
            rows.push(ConfusionEntry {
                source: Slot::Absent,
                destination: Slot::word(word.as_str()),
                count,
                category: Category::Insertions,
            });
        }
        rows.sort_by(|a, b| {
            a.source
                .label()
                .cmp(b.source.label())
                .then_with(|| a.destination.label().cmp(b.destination.label()))
        });
        rows
    }
}

fn bump<K: std::hash::Hash + Eq>(map: &mut HashMap<K, u64>, key: K, by: u64) {
    *map.entry(key).or_insert(0) += by;
}

/// Running reduction over analysed file pairs.
///
/// Each pushed pair carries its input ordinal so the final tables follow
/// input order no matter which worker analysed it or in which order the
/// partials were merged.
#[derive(Debug, Default)]
pub struct BatchAggregate {
    confusion: ConfusionCounts,
    files: Vec<(usize, String, Vec<ChannelAnalysis>)>,
}

impl BatchAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ordinal: usize, analysis: PairAnalysis) {
        self.confusion.merge(analysis.confusion);
        self.files.push((ordinal, analysis.file_id, analysis.channels));
    }

    pub fn merge(&mut self, other: BatchAggregate) {
        self.confusion.merge(other.confusion);
        self.files.extend(other.files);
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn confusion(&self) -> &ConfusionCounts {
        &self.confusion
    }

    /// Assemble the exported tables.
    pub fn finish(mut self) -> BatchReport {
        self.files.sort_by_key(|(ordinal, _, _)| *ordinal);

        let mut report = BatchReport {
            word_errors: self.confusion.entries(),
            ..BatchReport::default()
        };
        for (_, file_id, channels) in self.files {
            for channel in channels {
                if let Some(text) = channel.alignment {
                    report.alignments.push(AlignmentDump {
                        file_id: file_id.clone(),
                        channel: channel.stats.channel,
                        text,
                    });
                }
                report.stats.push(channel.stats);
                report.errors.extend(channel.errors);
            }
        }
        report
    }
}
