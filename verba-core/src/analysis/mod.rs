//! Per-position error extraction over an alignment.
//!
//! An alignment is first expanded into a *padded view*: one column per
//! aligned position, with both sides padded to the same width so the
//! reference and hypothesis rows line up character for character. Missing
//! words become asterisks as wide as the word on the other side; present
//! words are right-aligned to the wider of the pair.
//!
//! Each non-equal column yields one [`ErrorRecord`] whose context windows are
//! read from this padded view, so fillers show up in context exactly as they
//! do in the alignment dump.

pub mod pair;

pub use pair::{ChannelAnalysis, PairAnalysis, PairAnalyzer};

use serde::{Deserialize, Serialize};

use crate::align::{AlignmentChunk, ChunkKind, EditCounts};
use crate::normalize::Channel;

/// Default number of context tokens on each side of an error.
pub const DEFAULT_CONTEXT_RADIUS: usize = 5;

/// One mismatch with its surrounding context (one `errors_context` row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(rename = "filename")]
    pub file_id: String,
    #[serde(rename = "prefix")]
    pub channel: Channel,
    #[serde(rename = "ref_prev")]
    pub ref_context_before: String,
    #[serde(rename = "ref")]
    pub ref_word: String,
    #[serde(rename = "ref_post")]
    pub ref_context_after: String,
    #[serde(rename = "hyp_prev")]
    pub hyp_context_before: String,
    #[serde(rename = "hyp")]
    pub hyp_word: String,
    #[serde(rename = "hyp_post")]
    pub hyp_context_after: String,
    #[serde(rename = "type")]
    pub error_type: ChunkKind,
}

/// Error-rate statistics of one channel of one file pair (one `stats` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairStats {
    #[serde(rename = "id")]
    pub file_id: String,
    #[serde(rename = "prefix")]
    pub channel: Channel,
    #[serde(rename = "wer")]
    pub word_error_rate: f64,
    #[serde(rename = "correct")]
    pub correct_count: u64,
    #[serde(rename = "substitutions")]
    pub substitution_count: u64,
    #[serde(rename = "insertions")]
    pub insertion_count: u64,
    #[serde(rename = "deletions")]
    pub deletion_count: u64,
}

impl PairStats {
    pub fn from_counts(file_id: &str, channel: Channel, counts: EditCounts) -> Self {
        Self {
            file_id: file_id.to_string(),
            channel,
            word_error_rate: counts.wer(),
            correct_count: counts.hits,
            substitution_count: counts.substitutions,
            insertion_count: counts.insertions,
            deletion_count: counts.deletions,
        }
    }

    pub fn counts(&self) -> EditCounts {
        EditCounts {
            hits: self.correct_count,
            substitutions: self.substitution_count,
            deletions: self.deletion_count,
            insertions: self.insertion_count,
        }
    }
}

/// Column-aligned rendering of an alignment, one entry per aligned position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaddedView {
    pub reference: Vec<String>,
    pub hypothesis: Vec<String>,
    pub kinds: Vec<ChunkKind>,
}

impl PaddedView {
    pub fn build<S: AsRef<str>>(
        reference: &[S],
        hypothesis: &[S],
        chunks: &[AlignmentChunk],
    ) -> Self {
        let positions = chunks.iter().map(AlignmentChunk::len).sum();
        let mut view = Self {
            reference: Vec::with_capacity(positions),
            hypothesis: Vec::with_capacity(positions),
            kinds: Vec::with_capacity(positions),
        };

        for chunk in chunks {
            match chunk.kind {
                ChunkKind::Delete => {
                    for i in chunk.reference.clone() {
                        let src = reference[i].as_ref();
                        view.push(src.to_string(), filler(src), chunk.kind);
                    }
                }
                ChunkKind::Insert => {
                    for j in chunk.hypothesis.clone() {
                        let dst = hypothesis[j].as_ref();
                        view.push(filler(dst), dst.to_string(), chunk.kind);
                    }
                }
                ChunkKind::Equal | ChunkKind::Substitute => {
                    for (i, j) in chunk.reference.clone().zip(chunk.hypothesis.clone()) {
                        let src = reference[i].as_ref();
                        let dst = hypothesis[j].as_ref();
                        let width = src.chars().count().max(dst.chars().count());
                        view.push(
                            format!("{src:>width$}"),
                            format!("{dst:>width$}"),
                            chunk.kind,
                        );
                    }
                }
            }
        }

        view
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    fn push(&mut self, reference: String, hypothesis: String, kind: ChunkKind) {
        self.reference.push(reference);
        self.hypothesis.push(hypothesis);
        self.kinds.push(kind);
    }

    /// One record per non-equal position, in position order.
    pub fn extract_errors(
        &self,
        file_id: &str,
        channel: Channel,
        radius: usize,
    ) -> Vec<ErrorRecord> {
        let len = self.len();
        self.kinds
            .iter()
            .enumerate()
            .filter(|(_, kind)| kind.is_error())
            .map(|(i, &kind)| {
                let lo = i.saturating_sub(radius);
                let hi = (i + radius + 1).min(len);
                ErrorRecord {
                    file_id: file_id.to_string(),
                    channel,
                    ref_context_before: self.reference[lo..i].join(" "),
                    ref_word: self.reference[i].clone(),
                    ref_context_after: self.reference[i + 1..hi].join(" "),
                    hyp_context_before: self.hypothesis[lo..i].join(" "),
                    hyp_word: self.hypothesis[i].clone(),
                    hyp_context_after: self.hypothesis[i + 1..hi].join(" "),
                    error_type: kind,
                }
            })
            .collect()
    }
}

fn filler(word: &str) -> String {
    "*".repeat(word.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::align;

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    fn view(r: &str, h: &str) -> PaddedView {
        let (r, h) = (words(r), words(h));
        PaddedView::build(&r, &h, &align(&r, &h))
    }

    #[test]
    fn padded_view_right_aligns_and_fills() {
        let v = view("a big dog barked", "a dog barks");
        assert_eq!(v.reference, vec!["a", "big", "dog", "barked"]);
        assert_eq!(v.hypothesis, vec!["a", "***", "dog", " barks"]);
        assert_eq!(
            v.kinds,
            vec![
                ChunkKind::Equal,
                ChunkKind::Delete,
                ChunkKind::Equal,
                ChunkKind::Substitute
            ]
        );
    }

    #[test]
    fn insertion_filler_sits_on_reference_side() {
        let v = view("good day", "good sunny day");
        assert_eq!(v.reference, vec!["good", "*****", "day"]);
        assert_eq!(v.hypothesis, vec!["good", "sunny", "day"]);
    }

    #[test]
    fn identical_input_has_no_errors() {
        let v = view("nothing to see here", "nothing to see here");
        assert!(v.extract_errors("f", Channel::Mixed, 5).is_empty());
    }

    #[test]
    fn context_window_is_clipped_at_edges() {
        let v = view("one two three four five six seven", "one two three for five six seven");
        let errors = v.extract_errors("call-1", Channel::Left, 2);
        assert_eq!(errors.len(), 1);
        let e = &errors[0];
        assert_eq!(e.file_id, "call-1");
        assert_eq!(e.channel, Channel::Left);
        assert_eq!(e.error_type, ChunkKind::Substitute);
        assert_eq!(e.ref_context_before, "two three");
        assert_eq!(e.ref_word, "four");
        assert_eq!(e.ref_context_after, "five six");
        assert_eq!(e.hyp_word, " for");
        assert_eq!(e.hyp_context_before, "two three");

        let errors = view("x b c", "y b c").extract_errors("f", Channel::Mixed, 5);
        assert_eq!(errors[0].ref_context_before, "");
        assert_eq!(errors[0].ref_context_after, "b c");
    }

    #[test]
    fn fillers_appear_inside_neighbouring_context() {
        let errors =
            view("we will go now", "we go now please").extract_errors("f", Channel::Mixed, 5);
        assert_eq!(errors.len(), 2);

        let deletion = &errors[0];
        assert_eq!(deletion.error_type, ChunkKind::Delete);
        assert_eq!(deletion.ref_word, "will");
        assert_eq!(deletion.hyp_word, "****");
        assert_eq!(deletion.ref_context_after, "go now ******");
        assert_eq!(deletion.hyp_context_after, "go now please");

        let insertion = &errors[1];
        assert_eq!(insertion.error_type, ChunkKind::Insert);
        assert_eq!(insertion.ref_word, "******");
        assert_eq!(insertion.hyp_word, "please");
        assert_eq!(insertion.ref_context_before, "we will go now");
        assert_eq!(insertion.hyp_context_before, "we **** go now");
    }

    #[test]
    fn stats_row_uses_reference_denominator() {
        let counts = EditCounts {
            hits: 1,
            substitutions: 1,
            deletions: 0,
            insertions: 0,
        };
        let stats = PairStats::from_counts("f", Channel::Mixed, counts);
        assert!((stats.word_error_rate - 0.5).abs() < 1e-12);
        assert_eq!(stats.counts(), counts);
    }
}
