//! Word-level minimum-edit-distance alignment.
//!
//! ## Algorithm
//!
//! ```text
//! 1. Fill Levenshtein suffix costs over word tokens row by row, from the
//!    end of both sequences (unit cost for substitute / delete / insert, zero
//!    for equal), recording per cell the first of
//!    equal → substitute → delete → insert that stays on an optimal path
//! 2. Walk the recorded steps from (0, 0) to (n, m)
//! 3. Run-length collapse the elementary operations into chunks
//! ```
//!
//! The fixed tie-break order makes alignments reproducible across runs and
//! platforms, which the exported tables and test fixtures rely on.

pub mod render;

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Elementary edit operation type, shared by a whole chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Equal,
    Substitute,
    Delete,
    Insert,
}

impl ChunkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkKind::Equal => "equal",
            ChunkKind::Substitute => "substitute",
            ChunkKind::Delete => "delete",
            ChunkKind::Insert => "insert",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "equal" => Some(ChunkKind::Equal),
            "substitute" => Some(ChunkKind::Substitute),
            "delete" => Some(ChunkKind::Delete),
            "insert" => Some(ChunkKind::Insert),
            _ => None,
        }
    }

    pub fn is_error(self) -> bool {
        self != ChunkKind::Equal
    }

    fn consumes_reference(self) -> bool {
        self != ChunkKind::Insert
    }

    fn consumes_hypothesis(self) -> bool {
        self != ChunkKind::Delete
    }
}

/// A maximal run of same-type operations.
///
/// Ranges are half-open indices into the reference and hypothesis word
/// sequences. `Delete` chunks have an empty hypothesis range positioned where
/// the words went missing; `Insert` chunks have an empty reference range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentChunk {
    pub kind: ChunkKind,
    pub reference: Range<usize>,
    pub hypothesis: Range<usize>,
}

impl AlignmentChunk {
    /// Number of aligned positions covered by this chunk.
    pub fn len(&self) -> usize {
        self.reference.len().max(self.hypothesis.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Align two token sequences. Total for any pair of finite inputs.
pub fn align<T: PartialEq>(reference: &[T], hypothesis: &[T]) -> Vec<AlignmentChunk> {
    collapse(&edit_ops(reference, hypothesis))
}

/// Minimum edit path as elementary operations, in sequence order.
///
/// Costs are kept in two rolling rows; the full table holds only the chosen
/// step per cell, one byte each, so memory is `(n + 1) * (m + 1)` bytes.
pub fn edit_ops<T: PartialEq>(reference: &[T], hypothesis: &[T]) -> Vec<ChunkKind> {
    let n = reference.len();
    let m = hypothesis.len();
    let cols = m + 1;
    let at = |i: usize, j: usize| i * cols + j;

    // steps[at(i, j)] is the first operation of the preferred optimal path
    // from reference[i..] / hypothesis[j..].
    let mut steps = vec![ChunkKind::Insert; (n + 1) * cols];
    let mut next: Vec<u32> = (0..=m).map(|j| (m - j) as u32).collect();
    let mut row = vec![0u32; cols];

    for i in (0..n).rev() {
        row[m] = (n - i) as u32;
        steps[at(i, m)] = ChunkKind::Delete;
        for j in (0..m).rev() {
            let same = reference[i] == hypothesis[j];
            let diag = next[j + 1] + u32::from(!same);
            let del = next[j] + 1;
            let ins = row[j + 1] + 1;
            let here = diag.min(del).min(ins);
            steps[at(i, j)] = if diag == here {
                if same {
                    ChunkKind::Equal
                } else {
                    ChunkKind::Substitute
                }
            } else if del == here {
                ChunkKind::Delete
            } else {
                ChunkKind::Insert
            };
            row[j] = here;
        }
        std::mem::swap(&mut next, &mut row);
    }

    let mut ops = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0usize, 0usize);
    while i < n || j < m {
        let step = steps[at(i, j)];
        ops.push(step);
        i += usize::from(step.consumes_reference());
        j += usize::from(step.consumes_hypothesis());
    }

    ops
}

/// Run-length collapse elementary operations into contiguous chunks.
pub fn collapse(ops: &[ChunkKind]) -> Vec<AlignmentChunk> {
    let mut chunks: Vec<AlignmentChunk> = Vec::new();
    let (mut ri, mut hi) = (0usize, 0usize);

    for &kind in ops {
        let next_ri = ri + usize::from(kind.consumes_reference());
        let next_hi = hi + usize::from(kind.consumes_hypothesis());
        match chunks.last_mut() {
            Some(last) if last.kind == kind => {
                last.reference.end = next_ri;
                last.hypothesis.end = next_hi;
            }
            _ => chunks.push(AlignmentChunk {
                kind,
                reference: ri..next_ri,
                hypothesis: hi..next_hi,
            }),
        }
        ri = next_ri;
        hi = next_hi;
    }

    chunks
}

/// Hit / substitution / deletion / insertion totals of one alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditCounts {
    pub hits: u64,
    pub substitutions: u64,
    pub deletions: u64,
    pub insertions: u64,
}

impl EditCounts {
    pub fn from_chunks(chunks: &[AlignmentChunk]) -> Self {
        let mut counts = Self::default();
        for chunk in chunks {
            let n = chunk.len() as u64;
            match chunk.kind {
                ChunkKind::Equal => counts.hits += n,
                ChunkKind::Substitute => counts.substitutions += n,
                ChunkKind::Delete => counts.deletions += n,
                ChunkKind::Insert => counts.insertions += n,
            }
        }
        counts
    }

    pub fn errors(&self) -> u64 {
        self.substitutions + self.deletions + self.insertions
    }

    pub fn reference_len(&self) -> u64 {
        self.hits + self.substitutions + self.deletions
    }

    pub fn hypothesis_len(&self) -> u64 {
        self.hits + self.substitutions + self.insertions
    }

    /// Word error rate over reference tokens; 0 for an empty reference.
    pub fn wer(&self) -> f64 {
        ratio(self.errors(), self.reference_len())
    }

    /// Match error rate: errors over all aligned positions.
    pub fn mer(&self) -> f64 {
        ratio(self.errors(), self.hits + self.errors())
    }

    /// Word information preserved.
    pub fn wip(&self) -> f64 {
        ratio(self.hits, self.reference_len()) * ratio(self.hits, self.hypothesis_len())
    }

    /// Word information lost. 0 for an empty alignment.
    pub fn wil(&self) -> f64 {
        if self.reference_len() == 0 && self.hypothesis_len() == 0 {
            return 0.0;
        }
        1.0 - self.wip()
    }

    pub fn measures(&self) -> ErrorMeasures {
        ErrorMeasures {
            wer: self.wer(),
            mer: self.mer(),
            wil: self.wil(),
            wip: self.wip(),
        }
    }
}

/// The four standard error measures of one alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMeasures {
    pub wer: f64,
    pub mer: f64,
    pub wil: f64,
    pub wip: f64,
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    fn kinds(chunks: &[AlignmentChunk]) -> Vec<ChunkKind> {
        chunks.iter().map(|c| c.kind).collect()
    }

    fn assert_partition(chunks: &[AlignmentChunk], n: usize, m: usize) {
        let (mut ri, mut hi) = (0, 0);
        for chunk in chunks {
            assert_eq!(chunk.reference.start, ri, "reference gap before {chunk:?}");
            assert_eq!(chunk.hypothesis.start, hi, "hypothesis gap before {chunk:?}");
            ri = chunk.reference.end;
            hi = chunk.hypothesis.end;
        }
        assert_eq!((ri, hi), (n, m));
    }

    #[test]
    fn identical_sequences_align_as_one_equal_chunk() {
        let a = words("the quick brown fox");
        let chunks = align(&a, &a);
        assert_eq!(
            chunks,
            vec![AlignmentChunk {
                kind: ChunkKind::Equal,
                reference: 0..4,
                hypothesis: 0..4,
            }]
        );
        assert_relative_eq!(EditCounts::from_chunks(&chunks).wer(), 0.0);
    }

    #[test]
    fn single_substitution() {
        let chunks = align(&words("hello world"), &words("hello there"));
        assert_eq!(kinds(&chunks), vec![ChunkKind::Equal, ChunkKind::Substitute]);
        assert_eq!(chunks[1].reference, 1..2);
        assert_eq!(chunks[1].hypothesis, 1..2);

        let counts = EditCounts::from_chunks(&chunks);
        assert_eq!(counts.hits, 1);
        assert_eq!(counts.substitutions, 1);
        assert_relative_eq!(counts.wer(), 0.5);
    }

    #[test]
    fn deletion_and_insertion_ranges_are_empty_on_missing_side() {
        let chunks = align(&words("a b c"), &words("a c"));
        assert_eq!(
            kinds(&chunks),
            vec![ChunkKind::Equal, ChunkKind::Delete, ChunkKind::Equal]
        );
        assert_eq!(chunks[1].reference, 1..2);
        assert_eq!(chunks[1].hypothesis, 1..1);

        let chunks = align(&words("a c"), &words("a b c"));
        assert_eq!(
            kinds(&chunks),
            vec![ChunkKind::Equal, ChunkKind::Insert, ChunkKind::Equal]
        );
        assert_eq!(chunks[1].reference, 1..1);
        assert_eq!(chunks[1].hypothesis, 1..2);
    }

    #[test]
    fn empty_sides() {
        let empty: Vec<&str> = Vec::new();
        assert!(align(&empty, &empty).is_empty());

        let chunks = align(&empty, &words("x y"));
        assert_eq!(kinds(&chunks), vec![ChunkKind::Insert]);
        assert_eq!(chunks[0].hypothesis, 0..2);

        let chunks = align(&words("x y"), &empty);
        assert_eq!(kinds(&chunks), vec![ChunkKind::Delete]);
        assert_relative_eq!(EditCounts::from_chunks(&chunks).wer(), 1.0);
    }

    #[test]
    fn substitute_preferred_over_delete_insert_pair() {
        // Equal-cost paths: {del b, ins d} or {sub b→c, sub c→d}.
        let chunks = align(&words("a b c"), &words("a c d"));
        assert_eq!(kinds(&chunks), vec![ChunkKind::Equal, ChunkKind::Substitute]);
        assert_eq!(chunks[1].reference, 1..3);
        assert_eq!(chunks[1].hypothesis, 1..3);
    }

    #[test]
    fn tie_break_resolves_earliest_position_first() {
        // sub(a→c)+del(b) and del(a)+sub(b→c) cost the same; the walk
        // starts at the front, so the substitution lands on `a`.
        let chunks = align(&words("a b"), &words("c"));
        assert_eq!(kinds(&chunks), vec![ChunkKind::Substitute, ChunkKind::Delete]);
        assert_eq!(chunks[0].reference, 0..1);
        assert_eq!(chunks[0].hypothesis, 0..1);
        assert_eq!(chunks[1].reference, 1..2);
        assert_eq!(chunks[1].hypothesis, 1..1);
    }

    #[test]
    fn substitution_precedes_trailing_insertion() {
        let chunks = align(&words("hello world"), &words("hello there ok"));
        assert_eq!(
            kinds(&chunks),
            vec![ChunkKind::Equal, ChunkKind::Substitute, ChunkKind::Insert]
        );
        assert_eq!(chunks[2].reference, 2..2);
        assert_eq!(chunks[2].hypothesis, 2..3);
    }

    #[test]
    fn chunks_partition_both_sequences() {
        let cases = [
            ("one two three four five", "one too three for five six"),
            ("", "lonely"),
            ("a a a a", "a"),
            ("x y z", "z y x"),
            ("the cat sat on the mat", "a cat sat on mat today"),
        ];
        for (r, h) in cases {
            let (r, h) = (words(r), words(h));
            let chunks = align(&r, &h);
            assert_partition(&chunks, r.len(), h.len());
            for chunk in &chunks {
                if chunk.kind == ChunkKind::Equal {
                    assert_eq!(&r[chunk.reference.clone()], &h[chunk.hypothesis.clone()]);
                }
                if matches!(chunk.kind, ChunkKind::Equal | ChunkKind::Substitute) {
                    assert_eq!(chunk.reference.len(), chunk.hypothesis.len());
                }
            }
        }
    }

    fn naive_distance(r: &[u8], h: &[u8]) -> u64 {
        let mut table = vec![vec![0u64; h.len() + 1]; r.len() + 1];
        for (i, row) in table.iter_mut().enumerate() {
            row[0] = i as u64;
        }
        for j in 0..=h.len() {
            table[0][j] = j as u64;
        }
        for i in 1..=r.len() {
            for j in 1..=h.len() {
                let sub = table[i - 1][j - 1] + u64::from(r[i - 1] != h[j - 1]);
                table[i][j] = sub.min(table[i - 1][j] + 1).min(table[i][j - 1] + 1);
            }
        }
        table[r.len()][h.len()]
    }

    #[test]
    fn random_alignments_are_minimal() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let r: Vec<u8> = (0..rng.gen_range(0..12)).map(|_| rng.gen_range(0..4)).collect();
            let h: Vec<u8> = (0..rng.gen_range(0..12)).map(|_| rng.gen_range(0..4)).collect();
            let chunks = align(&r, &h);
            assert_partition(&chunks, r.len(), h.len());
            let counts = EditCounts::from_chunks(&chunks);
            assert_eq!(counts.errors(), naive_distance(&r, &h), "{r:?} vs {h:?}");
        }
    }

    #[test]
    fn long_channels_align() {
        let r: Vec<usize> = (0..3000).collect();
        let h: Vec<usize> = (0..3000).map(|i| if i % 10 == 0 { i + 100_000 } else { i }).collect();
        let counts = EditCounts::from_chunks(&align(&r, &h));
        assert_eq!(counts.substitutions, 300);
        assert_eq!(counts.hits, 2700);
    }

    #[test]
    fn adjacent_chunks_never_share_a_kind() {
        let chunks = align(&words("a b c d e f"), &words("x b y z e"));
        for pair in chunks.windows(2) {
            assert_ne!(pair[0].kind, pair[1].kind);
        }
    }

    #[test]
    fn measures_match_hand_computed_values() {
        let counts = EditCounts {
            hits: 3,
            substitutions: 1,
            deletions: 1,
            insertions: 1,
        };
        assert_relative_eq!(counts.wer(), 3.0 / 5.0);
        assert_relative_eq!(counts.mer(), 3.0 / 6.0);
        assert_relative_eq!(counts.wip(), (3.0 / 5.0) * (3.0 / 5.0));
        assert_relative_eq!(counts.wil(), 1.0 - (3.0 / 5.0) * (3.0 / 5.0));
    }

    #[test]
    fn measures_are_zero_without_denominator() {
        let counts = EditCounts::default();
        assert_relative_eq!(counts.wer(), 0.0);
        assert_relative_eq!(counts.mer(), 0.0);
        assert_relative_eq!(counts.wip(), 0.0);
        assert_relative_eq!(counts.wil(), 0.0);
        assert_eq!(counts.measures(), ErrorMeasures::default());
    }

    #[test]
    fn chunk_kind_parse_matches_as_str() {
        for kind in [
            ChunkKind::Equal,
            ChunkKind::Substitute,
            ChunkKind::Delete,
            ChunkKind::Insert,
        ] {
            assert_eq!(ChunkKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ChunkKind::parse("Equal"), None);
    }
}
