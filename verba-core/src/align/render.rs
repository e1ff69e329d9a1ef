//! Human-readable alignment dump.
//!
//! ```text
//! === SENTENCE 1 ===
//!
//! REF: hello world **
//! HYP: hello there ok
//!                S  I
//!
//! number of sentences: 1
//! substitutions=1 deletions=0 insertions=1 hits=1
//!
//! mer=66.67%
//! wil=83.33%
//! wip=16.67%
//! wer=100.00%
//! ```
//!
//! Columns are right-aligned to the widest of the two words, and missing
//! words are shown as asterisks spanning the column. The sentence block is
//! omitted when every word matched.

use std::fmt::Write as _;

use super::{AlignmentChunk, ChunkKind, EditCounts};

/// Render one channel's alignment followed by its counters and measures.
pub fn render_alignment<S: AsRef<str>>(
    reference: &[S],
    hypothesis: &[S],
    chunks: &[AlignmentChunk],
) -> String {
    let counts = EditCounts::from_chunks(chunks);
    let mut out = String::new();

    let all_correct = chunks.iter().all(|c| c.kind == ChunkKind::Equal);
    if !all_correct {
        out.push_str("=== SENTENCE 1 ===\n\n");
        out.push_str(&comparison_rows(reference, hypothesis, chunks));
        out.push('\n');
    }

    let _ = writeln!(out, "number of sentences: 1");
    let _ = writeln!(
        out,
        "substitutions={} deletions={} insertions={} hits={}",
        counts.substitutions, counts.deletions, counts.insertions, counts.hits
    );
    let _ = write!(out, "\nmer={:.2}%", counts.mer() * 100.0);
    let _ = write!(out, "\nwil={:.2}%", counts.wil() * 100.0);
    let _ = write!(out, "\nwip={:.2}%", counts.wip() * 100.0);
    let _ = writeln!(out, "\nwer={:.2}%", counts.wer() * 100.0);
    out
}

fn comparison_rows<S: AsRef<str>>(
    reference: &[S],
    hypothesis: &[S],
    chunks: &[AlignmentChunk],
) -> String {
    let mut ref_row = vec!["REF:".to_string()];
    let mut hyp_row = vec!["HYP:".to_string()];
    let mut op_row = vec!["    ".to_string()];

    for chunk in chunks {
        let op = match chunk.kind {
            ChunkKind::Equal => ' ',
            ChunkKind::Substitute => 'S',
            ChunkKind::Delete => 'D',
            ChunkKind::Insert => 'I',
        };
        for k in 0..chunk.len() {
            let rf = chunk
                .reference
                .clone()
                .nth(k)
                .map(|i| reference[i].as_ref());
            let hp = chunk
                .hypothesis
                .clone()
                .nth(k)
                .map(|j| hypothesis[j].as_ref());
            let width = [rf, hp]
                .iter()
                .flatten()
                .map(|w| w.chars().count())
                .max()
                .unwrap_or(0)
                .max(1);
            let filler = "*".repeat(width);
            ref_row.push(format!("{:>width$}", rf.unwrap_or(filler.as_str())));
            hyp_row.push(format!("{:>width$}", hp.unwrap_or(filler.as_str())));
            op_row.push(format!("{op:>width$}"));
        }
    }

    format!(
        "{}\n{}\n{}\n",
        ref_row.join(" "),
        hyp_row.join(" "),
        op_row.join(" ")
    )
}
