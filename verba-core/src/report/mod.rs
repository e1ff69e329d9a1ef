//! Batch report: the three exported tables plus the alignment dump.

pub mod table;

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{ConfusionCounts, ConfusionEntry};
use crate::align::EditCounts;
use crate::analysis::{ErrorRecord, PairStats};
use crate::error::Result;
use crate::normalize::Channel;

pub const STATS_FILE: &str = "wer_stats.csv";
pub const WORD_ERRORS_FILE: &str = "word_errors.csv";
pub const ERRORS_CONTEXT_FILE: &str = "errors_context.csv";
pub const ALIGNMENTS_FILE: &str = "wer_results.txt";

/// Rendered alignment of one `(file, channel)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentDump {
    pub file_id: String,
    pub channel: Channel,
    pub text: String,
}

/// Final, ordered output of a batch.
///
/// `stats` and `errors` follow input file order, then channel order
/// `L, R, B`, then position order. `word_errors` is sorted by
/// `(Source, Destination)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub stats: Vec<PairStats>,
    pub word_errors: Vec<ConfusionEntry>,
    pub errors: Vec<ErrorRecord>,
    pub alignments: Vec<AlignmentDump>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Counters summed over every analysed channel.
    pub fn totals(&self) -> EditCounts {
        self.stats.iter().fold(EditCounts::default(), |acc, row| {
            let c = row.counts();
            EditCounts {
                hits: acc.hits + c.hits,
                substitutions: acc.substitutions + c.substitutions,
                deletions: acc.deletions + c.deletions,
                insertions: acc.insertions + c.insertions,
            }
        })
    }

    /// Concatenated alignment dumps, one headed block per `(file, channel)`.
    pub fn alignment_text(&self) -> String {
        let mut out = String::new();
        for dump in &self.alignments {
            let _ = writeln!(out, "{} - Prefix: {}", dump.file_id, dump.channel);
            let _ = writeln!(out, "{}", dump.text);
        }
        out
    }

    /// Rebuild confusion counters from the exported table.
    pub fn confusion(&self) -> ConfusionCounts {
        ConfusionCounts::from_entries(&self.word_errors)
    }

    /// Write every artifact into `dir`, creating it if needed.
    ///
    /// Returns the written paths in a fixed order: stats, word errors,
    /// error context, alignment dump.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;

        let stats = dir.join(STATS_FILE);
        table::write_stats(BufWriter::new(File::create(&stats)?), &self.stats)?;

        let word_errors = dir.join(WORD_ERRORS_FILE);
        table::write_word_errors(BufWriter::new(File::create(&word_errors)?), &self.word_errors)?;

        let errors = dir.join(ERRORS_CONTEXT_FILE);
        table::write_errors_context(BufWriter::new(File::create(&errors)?), &self.errors)?;

        let alignments = dir.join(ALIGNMENTS_FILE);
        fs::write(&alignments, self.alignment_text())?;

        info!(
            dir = %dir.display(),
            stats = self.stats.len(),
            word_errors = self.word_errors.len(),
            errors = self.errors.len(),
            "report written"
        );
        Ok(vec![stats, word_errors, errors, alignments])
    }

    /// Reload the tables previously written by [`write_to_dir`].
    ///
    /// Alignment dumps are not parsed back.
    ///
    /// [`write_to_dir`]: BatchReport::write_to_dir
    pub fn read_from_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            stats: table::read_stats(File::open(dir.join(STATS_FILE))?)?,
            word_errors: table::read_word_errors(File::open(dir.join(WORD_ERRORS_FILE))?)?,
            errors: table::read_errors_context(File::open(dir.join(ERRORS_CONTEXT_FILE))?)?,
            alignments: Vec::new(),
        })
    }
}
