//! Fixed-size analysis worker pool.
//!
//! ```text
//! jobs ─► crossbeam unbounded channel ─► worker 0..N (scoped threads)
//!                                             │ PairAnalyzer::analyze
//!                                             ▼
//!                                  private BatchAggregate per worker
//!                                             │ join
//!                                             ▼
//!                                   key-wise merge of partials
//! ```
//!
//! Workers never share mutable state; only the diagnostics counters are
//! touched concurrently, and those are atomics.

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::Receiver;
use serde::Serialize;
use tracing::{debug, debug_span};

use crate::aggregate::BatchAggregate;
use crate::analysis::PairAnalyzer;
use crate::error::{Result, VerbaError};

use super::TranscriptPair;

pub struct BatchDiagnostics {
    pub pairs_in: AtomicUsize,
    pub pairs_skipped: AtomicUsize,
    pub pairs_analyzed: AtomicUsize,
    pub channels_analyzed: AtomicUsize,
    pub channels_skipped: AtomicUsize,
    pub short_lines: AtomicUsize,
    pub error_records: AtomicUsize,
}

impl Default for BatchDiagnostics {
    fn default() -> Self {
        Self {
            pairs_in: AtomicUsize::new(0),
            pairs_skipped: AtomicUsize::new(0),
            pairs_analyzed: AtomicUsize::new(0),
            channels_analyzed: AtomicUsize::new(0),
            channels_skipped: AtomicUsize::new(0),
            short_lines: AtomicUsize::new(0),
            error_records: AtomicUsize::new(0),
        }
    }
}

impl BatchDiagnostics {
    pub fn reset(&self) {
        self.pairs_in.store(0, Ordering::Relaxed);
        self.pairs_skipped.store(0, Ordering::Relaxed);
        self.pairs_analyzed.store(0, Ordering::Relaxed);
        self.channels_analyzed.store(0, Ordering::Relaxed);
        self.channels_skipped.store(0, Ordering::Relaxed);
        self.short_lines.store(0, Ordering::Relaxed);
        self.error_records.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            pairs_in: self.pairs_in.load(Ordering::Relaxed),
            pairs_skipped: self.pairs_skipped.load(Ordering::Relaxed),
            pairs_analyzed: self.pairs_analyzed.load(Ordering::Relaxed),
            channels_analyzed: self.channels_analyzed.load(Ordering::Relaxed),
            channels_skipped: self.channels_skipped.load(Ordering::Relaxed),
            short_lines: self.short_lines.load(Ordering::Relaxed),
            error_records: self.error_records.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub pairs_in: usize,
    pub pairs_skipped: usize,
    pub pairs_analyzed: usize,
    pub channels_analyzed: usize,
    pub channels_skipped: usize,
    pub short_lines: usize,
    pub error_records: usize,
}

/// One unit of work: a pair tagged with its input position.
pub(crate) type Job = (usize, TranscriptPair);

/// Analyse `jobs` on `workers` threads and merge the partial aggregates.
pub(crate) fn run(
    analyzer: &PairAnalyzer,
    jobs: Vec<Job>,
    workers: usize,
    diagnostics: &BatchDiagnostics,
) -> Result<BatchAggregate> {
    let workers = workers.clamp(1, jobs.len().max(1));
    let (tx, rx) = crossbeam_channel::unbounded::<Job>();
    for job in jobs {
        tx.send(job)
            .map_err(|e| VerbaError::Worker(format!("job queue closed: {e}")))?;
    }
    drop(tx);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let rx = rx.clone();
                scope.spawn(move || worker_loop(id, analyzer, rx, diagnostics))
            })
            .collect();

        // Join every handle before reporting, so no panicked thread is left
        // for the scope to re-raise.
        let joined: Vec<_> = handles.into_iter().map(|h| h.join()).collect();

        let mut total = BatchAggregate::new();
        let mut failed = 0usize;
        for partial in joined {
            match partial {
                Ok(partial) => total.merge(partial),
                Err(_) => failed += 1,
            }
        }
        if failed > 0 {
            return Err(VerbaError::Worker(format!(
                "{failed} of {workers} analysis workers panicked"
            )));
        }
        Ok(total)
    })
}

fn worker_loop(
    id: usize,
    analyzer: &PairAnalyzer,
    jobs: Receiver<Job>,
    diagnostics: &BatchDiagnostics,
) -> BatchAggregate {
    let _span = debug_span!("worker", id).entered();
    let mut partial = BatchAggregate::new();

    for (ordinal, pair) in jobs.iter() {
        let (Some(reference), Some(hypothesis)) = (&pair.reference, &pair.hypothesis) else {
            diagnostics.pairs_skipped.fetch_add(1, Ordering::Relaxed);
            continue;
        };
        let Some(analysis) = analyzer.analyze(&pair.file_id, reference, hypothesis) else {
            diagnostics.pairs_skipped.fetch_add(1, Ordering::Relaxed);
            continue;
        };

        diagnostics.pairs_analyzed.fetch_add(1, Ordering::Relaxed);
        diagnostics
            .channels_analyzed
            .fetch_add(analysis.channels.len(), Ordering::Relaxed);
        diagnostics
            .channels_skipped
            .fetch_add(analysis.skipped_channels, Ordering::Relaxed);
        diagnostics
            .short_lines
            .fetch_add(analysis.short_lines, Ordering::Relaxed);
        diagnostics
            .error_records
            .fetch_add(analysis.error_count(), Ordering::Relaxed);

        partial.push(ordinal, analysis);
    }

    debug!(files = partial.file_count(), "worker drained queue");
    partial
}
