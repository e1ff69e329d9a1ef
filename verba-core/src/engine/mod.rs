//! `VerbaEngine`: batch orchestration.
//!
//! ## Batch flow
//!
//! ```text
//! VerbaEngine::evaluate(pairs)
//!     ├─► filter absent / blank pairs         (pairs_skipped)
//!     ├─► pool::run                           (status = Running)
//!     │       worker i: analyze → private BatchAggregate
//!     ├─► merge partials
//!     └─► BatchAggregate::finish → BatchReport (status = Idle)
//! ```
//!
//! Only one batch runs per engine at a time; a second concurrent call
//! returns [`VerbaError::Busy`] instead of interleaving diagnostics.

pub mod pool;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    analysis::{PairAnalyzer, DEFAULT_CONTEXT_RADIUS},
    error::{Result, VerbaError},
    normalize::{DEFAULT_METADATA_FIELDS, DEFAULT_PUNCTUATION},
    report::BatchReport,
};

pub use pool::{BatchDiagnostics, DiagnosticsSnapshot};

/// Upper bound for `context_radius`.
pub const MAX_CONTEXT_RADIUS: usize = 64;
/// Upper bound for an explicit `workers` count.
pub const MAX_WORKERS: usize = 256;

/// Configuration for `VerbaEngine`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Leading tokens of every transcript line treated as metadata (typically
    /// start/end timestamps) and dropped. `0` keeps every token. Default: 2.
    pub metadata_fields: usize,
    /// Words of context on each side of an error record. Default: 5.
    pub context_radius: usize,
    /// Characters stripped from transcript text before tokenization.
    pub punctuation: String,
    /// Analysis worker threads. `0` uses the available parallelism.
    pub workers: usize,
    /// Whether to render the human-readable alignment dump per channel.
    pub render_alignments: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            metadata_fields: DEFAULT_METADATA_FIELDS,
            context_radius: DEFAULT_CONTEXT_RADIUS,
            punctuation: DEFAULT_PUNCTUATION.to_string(),
            workers: 0,
            render_alignments: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.context_radius > MAX_CONTEXT_RADIUS {
            return Err(VerbaError::InvalidConfig(format!(
                "context_radius {} exceeds {MAX_CONTEXT_RADIUS}",
                self.context_radius
            )));
        }
        if self.workers > MAX_WORKERS {
            return Err(VerbaError::InvalidConfig(format!(
                "workers {} exceeds {MAX_WORKERS}",
                self.workers
            )));
        }
        Ok(())
    }

    /// Worker count with `0` resolved to the machine's parallelism.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        match std::thread::available_parallelism() {
            Ok(n) => n.get(),
            Err(e) => {
                warn!("available_parallelism unavailable ({e}), using 1 worker");
                1
            }
        }
    }
}

/// One input file pair. Either side may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptPair {
    #[serde(rename = "id")]
    pub file_id: String,
    pub reference: Option<String>,
    pub hypothesis: Option<String>,
}

impl TranscriptPair {
    pub fn new(
        file_id: impl Into<String>,
        reference: impl Into<String>,
        hypothesis: impl Into<String>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            reference: Some(reference.into()),
            hypothesis: Some(hypothesis.into()),
        }
    }

    /// Both texts present and non-blank.
    pub fn is_complete(&self) -> bool {
        let present = |t: &Option<String>| t.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.reference) && present(&self.hypothesis)
    }
}

/// Current state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    /// No batch in flight.
    Idle,
    /// A batch is being analysed.
    Running,
    /// The last batch failed; the engine accepts a new one.
    Error,
}

/// The top-level engine handle.
///
/// `VerbaEngine` is `Send + Sync`. Wrap in `Arc<VerbaEngine>` to drive it
/// through [`evaluate_async`](VerbaEngine::evaluate_async).
pub struct VerbaEngine {
    config: EngineConfig,
    analyzer: PairAnalyzer,
    /// `true` while a batch is in flight.
    running: AtomicBool,
    status: Mutex<EngineStatus>,
    diagnostics: Arc<BatchDiagnostics>,
}

impl VerbaEngine {
    /// Create an engine. Fails on an invalid configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            analyzer: PairAnalyzer::new(&config),
            config,
            running: AtomicBool::new(false),
            status: Mutex::new(EngineStatus::Idle),
            diagnostics: Arc::new(BatchDiagnostics::default()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyse a whole batch and build its report.
    ///
    /// Absent or blank pairs are skipped, never fatal; a batch with no usable
    /// pair yields an empty report.
    ///
    /// # Errors
    /// - `VerbaError::Busy` if another batch is running on this engine.
    /// - `VerbaError::Worker` if an analysis thread panicked.
    pub fn evaluate<I>(&self, pairs: I) -> Result<BatchReport>
    where
        I: IntoIterator<Item = TranscriptPair>,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(VerbaError::Busy);
        }

        let started = Instant::now();
        self.diagnostics.reset();
        *self.status.lock() = EngineStatus::Running;

        let mut jobs = Vec::new();
        for (ordinal, pair) in pairs.into_iter().enumerate() {
            self.diagnostics.pairs_in.fetch_add(1, Ordering::Relaxed);
            if pair.is_complete() {
                jobs.push((ordinal, pair));
            } else {
                self.diagnostics.pairs_skipped.fetch_add(1, Ordering::Relaxed);
                debug!(file_id = %pair.file_id, "absent or blank transcript, pair skipped");
            }
        }

        let workers = self.config.effective_workers();
        info!(pairs = jobs.len(), workers, "batch started");

        let outcome = pool::run(&self.analyzer, jobs, workers, &self.diagnostics);
        self.running.store(false, Ordering::SeqCst);

        match outcome {
            Ok(aggregate) => {
                *self.status.lock() = EngineStatus::Idle;
                let report = aggregate.finish();
                let snap = self.diagnostics.snapshot();
                info!(
                    analyzed = snap.pairs_analyzed,
                    skipped = snap.pairs_skipped,
                    channels = snap.channels_analyzed,
                    errors = snap.error_records,
                    short_lines = snap.short_lines,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "batch finished"
                );
                Ok(report)
            }
            Err(e) => {
                *self.status.lock() = EngineStatus::Error;
                Err(e)
            }
        }
    }

    /// Run [`evaluate`](VerbaEngine::evaluate) on the blocking thread pool.
    pub async fn evaluate_async(
        self: Arc<Self>,
        pairs: Vec<TranscriptPair>,
    ) -> Result<BatchReport> {
        tokio::task::spawn_blocking(move || self.evaluate(pairs))
            .await
            .map_err(|e| VerbaError::Worker(format!("batch task failed: {e}")))?
    }

    /// Current engine status (snapshot).
    pub fn status(&self) -> EngineStatus {
        *self.status.lock()
    }

    /// Counters of the most recent batch.
    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }
}
