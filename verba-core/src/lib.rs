//! # verba-core
//!
//! Transcript alignment and word-error analysis engine SDK.
//!
//! ## Architecture
//!
//! ```text
//! (file_id, reference, hypothesis) ─► Normalizer ─► per-channel word lists
//!                                                        │
//!                                                  align (Levenshtein)
//!                                                        │
//!                                 PairAnalyzer: stats, errors, confusion counts
//!                                                        │
//!                         worker pool ─► BatchAggregate (key-wise merge)
//!                                                        │
//!                                    BatchReport ─► CSV tables / graph views
//! ```
//!
//! Everything between the input triples and the report is pure computation;
//! I/O belongs to the caller.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod align;
pub mod analysis;
pub mod engine;
pub mod error;
pub mod graph;
pub mod normalize;
pub mod report;

// Convenience re-exports for downstream crates
pub use aggregate::{BatchAggregate, Category, ConfusionCounts, ConfusionEntry, Slot};
pub use align::{align, AlignmentChunk, ChunkKind, EditCounts, ErrorMeasures};
pub use analysis::{ErrorRecord, PairAnalyzer, PairStats};
pub use engine::{
    DiagnosticsSnapshot, EngineConfig, EngineStatus, TranscriptPair, VerbaEngine,
};
pub use error::{Result, VerbaError};
pub use graph::{DashboardPayload, DashboardQuery};
pub use normalize::{Channel, Normalizer};
pub use report::BatchReport;
