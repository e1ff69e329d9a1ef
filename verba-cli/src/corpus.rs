//! Collects reference/hypothesis transcript pairs from disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};
use verba_core::TranscriptPair;

/// Pair `.txt` files of two directory trees by relative path.
///
/// A file present on one side only yields a pair with the other text
/// absent; the engine skips it. Pairs are sorted by relative path.
pub fn collect_pairs(reference_dir: &Path, hypothesis_dir: &Path) -> Result<Vec<TranscriptPair>> {
    let mut by_id: BTreeMap<String, (Option<PathBuf>, Option<PathBuf>)> = BTreeMap::new();

    for path in list_transcripts(reference_dir)? {
        let id = relative_id(reference_dir, &path);
        by_id.entry(id).or_default().0 = Some(path);
    }
    for path in list_transcripts(hypothesis_dir)? {
        let id = relative_id(hypothesis_dir, &path);
        by_id.entry(id).or_default().1 = Some(path);
    }

    let mut pairs = Vec::with_capacity(by_id.len());
    for (file_id, (reference, hypothesis)) in by_id {
        if reference.is_none() || hypothesis.is_none() {
            debug!(%file_id, "transcript present on one side only");
        }
        pairs.push(TranscriptPair {
            file_id,
            reference: reference.as_deref().map(read_text).transpose()?,
            hypothesis: hypothesis.as_deref().map(read_text).transpose()?,
        });
    }

    info!(
        pairs = pairs.len(),
        reference = %reference_dir.display(),
        hypothesis = %hypothesis_dir.display(),
        "corpus collected"
    );
    Ok(pairs)
}

/// Read a JSON manifest: an array of `{"id", "reference", "hypothesis"}`
/// objects whose texts may be `null`.
pub fn load_manifest(path: &Path) -> Result<Vec<TranscriptPair>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let pairs: Vec<TranscriptPair> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid manifest {}", path.display()))?;
    info!(pairs = pairs.len(), manifest = %path.display(), "manifest loaded");
    Ok(pairs)
}

fn list_transcripts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    walk(dir, &mut out).with_context(|| format!("failed to list {}", dir.display()))?;
    out.sort();
    Ok(out)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, out)?;
        } else if path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.eq_ignore_ascii_case("txt"))
        {
            out.push(path);
        }
    }
    Ok(())
}

fn relative_id(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
