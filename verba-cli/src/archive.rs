//! Zip bundle of the exported artifacts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ARCHIVE_FILE: &str = "output.zip";

/// Write `files` into `<dir>/output.zip`, each stored under its file name.
pub fn write_archive(dir: &Path, files: &[PathBuf]) -> Result<PathBuf> {
    let archive_path = dir.join(ARCHIVE_FILE);
    let out = File::create(&archive_path)
        .with_context(|| format!("failed to create {}", archive_path.display()))?;
    let mut zip = ZipWriter::new(BufWriter::new(out));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("artifact without a file name: {}", path.display()))?;
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        zip.start_file(name, options)
            .with_context(|| format!("failed to add {name} to archive"))?;
        zip.write_all(&bytes)?;
    }

    let mut inner = zip.finish().context("failed to finalize archive")?;
    inner.flush()?;
    info!(archive = %archive_path.display(), entries = files.len(), "archive written");
    Ok(archive_path)
}
