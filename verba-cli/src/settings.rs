//! Persistent CLI settings (JSON file in the user data directory).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;
use verba_core::engine::{MAX_CONTEXT_RADIUS, MAX_WORKERS};
use verba_core::normalize::DEFAULT_PUNCTUATION;
use verba_core::EngineConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct CliSettings {
    pub metadata_fields: usize,
    pub context_radius: usize,
    pub punctuation: String,
    pub workers: usize,
    pub render_alignments: bool,
    pub write_archive: bool,
    /// Parent directory for timestamped output folders.
    pub output_root: Option<PathBuf>,
}

impl Default for CliSettings {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            metadata_fields: engine.metadata_fields,
            context_radius: engine.context_radius,
            punctuation: engine.punctuation,
            workers: engine.workers,
            render_alignments: engine.render_alignments,
            write_archive: true,
            output_root: None,
        }
    }
}

impl CliSettings {
    pub fn normalize(&mut self) {
        if self.metadata_fields > 16 {
            warn!(value = self.metadata_fields, "metadataFields clamped to 16");
            self.metadata_fields = 16;
        }
        if self.context_radius > MAX_CONTEXT_RADIUS {
            warn!(value = self.context_radius, "contextRadius clamped to {MAX_CONTEXT_RADIUS}");
            self.context_radius = MAX_CONTEXT_RADIUS;
        }
        if self.workers > MAX_WORKERS {
            warn!(value = self.workers, "workers clamped to {MAX_WORKERS}");
            self.workers = MAX_WORKERS;
        }
        if self.punctuation.is_empty() {
            self.punctuation = DEFAULT_PUNCTUATION.into();
        }
        self.output_root = self
            .output_root
            .take()
            .filter(|p| !p.as_os_str().is_empty());
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            metadata_fields: self.metadata_fields,
            context_radius: self.context_radius,
            punctuation: self.punctuation.clone(),
            workers: self.workers,
            render_alignments: self.render_alignments,
        }
    }
}

pub fn default_settings_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Lattice Labs")
            .join("Verba")
            .join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("verba")
            .join("settings.json")
    }
}

pub fn load_settings(path: &Path) -> CliSettings {
    let mut settings = fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str::<CliSettings>(&raw).ok())
        .unwrap_or_default();
    settings.normalize();
    settings
}

pub fn save_settings(path: &Path, settings: &CliSettings) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(std::io::Error::other)?;
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&dir.path().join("nope.json"));
        assert_eq!(settings, CliSettings::default());
        assert_eq!(settings.metadata_fields, 2);
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").expect("write");
        assert_eq!(load_settings(&path), CliSettings::default());
    }

    #[test]
    fn partial_file_fills_defaults_and_clamps() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"contextRadius": 500, "punctuation": ""}"#).expect("write");
        let settings = load_settings(&path);
        assert_eq!(settings.context_radius, MAX_CONTEXT_RADIUS);
        assert_eq!(settings.punctuation, DEFAULT_PUNCTUATION);
        assert!(settings.write_archive);
        assert!(settings.engine_config().validate().is_ok());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");
        let settings = CliSettings {
            metadata_fields: 0,
            workers: 4,
            output_root: Some(PathBuf::from("/srv/reports")),
            ..CliSettings::default()
        };
        save_settings(&path, &settings).expect("save");
        assert_eq!(load_settings(&path), settings);

        let raw = fs::read_to_string(&path).expect("read");
        assert!(raw.contains("\"metadataFields\": 0"));
    }
}
