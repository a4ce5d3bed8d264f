//! Per-station source preferences
//!
//! Remembers the last source index selected for each station so that
//! re-selecting a station resumes at the previously working source.
//! Keyed by station name: catalog indices are not stable across reloads,
//! names are treated as the stable identity.
//!
//! Persistence goes through the [`PreferenceBackend`] trait; the default
//! backend is a TOML file at `~/.config/tvplay/sources.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Preference persistence error types
#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("Could not determine preference file path")]
    NoPath,

    #[error("Read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("Malformed preference file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize failed: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// One persisted entry: last source index selected for a station name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePreference {
    pub station: String,
    pub source_index: usize,
}

/// Persistence collaborator for source preferences.
///
/// `upsert` must be durable before it returns: entries written through it
/// survive a process restart.
pub trait PreferenceBackend {
    fn read_all(&self) -> Result<Vec<SourcePreference>, PrefsError>;
    fn upsert(&mut self, entry: &SourcePreference) -> Result<(), PrefsError>;
}

// =============================================================================
// Store
// =============================================================================

/// In-memory view over a [`PreferenceBackend`].
pub struct SourcePreferenceStore<B> {
    entries: HashMap<String, usize>,
    backend: B,
}

impl<B: PreferenceBackend> SourcePreferenceStore<B> {
    /// Load all persisted entries from the backend.
    pub fn load(backend: B) -> Result<Self, PrefsError> {
        let entries = backend
            .read_all()?
            .into_iter()
            .map(|e| (e.station, e.source_index))
            .collect();
        Ok(Self { entries, backend })
    }

    /// Last source index selected for this station name.
    /// Returns 0 for any station never passed to [`set`](Self::set).
    pub fn get(&self, station_name: &str) -> usize {
        self.entries.get(station_name).copied().unwrap_or(0)
    }

    /// Upsert the entry for this station name, persisting durably before
    /// the in-memory view is updated.
    pub fn set(&mut self, station_name: &str, source_index: usize) -> Result<(), PrefsError> {
        let entry = SourcePreference {
            station: station_name.to_string(),
            source_index,
        };
        self.backend.upsert(&entry)?;
        self.entries.insert(entry.station, entry.source_index);
        Ok(())
    }

    /// Number of distinct stations with a stored preference
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Backends
// =============================================================================

/// Serialized shape of the preference file
#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    sources: Vec<SourcePreference>,
}

/// TOML file backend (~/.config/tvplay/sources.toml)
pub struct TomlPreferenceFile {
    path: PathBuf,
}

impl TomlPreferenceFile {
    /// Default preference file path (~/.config/tvplay/sources.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tvplay").join("sources.toml"))
    }

    /// Backend at the default path
    pub fn open() -> Result<Self, PrefsError> {
        Self::default_path()
            .map(|path| Self { path })
            .ok_or(PrefsError::NoPath)
    }

    /// Backend at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_file(&self) -> Result<PreferenceFile, PrefsError> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(toml::from_str(&s)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PreferenceFile::default()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PreferenceBackend for TomlPreferenceFile {
    fn read_all(&self) -> Result<Vec<SourcePreference>, PrefsError> {
        Ok(self.read_file()?.sources)
    }

    fn upsert(&mut self, entry: &SourcePreference) -> Result<(), PrefsError> {
        let mut file = self.read_file()?;

        match file.sources.iter_mut().find(|e| e.station == entry.station) {
            Some(existing) => existing.source_index = entry.source_index,
            None => file.sources.push(entry.clone()),
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string_pretty(&file)?)?;
        Ok(())
    }
}

/// Volatile backend for tests and read-only environments
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Vec<SourcePreference>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded backend, as if the entries had been persisted earlier
    pub fn with_entries(entries: Vec<SourcePreference>) -> Self {
        Self { entries }
    }
}

impl PreferenceBackend for MemoryBackend {
    fn read_all(&self) -> Result<Vec<SourcePreference>, PrefsError> {
        Ok(self.entries.clone())
    }

    fn upsert(&mut self, entry: &SourcePreference) -> Result<(), PrefsError> {
        match self.entries.iter_mut().find(|e| e.station == entry.station) {
            Some(existing) => existing.source_index = entry.source_index,
            None => self.entries.push(entry.clone()),
        }
        Ok(())
    }
}
