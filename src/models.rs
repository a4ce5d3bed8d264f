//! Data structures and types for tvplay
//!
//! Contains the shared models used across the application:
//! - **Catalog**: stations and their alternate stream sources
//! - **Playback**: session state, status, and player conditions
//! - **Navigation**: cycling direction for station/source switching

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Catalog Models
// =============================================================================

/// A named channel entry in the station catalog.
///
/// `index` is the 0-based position in the catalog and is only stable within
/// one catalog load. The sentinel returned by [`Station::placeholder`] uses
/// index `-1` to mean "nothing selected yet".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub index: i32,
    pub name: String,
    /// Relative logo reference, resolved by the presentation layer
    /// against the configured base URL. May be empty.
    pub logo: String,
    /// Alternate stream URLs. Non-empty for every station that came out
    /// of a catalog load.
    pub sources: Vec<String>,
}

impl Station {
    /// Sentinel station shown before the user selects anything.
    pub fn placeholder() -> Self {
        Self {
            index: -1,
            name: "TV Player".to_string(),
            logo: String::new(),
            sources: vec![String::new()],
        }
    }

    /// True for the pre-selection sentinel.
    pub fn is_placeholder(&self) -> bool {
        self.index < 0
    }

    /// Number of alternate sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sources.len() > 1 {
            write!(f, "{} ({} sources)", self.name, self.sources.len())
        } else {
            write!(f, "{}", self.name)
        }
    }
}

// =============================================================================
// Playback Models
// =============================================================================

/// Coarse playback status as presented to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Nothing selected / player untouched
    #[default]
    Idle,
    /// A source was handed to the player and has not reported in yet,
    /// or the player is buffering
    Loading,
    /// Stream is rendering
    Playing,
    /// Paused by the user while it was playing
    Paused,
    /// Stream never played, or the player instruction could not be issued
    Error,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "Idle"),
            PlaybackStatus::Loading => write!(f, "Loading..."),
            PlaybackStatus::Playing => write!(f, "Playing"),
            PlaybackStatus::Paused => write!(f, "Paused"),
            PlaybackStatus::Error => write!(f, "Load failed, try switching source"),
        }
    }
}

/// Underlying condition reported by the player collaborator.
///
/// Deliberately coarser than [`PlaybackStatus`]: the controller derives the
/// user-facing status from the transition between two conditions, not from
/// a single report (a `Paused` that never played maps to an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCondition {
    Playing,
    Paused,
    /// Buffering, stalled, or not started
    Other,
}

/// Cycling direction for station and source navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// The currently playing station/source/status, one per active player view.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub station: Station,
    pub source_index: usize,
    pub status: PlaybackStatus,
    /// Derived indicator, `"2/3"` style; empty for single-source stations.
    pub source_label: String,
}

impl PlaybackSession {
    /// Session shown before any selection: sentinel station, idle status.
    pub fn new() -> Self {
        Self {
            station: Station::placeholder(),
            source_index: 0,
            status: PlaybackStatus::Idle,
            source_label: String::new(),
        }
    }

    /// Point the session at a station/source pair and refresh the label.
    pub fn set_current(&mut self, station: Station, source_index: usize) {
        self.station = station;
        self.set_source(source_index);
    }

    /// Change only the source and refresh the label.
    pub fn set_source(&mut self, source_index: usize) {
        self.source_index = source_index;
        self.source_label = source_label(source_index, self.station.sources.len());
    }

    /// URL of the currently selected source, if the station has any.
    pub fn current_url(&self) -> Option<&str> {
        self.station.sources.get(self.source_index).map(String::as_str)
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Format the source indicator. Single-source stations show nothing.
pub fn source_label(source_index: usize, source_count: usize) -> String {
    if source_count <= 1 {
        String::new()
    } else {
        format!("{}/{}", source_index + 1, source_count)
    }
}
