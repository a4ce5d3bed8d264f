//! tvplay - shell around mpv for live TV station streams
//!
//! Fetches a remote catalog of television stations, tracks the current
//! station/source/playback status, remembers the last working source per
//! station, and samples network throughput for the loading indicator.
//! Playback itself is delegated to an external player.
//!
//! # Modules
//!
//! - `models` - Stations, playback session, status types
//! - `api` - Station catalog client
//! - `prefs` - Persisted per-station source preferences
//! - `stream` - Player contract, mpv adapter, bandwidth sampler
//! - `app` - Playback controller state machine
//! - `config` - TOML configuration

pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod prefs;
pub mod stream;

// Re-export commonly used types
pub use api::{CatalogClient, CatalogError, StationCatalog};
pub use app::{ControllerError, PlaybackController};
pub use config::Config;
pub use models::{Direction, PlaybackSession, PlaybackStatus, PlayerCondition, Station};
pub use prefs::{MemoryBackend, PreferenceBackend, SourcePreference, SourcePreferenceStore};
pub use stream::{BandwidthSampler, MediaPlayer, MpvPlayer, NetworkUsage, UsageSource};
