//! Playback and network plumbing
//!
//! - `player` - the external player contract and the mpv adapter
//! - `bandwidth` - periodic throughput sampling for the loading indicator

pub mod bandwidth;
pub mod player;

pub use bandwidth::{BandwidthSampler, NetworkUsage, UsageSource};
pub use player::{MediaPlayer, MpvPlayer, PlayerError};
