//! External player contract and mpv adapter
//!
//! The controller only needs three instructions (load a URL, pause, resume)
//! and a stream of coarse condition reports back. [`MpvPlayer`] implements
//! that contract over mpv's JSON IPC socket: it observes the `pause` and
//! `core-idle` properties and folds every change into a
//! [`PlayerCondition`](crate::models::PlayerCondition).

use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[cfg(unix)]
use tokio::net::UnixStream;

use crate::models::PlayerCondition;

/// Errors from player operations
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player '{0}' not found. Install it first.")]
    NotFound(String),

    #[error("Failed to start player: {0}")]
    StartFailed(#[from] std::io::Error),

    #[error("Not a playable URL: {0}")]
    InvalidUrl(String),

    #[error("Player connection lost")]
    Disconnected,
}

/// The external player collaborator.
///
/// `load_and_play` supersedes any in-flight load; there is no other
/// cancellation path. `pause`/`resume` are fire-and-forget.
pub trait MediaPlayer {
    fn load_and_play(&mut self, url: &str) -> Result<(), PlayerError>;
    fn pause(&mut self);
    fn resume(&mut self);
}

// =============================================================================
// mpv adapter
// =============================================================================

/// Fixed observe_property IDs; matched against property-change events.
const OBS_CORE_IDLE: u64 = 1;
const OBS_PAUSE: u64 = 2;

/// mpv driven over its JSON IPC socket.
///
/// Spawned once per session with `--idle`, so station switches reuse the
/// same process via `loadfile ... replace`.
pub struct MpvPlayer {
    child: Child,
    commands: mpsc::UnboundedSender<Value>,
}

impl MpvPlayer {
    /// Check whether the mpv binary is on PATH
    pub async fn is_available(binary: &str) -> bool {
        Command::new("which")
            .arg(binary)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Spawn mpv and connect to its IPC socket.
    ///
    /// Returns the player handle plus the channel on which condition
    /// reports arrive.
    #[cfg(unix)]
    pub async fn spawn(
        binary: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PlayerCondition>), PlayerError> {
        let socket = ipc_socket_path();
        let _ = std::fs::remove_file(&socket);

        let child = Command::new(binary)
            .arg("--idle=yes")
            .arg("--force-window=immediate")
            .arg("--no-terminal")
            .arg(format!("--input-ipc-server={}", socket.display()))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PlayerError::NotFound(binary.to_string())
                } else {
                    PlayerError::StartFailed(e)
                }
            })?;

        let stream = connect_with_retry(&socket).await?;
        let (read_half, write_half) = stream.into_split();

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(writer_task(write_half, cmd_rx));
        tokio::spawn(reader_task(read_half, event_tx));

        // Property subscriptions drive the whole condition stream
        let player = Self {
            child,
            commands: cmd_tx,
        };
        player.send(json!(["observe_property", OBS_CORE_IDLE, "core-idle"]));
        player.send(json!(["observe_property", OBS_PAUSE, "pause"]));

        Ok((player, event_rx))
    }

    fn send(&self, command: Value) {
        if self.commands.send(command).is_err() {
            warn!("mpv writer task gone, command dropped");
        }
    }

    /// Whether the mpv process is still alive
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl MediaPlayer for MpvPlayer {
    fn load_and_play(&mut self, url: &str) -> Result<(), PlayerError> {
        // Reject garbage before it reaches mpv, so the caller can surface
        // an error state immediately instead of waiting for a report.
        reqwest::Url::parse(url).map_err(|_| PlayerError::InvalidUrl(url.to_string()))?;

        if self.commands.is_closed() {
            return Err(PlayerError::Disconnected);
        }

        debug!(url, "loading stream");
        self.send(json!(["loadfile", url, "replace"]));
        self.send(json!(["set_property", "pause", false]));
        Ok(())
    }

    fn pause(&mut self) {
        self.send(json!(["set_property", "pause", true]));
    }

    fn resume(&mut self) {
        self.send(json!(["set_property", "pause", false]));
    }
}

#[cfg(unix)]
fn ipc_socket_path() -> PathBuf {
    std::env::temp_dir().join(format!("tvplay-mpv-{}.sock", std::process::id()))
}

/// mpv creates the socket a moment after startup; poll for it briefly.
#[cfg(unix)]
async fn connect_with_retry(socket: &PathBuf) -> Result<UnixStream, PlayerError> {
    for _ in 0..50 {
        match UnixStream::connect(socket).await {
            Ok(stream) => return Ok(stream),
            Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
    Err(PlayerError::Disconnected)
}

#[cfg(unix)]
async fn writer_task(
    mut write_half: tokio::net::unix::OwnedWriteHalf,
    mut commands: mpsc::UnboundedReceiver<Value>,
) {
    while let Some(command) = commands.recv().await {
        let mut line = json!({ "command": command }).to_string();
        line.push('\n');
        if write_half.write_all(line.as_bytes()).await.is_err() {
            warn!("mpv IPC write failed, stopping writer");
            break;
        }
    }
}

/// Reads JSON lines from mpv and folds `pause`/`core-idle` property changes
/// into condition reports. Responses to our own commands (anything carrying
/// an `error` field and no `event`) are ignored.
#[cfg(unix)]
async fn reader_task(
    read_half: tokio::net::unix::OwnedReadHalf,
    events: mpsc::UnboundedSender<PlayerCondition>,
) {
    let mut lines = BufReader::new(read_half).lines();
    let mut paused = false;
    let mut core_idle = true;

    while let Ok(Some(line)) = lines.next_line().await {
        let value: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(_) => continue,
        };

        let Some((id, data)) = as_property_change(&value) else {
            continue;
        };

        match id {
            OBS_PAUSE => paused = data.as_bool().unwrap_or(paused),
            OBS_CORE_IDLE => core_idle = data.as_bool().unwrap_or(core_idle),
            _ => continue,
        }

        let condition = fold_condition(paused, core_idle);
        if events.send(condition).is_err() {
            break;
        }
    }
}

/// Returns `Some((obs_id, data))` if this line is a property-change event.
fn as_property_change(value: &Value) -> Option<(u64, &Value)> {
    if value.get("event")?.as_str()? != "property-change" {
        return None;
    }
    let id = value.get("id")?.as_u64()?;
    Some((id, value.get("data").unwrap_or(&Value::Null)))
}

/// The three underlying conditions the controller distinguishes.
fn fold_condition(paused: bool, core_idle: bool) -> PlayerCondition {
    if paused {
        PlayerCondition::Paused
    } else if core_idle {
        PlayerCondition::Other
    } else {
        PlayerCondition::Playing
    }
}
