//! CLI - Command line interface for tvplay
//!
//! Every operation of the player shell is scriptable:
//!
//! ```bash
//! # List the catalog
//! tvplay stations --json
//!
//! # Play a station (interactive controls on stdin)
//! tvplay play CCTV-1
//! tvplay play --index 3 --source 1
//!
//! # Watch the bandwidth sampler on its own
//! tvplay speed --seconds 10
//! ```

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Catalog fetch failed
    NetworkError = 3,
    /// Station not found in the catalog
    StationNotFound = 4,
    /// Player could not be started
    PlayerFailed = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// tvplay - shell around mpv for live TV station streams
#[derive(Parser, Debug)]
#[command(
    name = "tvplay",
    version,
    about = "Shell around mpv for live TV station streams",
    long_about = "Fetches a remote station catalog, plays the selected \
                  station through mpv, and cycles through alternate \
                  sources when a stream fails."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Override the configured catalog URL
    #[arg(long, global = true)]
    pub catalog_url: Option<String>,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch and list the station catalog
    Stations(StationsCmd),
    /// Select a station and play it
    Play(PlayCmd),
    /// Run the bandwidth sampler standalone
    Speed(SpeedCmd),
}

#[derive(Args, Debug)]
pub struct StationsCmd {}

#[derive(Args, Debug)]
pub struct PlayCmd {
    /// Station name (defaults to the first catalog entry)
    pub station: Option<String>,

    /// Catalog index instead of a name
    #[arg(long, conflicts_with = "station")]
    pub index: Option<usize>,

    /// Source index override (defaults to the persisted preference)
    #[arg(long)]
    pub source: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SpeedCmd {
    /// How many samples to print before exiting
    #[arg(long, default_value_t = 5)]
    pub seconds: u32,
}

// =============================================================================
// Output
// =============================================================================

/// Output routing for CLI commands (human text or JSON lines)
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self { json: cli.json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print a payload as JSON, or via the provided human formatter
    pub fn print<T: serde::Serialize>(&self, payload: &T, human: impl FnOnce() -> String) {
        if self.json {
            match serde_json::to_string_pretty(payload) {
                Ok(s) => println!("{}", s),
                Err(e) => eprintln!("JSON encode failed: {}", e),
            }
        } else {
            println!("{}", human());
        }
    }

    /// Report an error and pass the exit code through
    pub fn error(&self, message: impl std::fmt::Display, code: ExitCode) -> ExitCode {
        if self.json {
            println!(
                "{}",
                serde_json::json!({ "error": message.to_string(), "code": code as i32 })
            );
        } else {
            eprintln!("Error: {}", message);
        }
        code
    }
}
