//! CLI command implementations
//!
//! Each command wires the catalog, controller, player, and sampler
//! together and returns a semantic exit code.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::api::{CatalogClient, StationCatalog};
use crate::app::PlaybackController;
use crate::cli::{ExitCode, Output, PlayCmd, SpeedCmd, StationsCmd};
use crate::config::Config;
use crate::models::{Direction, PlaybackStatus, Station};
use crate::prefs::{SourcePreferenceStore, TomlPreferenceFile};
use crate::stream::bandwidth::{self, ProcNetDev};
use crate::stream::MpvPlayer;

/// Fetch the catalog once, reporting failures as a network error
async fn load_catalog(config: &Config, output: &Output) -> Result<StationCatalog, ExitCode> {
    let client = CatalogClient::new(&config.catalog_url);
    let mut catalog = StationCatalog::new();
    match catalog.load(&client).await {
        Ok(()) => Ok(catalog),
        Err(e) => Err(output.error(e, ExitCode::NetworkError)),
    }
}

// =============================================================================
// stations
// =============================================================================

pub async fn stations_cmd(_cmd: StationsCmd, config: &Config, output: &Output) -> ExitCode {
    let catalog = match load_catalog(config, output).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    output.print(&catalog.stations(), || {
        if catalog.is_empty() {
            return "Catalog is empty".to_string();
        }
        catalog
            .stations()
            .iter()
            .map(|s| format!("{:3}  {}", s.index, s))
            .collect::<Vec<_>>()
            .join("\n")
    });
    ExitCode::Success
}

// =============================================================================
// play
// =============================================================================

pub async fn play_cmd(cmd: PlayCmd, config: &Config, output: &Output) -> ExitCode {
    let catalog = match load_catalog(config, output).await {
        Ok(c) => c,
        Err(code) => return code,
    };
    if catalog.is_empty() {
        return output.error("Catalog has no stations", ExitCode::StationNotFound);
    }

    let station = match pick_station(&catalog, &cmd) {
        Some(s) => s.clone(),
        None => {
            let wanted = cmd
                .station
                .clone()
                .or_else(|| cmd.index.map(|i| format!("#{}", i)))
                .unwrap_or_default();
            return output.error(
                format!("Station '{}' not in catalog", wanted),
                ExitCode::StationNotFound,
            );
        }
    };

    let prefs = match TomlPreferenceFile::open().and_then(SourcePreferenceStore::load) {
        Ok(p) => p,
        Err(e) => return output.error(e, ExitCode::Error),
    };

    let binary = config.player_binary();
    if !MpvPlayer::is_available(binary).await {
        return output.error(
            format!("Player '{}' not found. Install it first.", binary),
            ExitCode::PlayerFailed,
        );
    }
    let (player, mut conditions) = match MpvPlayer::spawn(binary).await {
        Ok(pair) => pair,
        Err(e) => return output.error(e, ExitCode::PlayerFailed),
    };

    let mut controller = PlaybackController::new(player, prefs);
    if let Err(e) = controller.select_station(&station) {
        return output.error(e, ExitCode::Error);
    }
    if let Some(source) = cmd.source {
        if source >= station.sources.len() {
            return output.error(
                format!("Station '{}' has {} sources", station.name, station.sources.len()),
                ExitCode::InvalidArgs,
            );
        }
        // Walk to the requested source so the choice is persisted like an
        // interactive switch would be
        while controller.session().source_index != source {
            let _ = controller.switch_source(Direction::Forward);
        }
    }
    print_session(&controller, output);

    info!(station = %station.name, "playback started; controls: n/b station, s/S source, p pause, q quit");
    let mut speed_rx = bandwidth::spawn(ProcNetDev::new());
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(condition) = conditions.recv() => {
                let before = controller.status();
                controller.handle_player_condition(condition);
                if controller.status() != before {
                    print_session(&controller, output);
                }
            }

            changed = speed_rx.changed() => {
                if changed.is_err() {
                    continue;
                }
                // The speed readout belongs to the loading indicator only
                if controller.status() == PlaybackStatus::Loading {
                    let speed = speed_rx.borrow_and_update().clone();
                    if !speed.is_empty() && !output.is_json() {
                        println!("  Loading ... {}", speed);
                    }
                }
            }

            line = stdin.next_line() => {
                let Ok(Some(line)) = line else { break };
                if !handle_key(&mut controller, &catalog, line.trim()) {
                    break;
                }
                print_session(&controller, output);
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    ExitCode::Success
}

fn pick_station<'a>(catalog: &'a StationCatalog, cmd: &PlayCmd) -> Option<&'a Station> {
    match (&cmd.station, cmd.index) {
        (Some(name), _) => catalog.find_by_name(name),
        (None, Some(index)) => catalog.get(index),
        (None, None) => catalog.get(0),
    }
}

/// One stdin control line. Returns false to quit.
fn handle_key<P, B>(
    controller: &mut PlaybackController<P, B>,
    catalog: &StationCatalog,
    key: &str,
) -> bool
where
    P: crate::stream::MediaPlayer,
    B: crate::prefs::PreferenceBackend,
{
    let result = match key {
        "q" => return false,
        "n" => controller.switch_station(catalog, Direction::Forward),
        "b" => controller.switch_station(catalog, Direction::Backward),
        "s" => controller.switch_source(Direction::Forward),
        "S" => controller.switch_source(Direction::Backward),
        "p" => {
            controller.toggle_pause();
            Ok(())
        }
        _ => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
    }
    true
}

fn print_session<P, B>(controller: &PlaybackController<P, B>, output: &Output)
where
    P: crate::stream::MediaPlayer,
    B: crate::prefs::PreferenceBackend,
{
    let session = controller.session();
    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "station": session.station.name,
                "source": session.source_index,
                "label": session.source_label,
                "status": session.status,
            })
        );
    } else if session.source_label.is_empty() {
        println!("{}  [{}]", session.station.name, session.status);
    } else {
        println!(
            "{} ({})  [{}]",
            session.station.name, session.source_label, session.status
        );
    }
}

// =============================================================================
// speed
// =============================================================================

pub async fn speed_cmd(cmd: SpeedCmd, output: &Output) -> ExitCode {
    let mut speed_rx = bandwidth::spawn(ProcNetDev::new());

    for _ in 0..cmd.seconds {
        if speed_rx.changed().await.is_err() {
            return output.error("Sampler stopped unexpectedly", ExitCode::Error);
        }
        let speed = speed_rx.borrow_and_update().clone();
        if output.is_json() {
            println!("{}", serde_json::json!({ "speed": speed }));
        } else {
            println!("{}", speed);
        }
    }

    ExitCode::Success
}
