//! Playback state machine
//!
//! [`PlaybackController`] owns the current playback session and drives it
//! from two directions: navigation calls coming from one control-flow
//! context (station select, source/station cycling, pause toggle) and
//! asynchronous condition reports coming back from the player collaborator.
//! Observers follow committed transitions on a watch channel.

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::StationCatalog;
use crate::models::{Direction, PlaybackSession, PlaybackStatus, PlayerCondition, Station};
use crate::prefs::{PreferenceBackend, SourcePreferenceStore};
use crate::stream::MediaPlayer;

/// Navigation error types
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Station has no playable sources; the session is left unchanged
    #[error("Station '{0}' has no playable sources")]
    InvalidStation(String),
}

/// Owns the playback session and the collaborators that act on it.
///
/// Navigation calls mutate the session synchronously and hand the selected
/// source URL to the player; the status then follows the player's reports.
/// Two reports are never interleaved: they are applied on the caller's
/// single control-flow context, one at a time.
pub struct PlaybackController<P, B> {
    session: PlaybackSession,
    player: P,
    prefs: SourcePreferenceStore<B>,
    /// Previous underlying player condition, for the paused-vs-error call
    last_condition: Option<PlayerCondition>,
    /// One-way latch: cleared by the first successful play of the session
    show_placeholder: bool,
    notify: watch::Sender<PlaybackSession>,
}

impl<P: MediaPlayer, B: PreferenceBackend> PlaybackController<P, B> {
    pub fn new(player: P, prefs: SourcePreferenceStore<B>) -> Self {
        let session = PlaybackSession::new();
        let (notify, _) = watch::channel(session.clone());
        Self {
            session,
            player,
            prefs,
            last_condition: None,
            show_placeholder: true,
            notify,
        }
    }

    /// Subscribe to committed session transitions. The receiver always
    /// holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSession> {
        self.notify.subscribe()
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn status(&self) -> PlaybackStatus {
        self.session.status
    }

    /// Whether the presentation layer should still show the placeholder
    /// logo (nothing has played yet this session).
    pub fn show_placeholder(&self) -> bool {
        self.show_placeholder
    }

    /// The player collaborator, for host wiring and inspection
    pub fn player(&self) -> &P {
        &self.player
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Select a station from the catalog and start playing it.
    ///
    /// Resumes at the station's persisted source preference when one is
    /// stored and still in range for this catalog load; source 0 otherwise.
    pub fn select_station(&mut self, station: &Station) -> Result<(), ControllerError> {
        if station.sources.is_empty() {
            return Err(ControllerError::InvalidStation(station.name.clone()));
        }

        let mut source_index = self.prefs.get(&station.name);
        if source_index >= station.sources.len() {
            source_index = 0;
        }

        self.session.set_current(station.clone(), source_index);
        self.start_playback();
        Ok(())
    }

    /// Cycle to the adjacent source of the current station, wrapping at
    /// both ends, and persist the choice under the station's name.
    pub fn switch_source(&mut self, direction: Direction) -> Result<(), ControllerError> {
        let count = self.session.station.sources.len();
        if count == 0 {
            return Err(ControllerError::InvalidStation(
                self.session.station.name.clone(),
            ));
        }

        let index = self.session.source_index;
        let index = match direction {
            Direction::Forward => (index + 1) % count,
            Direction::Backward => (index + count - 1) % count,
        };

        if let Err(e) = self.prefs.set(&self.session.station.name, index) {
            warn!(station = %self.session.station.name, error = %e, "source preference not saved");
        }

        self.session.set_source(index);
        self.start_playback();
        Ok(())
    }

    /// Cycle to the adjacent catalog station, wrapping at both ends.
    /// The new station always starts at source 0.
    pub fn switch_station(
        &mut self,
        catalog: &StationCatalog,
        direction: Direction,
    ) -> Result<(), ControllerError> {
        if catalog.is_empty() {
            return Err(ControllerError::InvalidStation(
                self.session.station.name.clone(),
            ));
        }

        let count = catalog.len() as i32;
        let index = self.session.station.index;
        // The sentinel's -1 lands on station 0 going forward and on the
        // last station going backward, like any other out-of-range step.
        let index = match direction {
            Direction::Forward => {
                if index + 1 >= count {
                    0
                } else {
                    index + 1
                }
            }
            Direction::Backward => {
                if index - 1 < 0 {
                    count - 1
                } else {
                    index - 1
                }
            }
        };

        let station = catalog
            .get(index as usize)
            .cloned()
            .ok_or_else(|| ControllerError::InvalidStation(format!("#{}", index)))?;

        self.session.set_current(station, 0);
        self.start_playback();
        Ok(())
    }

    /// Pause if playing, resume otherwise. Station and source stay put;
    /// the status follows from the player's next report.
    pub fn toggle_pause(&mut self) {
        if self.session.status == PlaybackStatus::Playing {
            self.player.pause();
        } else {
            self.player.resume();
        }
    }

    /// Hand the current source to the player and enter Loading, or Error
    /// when the instruction itself cannot be issued.
    fn start_playback(&mut self) {
        let url = self.session.current_url().unwrap_or_default().to_string();
        debug!(station = %self.session.station.name, url, "starting playback");

        match self.player.load_and_play(&url) {
            Ok(()) => self.session.status = PlaybackStatus::Loading,
            Err(e) => {
                warn!(url, error = %e, "player instruction failed");
                self.session.status = PlaybackStatus::Error;
            }
        }
        self.publish();
    }

    // =========================================================================
    // Player reports
    // =========================================================================

    /// Apply one asynchronous condition report from the player.
    ///
    /// Redundant reports (same condition as the previous one) are dropped
    /// without a transition or a notification. A `Paused` report only counts
    /// as a user pause when the stream was just playing; a stream that
    /// pauses without ever having played never started at all.
    pub fn handle_player_condition(&mut self, condition: PlayerCondition) {
        let previous = self.last_condition;
        if previous == Some(condition) {
            return;
        }
        self.last_condition = Some(condition);

        let status = match condition {
            PlayerCondition::Playing => PlaybackStatus::Playing,
            PlayerCondition::Paused => {
                if previous == Some(PlayerCondition::Playing) {
                    PlaybackStatus::Paused
                } else {
                    PlaybackStatus::Error
                }
            }
            PlayerCondition::Other => PlaybackStatus::Loading,
        };

        if status == PlaybackStatus::Playing {
            // One-way: once anything has played, the placeholder stays gone
            self.show_placeholder = false;
        }

        self.session.status = status;
        self.publish();
    }

    fn publish(&self) {
        self.notify.send_replace(self.session.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryBackend;

    /// Player double that records every instruction
    #[derive(Default)]
    struct FakePlayer {
        loads: Vec<String>,
        pauses: u32,
        resumes: u32,
        fail_loads: bool,
    }

    impl MediaPlayer for FakePlayer {
        fn load_and_play(&mut self, url: &str) -> Result<(), crate::stream::PlayerError> {
            if self.fail_loads {
                return Err(crate::stream::PlayerError::InvalidUrl(url.to_string()));
            }
            self.loads.push(url.to_string());
            Ok(())
        }

        fn pause(&mut self) {
            self.pauses += 1;
        }

        fn resume(&mut self) {
            self.resumes += 1;
        }
    }

    fn station(index: i32, name: &str, sources: &[&str]) -> Station {
        Station {
            index,
            name: name.to_string(),
            logo: String::new(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn controller() -> PlaybackController<FakePlayer, MemoryBackend> {
        PlaybackController::new(
            FakePlayer::default(),
            SourcePreferenceStore::load(MemoryBackend::new()).unwrap(),
        )
    }

    fn catalog_of(stations: Vec<Station>) -> StationCatalog {
        StationCatalog::with_stations(stations)
    }

    #[test]
    fn test_initial_session_is_idle_placeholder() {
        let c = controller();
        assert_eq!(c.status(), PlaybackStatus::Idle);
        assert!(c.session().station.is_placeholder());
        assert!(c.show_placeholder());
    }

    #[test]
    fn test_select_station_starts_at_source_zero() {
        let mut c = controller();
        let s = station(0, "News", &["u1", "u2"]);
        c.select_station(&s).unwrap();

        assert_eq!(c.session().source_index, 0);
        assert_eq!(c.session().source_label, "1/2");
        assert_eq!(c.status(), PlaybackStatus::Loading);
        assert_eq!(c.player.loads, vec!["u1"]);
    }

    #[test]
    fn test_select_station_resumes_persisted_source() {
        let mut c = controller();
        c.prefs.set("News", 1).unwrap();

        let s = station(0, "News", &["u1", "u2"]);
        c.select_station(&s).unwrap();

        assert_eq!(c.session().source_index, 1);
        assert_eq!(c.player.loads, vec!["u2"]);
    }

    #[test]
    fn test_select_station_ignores_out_of_range_preference() {
        let mut c = controller();
        c.prefs.set("News", 7).unwrap();

        let s = station(0, "News", &["u1", "u2"]);
        c.select_station(&s).unwrap();
        assert_eq!(c.session().source_index, 0);
    }

    #[test]
    fn test_switch_source_wraps_both_ways() {
        let mut c = controller();
        let s = station(0, "News", &["u1", "u2", "u3"]);
        c.select_station(&s).unwrap();

        c.switch_source(Direction::Backward).unwrap();
        assert_eq!(c.session().source_index, 2);
        assert_eq!(c.session().source_label, "3/3");

        c.switch_source(Direction::Forward).unwrap();
        assert_eq!(c.session().source_index, 0);
    }

    #[test]
    fn test_switch_source_full_cycle_returns_home() {
        let mut c = controller();
        let s = station(0, "News", &["u1", "u2", "u3"]);
        c.select_station(&s).unwrap();

        for _ in 0..3 {
            c.switch_source(Direction::Forward).unwrap();
        }
        assert_eq!(c.session().source_index, 0);
    }

    #[test]
    fn test_switch_source_persists_choice() {
        let mut c = controller();
        let s = station(0, "News", &["u1", "u2"]);
        c.select_station(&s).unwrap();
        c.switch_source(Direction::Forward).unwrap();

        assert_eq!(c.prefs.get("News"), 1);
    }

    #[test]
    fn test_switch_station_wraps_and_resets_source() {
        let mut c = controller();
        let catalog = catalog_of(vec![
            station(0, "A", &["a1", "a2"]),
            station(1, "B", &["b1"]),
        ]);

        c.select_station(catalog.get(0).unwrap()).unwrap();
        c.switch_source(Direction::Forward).unwrap();
        assert_eq!(c.session().source_index, 1);

        c.switch_station(&catalog, Direction::Forward).unwrap();
        assert_eq!(c.session().station.name, "B");
        assert_eq!(c.session().source_index, 0);
        assert_eq!(c.session().source_label, "");

        // Forward past the end wraps to the first station
        c.switch_station(&catalog, Direction::Forward).unwrap();
        assert_eq!(c.session().station.name, "A");

        c.switch_station(&catalog, Direction::Backward).unwrap();
        assert_eq!(c.session().station.name, "B");
    }

    #[test]
    fn test_switch_station_from_sentinel() {
        let mut c = controller();
        let catalog = catalog_of(vec![
            station(0, "A", &["a1"]),
            station(1, "B", &["b1"]),
            station(2, "C", &["c1"]),
        ]);

        c.switch_station(&catalog, Direction::Forward).unwrap();
        assert_eq!(c.session().station.name, "A");

        let mut c = controller();
        c.switch_station(&catalog, Direction::Backward).unwrap();
        assert_eq!(c.session().station.name, "C");
    }

    #[test]
    fn test_forward_then_backward_returns_to_same_station() {
        let mut c = controller();
        let catalog = catalog_of(vec![
            station(0, "A", &["a1"]),
            station(1, "B", &["b1"]),
            station(2, "C", &["c1"]),
        ]);
        c.select_station(catalog.get(1).unwrap()).unwrap();

        c.switch_station(&catalog, Direction::Forward).unwrap();
        c.switch_station(&catalog, Direction::Backward).unwrap();
        assert_eq!(c.session().station.index, 1);
    }

    #[test]
    fn test_empty_sources_is_invalid_station() {
        let mut c = controller();
        let s = Station {
            index: 0,
            name: "Broken".to_string(),
            logo: String::new(),
            sources: vec![],
        };

        let before = c.session().clone();
        assert!(matches!(
            c.select_station(&s),
            Err(ControllerError::InvalidStation(_))
        ));
        assert_eq!(c.session(), &before);
        assert!(c.player.loads.is_empty());
    }

    #[test]
    fn test_failed_player_instruction_surfaces_error_status() {
        let mut c = controller();
        c.player.fail_loads = true;

        let s = station(0, "News", &["not a url"]);
        c.select_station(&s).unwrap();
        assert_eq!(c.status(), PlaybackStatus::Error);
    }

    #[test]
    fn test_toggle_pause_routes_on_status() {
        let mut c = controller();
        let s = station(0, "News", &["u1"]);
        c.select_station(&s).unwrap();

        // Not playing yet: toggling asks the player to play
        c.toggle_pause();
        assert_eq!(c.player.resumes, 1);

        c.handle_player_condition(PlayerCondition::Playing);
        c.toggle_pause();
        assert_eq!(c.player.pauses, 1);

        // Session target is untouched by pause toggling
        assert_eq!(c.session().station.name, "News");
        assert_eq!(c.session().source_index, 0);
    }

    #[test]
    fn test_condition_mapping_basic() {
        let mut c = controller();
        c.handle_player_condition(PlayerCondition::Other);
        assert_eq!(c.status(), PlaybackStatus::Loading);

        c.handle_player_condition(PlayerCondition::Playing);
        assert_eq!(c.status(), PlaybackStatus::Playing);

        c.handle_player_condition(PlayerCondition::Other);
        assert_eq!(c.status(), PlaybackStatus::Loading);
    }

    #[test]
    fn test_paused_after_playing_is_paused() {
        let mut c = controller();
        c.handle_player_condition(PlayerCondition::Playing);
        c.handle_player_condition(PlayerCondition::Paused);
        assert_eq!(c.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_paused_without_playing_is_error() {
        let mut c = controller();
        c.handle_player_condition(PlayerCondition::Other);
        c.handle_player_condition(PlayerCondition::Paused);
        assert_eq!(c.status(), PlaybackStatus::Error);

        // Same for the very first report of the session
        let mut c = controller();
        c.handle_player_condition(PlayerCondition::Paused);
        assert_eq!(c.status(), PlaybackStatus::Error);
    }

    #[test]
    fn test_redundant_reports_are_dropped() {
        let mut c = controller();
        let mut rx = c.subscribe();

        c.handle_player_condition(PlayerCondition::Playing);
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        c.handle_player_condition(PlayerCondition::Playing);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(c.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn test_placeholder_latch_clears_once() {
        let mut c = controller();
        assert!(c.show_placeholder());

        c.handle_player_condition(PlayerCondition::Playing);
        assert!(!c.show_placeholder());

        // Stays cleared through later stalls and errors
        c.handle_player_condition(PlayerCondition::Other);
        c.handle_player_condition(PlayerCondition::Paused);
        assert!(!c.show_placeholder());
    }

    #[test]
    fn test_subscribe_sees_navigation_transitions() {
        let mut c = controller();
        let mut rx = c.subscribe();

        let s = station(0, "News", &["u1", "u2"]);
        c.select_station(&s).unwrap();

        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.station.name, "News");
        assert_eq!(snapshot.status, PlaybackStatus::Loading);
    }
}
