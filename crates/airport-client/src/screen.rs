//! ScreenStateMachine turns snapshots into screen, overlay, sound and
//! feed updates.
//!
//! Each snapshot walks a fixed precedence list; the first rule that matches
//! decides the screen:
//!
//! ```text
//!  1. redirect_url set     → navigate, stop
//!  2. finished             → FINISHED overlay, stop
//!  3. no current game      → GAMES_MENU, no overlay, create control per `open`
//!  4. in flight            → IN_FLIGHT, progress
//!  5. hosting              → GAMES_MENU + START_GAME overlay
//!  6. waiting              → GAMES_MENU + WAIT_FOR_HOST overlay
//!  7. otherwise            → AIRPORT, flight table
//! ```
//!
//! Rules 3–7 are followed by the shared widgets (ticket, goals, stats,
//! clock, messages) and the PAUSED overlay, which covers any screen.
//! Screen entry, overlays, background, progress and cues are edge-driven:
//! they fire only when the derived value changes.  The widgets are redrawn
//! from every snapshot.

use airport_proto::message::Message;
use airport_proto::snapshot::{CurrentState, GameId, GameState, Snapshot};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::audio::{transition_cues, AudioCue, CueEngine};
use crate::feed::{FeedMode, MessageFeed};
use crate::overlay::{Overlay, OverlayContent, OverlayManager};
use crate::render::{flight_rows, Renderer};
use crate::state::{Screen, SessionState};

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Timed pull.
    Pull,
    /// Push channel.
    Push,
    /// Response to a request the player made.
    Response,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied(Screen),
    Finished,
    Navigated(String),
    /// Frame was malformed; nothing changed.
    Dropped,
}

pub struct ScreenStateMachine {
    state: SessionState,
    overlays: OverlayManager,
    feed: MessageFeed,
    cues: CueEngine,
    renderer: Box<dyn Renderer>,
    /// Game summary page; `?id=<game>` is appended.
    summary_url: String,
    /// Set while a create-game request is outstanding.
    creating_game: bool,
}

impl ScreenStateMachine {
    pub fn new(renderer: Box<dyn Renderer>, cues: CueEngine, summary_url: String) -> Self {
        Self {
            state: SessionState::default(),
            overlays: OverlayManager::new(),
            feed: MessageFeed::new(),
            cues,
            renderer,
            summary_url,
            creating_game: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    pub fn feed(&self) -> &MessageFeed {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut MessageFeed {
        &mut self.feed
    }

    pub fn creating_game(&self) -> bool {
        self.creating_game
    }

    /// While set, snapshots cannot dismiss START_GAME.
    pub fn set_creating_game(&mut self, creating: bool) {
        if self.creating_game != creating {
            debug!("screen: creating_game → {}", creating);
        }
        self.creating_game = creating;
    }

    pub fn play_cue(&mut self, cue: AudioCue) {
        self.cues.play(&cue);
    }

    /// Normalise a raw frame and apply it.  A frame that fails validation is
    /// logged and dropped without touching the session state.
    pub fn apply_value(&mut self, value: Value, source: SnapshotSource) -> ApplyOutcome {
        match Snapshot::from_value(value) {
            Ok(snapshot) => self.apply(snapshot, source),
            Err(e) => {
                warn!("screen: dropping malformed {:?} snapshot: {}", source, e);
                ApplyOutcome::Dropped
            }
        }
    }

    pub fn apply(&mut self, snapshot: Snapshot, source: SnapshotSource) -> ApplyOutcome {
        debug!("screen: applying {:?} snapshot", source);

        if let Some(url) = snapshot.redirect_url.as_deref() {
            info!("screen: redirect to {}", url);
            self.renderer.navigate(url);
            return ApplyOutcome::Navigated(url.to_string());
        }

        if snapshot.finished {
            let content = OverlayContent::Finished {
                summary_url: self.summary_link(snapshot.current_game),
            };
            self.sync_overlay(Some(content));
            return ApplyOutcome::Finished;
        }

        let prev = self.state.clone();

        let screen_overlay = match (snapshot.current_game, snapshot.current_state) {
            (None, state) => {
                self.enter_screen(Screen::GamesMenu);
                self.set_create_control(state == Some(CurrentState::Open));
                self.render_games(&snapshot);
                None
            }
            (Some(_), _) if snapshot.in_flight => {
                self.enter_screen(Screen::InFlight);
                self.set_background(snapshot.city.as_deref());
                if self.state.progress != Some(snapshot.percentage) {
                    self.renderer.set_progress(snapshot.percentage);
                    self.state.progress = Some(snapshot.percentage);
                }
                None
            }
            (Some(game_id), Some(CurrentState::Hosting)) => {
                self.enter_screen(Screen::GamesMenu);
                self.set_create_control(false);
                self.render_games(&snapshot);
                Some(OverlayContent::StartGame { game_id })
            }
            (Some(game_id), Some(CurrentState::Waiting)) => {
                self.enter_screen(Screen::GamesMenu);
                self.set_create_control(false);
                self.render_games(&snapshot);
                Some(OverlayContent::WaitForHost { game_id })
            }
            (Some(_), _) => {
                self.enter_screen(Screen::Airport);
                self.set_background(snapshot.city.as_deref());
                if let Some(city) = snapshot.city.as_deref() {
                    self.renderer.set_airport_name(city);
                }
                self.renderer.render_flights(&flight_rows(&snapshot.next_flights));
                None
            }
        };

        self.update_ticket(&snapshot);
        self.update_goals(&snapshot);
        self.renderer.render_stats(&snapshot.stats);
        if !snapshot.time.is_empty() {
            self.renderer.set_clock(&snapshot.time);
        }
        if !snapshot.messages.is_empty() {
            self.ingest_messages(&snapshot.messages, FeedMode::Live, false);
        }
        if let Some(text) = snapshot.notify_text.as_deref() {
            self.renderer.notify(text);
        }

        let overlay = if snapshot.game_state == GameState::Paused {
            Some(OverlayContent::Paused)
        } else {
            screen_overlay
        };
        self.sync_overlay(overlay);

        let cues = transition_cues(&prev, &self.state);
        self.cues.play_all(&cues);

        ApplyOutcome::Applied(self.state.current_screen())
    }

    /// Feed messages through the dedup feed and render the new ones.
    /// `audible` plays the per-type message sound for each new live message.
    pub fn ingest_messages(&mut self, messages: &[Message], mode: FeedMode, audible: bool) -> usize {
        let fresh = self.feed.ingest(messages, mode);
        self.state.last_message_id = self.feed.last_message_id();
        if fresh.is_empty() {
            return 0;
        }
        self.renderer.append_messages(&fresh);
        if audible && mode == FeedMode::Live {
            for m in &fresh {
                self.cues.play(&AudioCue::Message(m.kind.clone()));
            }
        }
        fresh.len()
    }

    /// Forward server-wide text to the player.
    pub fn announce(&mut self, text: &str) {
        self.renderer.notify(text);
    }

    // ── helpers ──────────────────────────────────────────────────────────────

    fn summary_link(&self, game: Option<GameId>) -> String {
        match game {
            Some(id) => format!("{}?id={}", self.summary_url, id),
            None => self.summary_url.clone(),
        }
    }

    fn enter_screen(&mut self, screen: Screen) {
        if self.state.screen == Some(screen) {
            return;
        }
        info!("screen: {:?} → {:?}", self.state.screen, screen);
        self.renderer.show_screen(screen);
        self.state.screen = Some(screen);
    }

    fn set_create_control(&mut self, visible: bool) {
        if self.state.create_control_visible != Some(visible) {
            self.renderer.set_create_control(visible);
            self.state.create_control_visible = Some(visible);
        }
    }

    fn render_games(&mut self, snapshot: &Snapshot) {
        if let Some(games) = snapshot.games.as_deref() {
            self.renderer.render_games(games);
        }
    }

    fn set_background(&mut self, city: Option<&str>) {
        if self.state.last_background.as_deref() != city {
            self.renderer.set_background(city);
            self.state.last_background = city.map(str::to_owned);
        }
    }

    fn update_ticket(&mut self, snapshot: &Snapshot) {
        match snapshot.ticket.as_ref() {
            Some(ticket) => {
                self.renderer.render_ticket(&snapshot.player, ticket);
                self.state.ticket_visible = true;
                self.state.last_ticket_number = Some(ticket.number);
            }
            None => {
                if self.state.ticket_visible {
                    self.renderer.hide_ticket();
                    self.state.ticket_visible = false;
                }
            }
        }
    }

    fn update_goals(&mut self, snapshot: &Snapshot) {
        let current = snapshot.current_goal_index();
        let mut highlight = false;
        if let Some(city) = snapshot.current_goal_city() {
            if self.state.last_goal_city.as_deref() != Some(city) {
                highlight = true;
                self.state.last_goal_city = Some(city.to_string());
            }
        }
        self.renderer.render_goals(&snapshot.goals, current, highlight);
    }

    /// Make `desired` the only visible overlay, hiding the previous one
    /// first.  START_GAME is not dismissed while a create request is pending.
    fn sync_overlay(&mut self, desired: Option<OverlayContent>) {
        let active = self.overlays.active();
        let target = desired.as_ref().map(OverlayContent::overlay);
        if active == target {
            return;
        }
        if self.creating_game && active == Some(Overlay::StartGame) {
            debug!("screen: create pending, keeping START_GAME overlay");
            return;
        }
        if let Some(prev) = active {
            if self.overlays.hide(prev) {
                self.renderer.hide_overlay(prev);
            }
        }
        if let Some(content) = desired {
            if self.overlays.show(content.overlay()) {
                self.renderer.show_overlay(&content);
            }
        }
        self.state.current_overlay = self.overlays.active();
    }
}
