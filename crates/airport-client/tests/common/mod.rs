#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use airport_client::audio::{AudioSink, CueEngine};
use airport_client::overlay::{Overlay, OverlayContent};
use airport_client::render::{FlightRow, Renderer};
use airport_client::screen::ScreenStateMachine;
use airport_client::state::Screen;
use airport_client::sync::{SyncChannel, SyncEvent, SyncHandle};
use airport_client::transport::{GameApi, UserCommand};
use airport_proto::config::{AudioConfig, SyncConfig};
use airport_proto::error::TransportError;
use airport_proto::message::{Message, MessageQuery};
use airport_proto::push::PushEnvelope;
use airport_proto::snapshot::{GoalEntry, PlayerStat, Ticket};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ── scripted game server ──────────────────────────────────────────────────────

/// In-memory `GameApi`: serves queued frames, records what it was asked.
pub struct ScriptedServer {
    snapshots: Mutex<VecDeque<Value>>,
    fallback: Mutex<Value>,
    pull_delay: Duration,
    command_delay: Duration,
    failing_pulls: AtomicUsize,
    pulls: AtomicUsize,
    active_pulls: AtomicUsize,
    max_active_pulls: AtomicUsize,
    message_batches: Mutex<VecDeque<Vec<Message>>>,
    queries: Mutex<Vec<MessageQuery>>,
    commands: Mutex<Vec<UserCommand>>,
    command_reply: Mutex<Option<Value>>,
}

impl ScriptedServer {
    pub fn new(fallback: Value) -> Self {
        Self {
            snapshots: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            pull_delay: Duration::ZERO,
            command_delay: Duration::ZERO,
            failing_pulls: AtomicUsize::new(0),
            pulls: AtomicUsize::new(0),
            active_pulls: AtomicUsize::new(0),
            max_active_pulls: AtomicUsize::new(0),
            message_batches: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
            command_reply: Mutex::new(None),
        }
    }

    pub fn with_pull_delay(mut self, delay: Duration) -> Self {
        self.pull_delay = delay;
        self
    }

    pub fn with_command_delay(mut self, delay: Duration) -> Self {
        self.command_delay = delay;
        self
    }

    pub fn queue_snapshot(&self, frame: Value) {
        self.snapshots.lock().unwrap().push_back(frame);
    }

    pub fn set_fallback(&self, frame: Value) {
        *self.fallback.lock().unwrap() = frame;
    }

    pub fn fail_next_pulls(&self, n: usize) {
        self.failing_pulls.store(n, Ordering::SeqCst);
    }

    pub fn queue_messages(&self, batch: Vec<Message>) {
        self.message_batches.lock().unwrap().push_back(batch);
    }

    pub fn set_command_reply(&self, reply: Option<Value>) {
        *self.command_reply.lock().unwrap() = reply;
    }

    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    pub fn max_active_pulls(&self) -> usize {
        self.max_active_pulls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<MessageQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<UserCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl GameApi for ScriptedServer {
    async fn pull(&self) -> Result<Value, TransportError> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        let active = self.active_pulls.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_pulls.fetch_max(active, Ordering::SeqCst);
        if !self.pull_delay.is_zero() {
            tokio::time::sleep(self.pull_delay).await;
        }
        self.active_pulls.fetch_sub(1, Ordering::SeqCst);

        let failing = self.failing_pulls.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_pulls.store(failing - 1, Ordering::SeqCst);
            return Err(TransportError::Status(502));
        }
        let queued = self.snapshots.lock().unwrap().pop_front();
        Ok(queued.unwrap_or_else(|| self.fallback.lock().unwrap().clone()))
    }

    async fn fetch_messages(&self, query: MessageQuery) -> Result<Vec<Message>, TransportError> {
        self.queries.lock().unwrap().push(query);
        Ok(self.message_batches.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn send_command(&self, command: UserCommand) -> Result<Option<Value>, TransportError> {
        self.commands.lock().unwrap().push(command);
        if !self.command_delay.is_zero() {
            tokio::time::sleep(self.command_delay).await;
        }
        Ok(self.command_reply.lock().unwrap().clone())
    }
}

// ── recording renderer / audio sink ───────────────────────────────────────────

/// Records every renderer call and played sound as a short string.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
    sounds: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sounds(&self) -> Vec<String> {
        self.sounds.lock().unwrap().clone()
    }

    pub fn screens(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("screen:"))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Renderer for Recorder {
    fn navigate(&mut self, url: &str) {
        self.record(format!("navigate:{}", url));
    }
    fn show_screen(&mut self, screen: Screen) {
        self.record(format!("screen:{:?}", screen));
    }
    fn show_overlay(&mut self, content: &OverlayContent) {
        self.record(format!("show:{:?}", content.overlay()));
    }
    fn hide_overlay(&mut self, overlay: Overlay) {
        self.record(format!("hide:{:?}", overlay));
    }
    fn set_create_control(&mut self, visible: bool) {
        self.record(format!("create-control:{}", visible));
    }
    fn set_background(&mut self, city: Option<&str>) {
        self.record(format!("background:{}", city.unwrap_or("-")));
    }
    fn set_airport_name(&mut self, name: &str) {
        self.record(format!("airport:{}", name));
    }
    fn set_progress(&mut self, percentage: u8) {
        self.record(format!("progress:{}", percentage));
    }
    fn render_flights(&mut self, rows: &[FlightRow]) {
        self.record(format!("flights:{}", rows.len()));
    }
    fn render_ticket(&mut self, _player: &str, ticket: &Ticket) {
        self.record(format!("ticket:{}", ticket.number));
    }
    fn hide_ticket(&mut self) {
        self.record("ticket:hidden".to_string());
    }
    fn render_goals(&mut self, _goals: &[GoalEntry], _current: Option<usize>, _highlight: bool) {}
    fn render_stats(&mut self, _stats: &[PlayerStat]) {}
    fn set_clock(&mut self, _time: &str) {}
    fn append_messages(&mut self, messages: &[Message]) {
        let ids: Vec<String> = messages.iter().map(|m| m.id.to_string()).collect();
        self.record(format!("messages:{}", ids.join(",")));
    }
    fn notify(&mut self, text: &str) {
        self.record(format!("notify:{}", text));
    }
}

impl AudioSink for Recorder {
    fn play(&mut self, sound: &str) {
        self.sounds.lock().unwrap().push(sound.to_string());
    }
}

// ── session harness ───────────────────────────────────────────────────────────

pub struct Session {
    pub handle: SyncHandle,
    /// Raw sender, for injecting push envelopes.
    pub events: mpsc::Sender<SyncEvent>,
    pub recorder: Recorder,
    pub task: JoinHandle<ScreenStateMachine>,
}

impl Session {
    pub async fn push(&self, kind: &str, data: Value) {
        self.events
            .send(SyncEvent::Push(PushEnvelope::new(kind, data)))
            .await
            .unwrap();
    }

    pub async fn finish(self) -> (ScreenStateMachine, Recorder) {
        self.handle.teardown().await;
        let machine = self.task.await.unwrap();
        (machine, self.recorder)
    }
}

pub fn sync_config() -> SyncConfig {
    SyncConfig {
        poll_interval_ms: 5000,
        message_interval_ms: 5000,
        ..SyncConfig::default()
    }
}

pub fn start(server: Arc<ScriptedServer>) -> Session {
    let recorder = Recorder::default();
    let cues = CueEngine::new(AudioConfig::default(), Box::new(recorder.clone()));
    let machine = ScreenStateMachine::new(
        Box::new(recorder.clone()),
        cues,
        "http://test/airport/game_summary/".to_string(),
    );
    let (tx, rx) = mpsc::channel(256);
    let channel = SyncChannel::new(server, machine, sync_config(), tx.clone());
    let handle = channel.handle();
    let task = tokio::spawn(channel.run(rx));
    Session {
        handle,
        events: tx,
        recorder,
        task,
    }
}

pub fn redirect_frame(url: &str) -> Value {
    json!({"redirect": url})
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

// ── frames ────────────────────────────────────────────────────────────────────

pub fn airport_frame(game: u64) -> Value {
    json!({
        "player": "alice",
        "time": "3:15 p.m.",
        "game": game,
        "game_state": "Started",
        "airport": "Charles de Gaulle",
        "city": "Paris",
        "ticket": null,
        "next_flights": [],
        "in_flight": false,
        "finished": false,
        "percentage": 0,
        "goals": [["Rome", false], ["Oslo", false]],
        "stats": [["alice", 0]],
        "notify": null
    })
}

pub fn flight_frame(game: u64, percentage: u8) -> Value {
    let mut frame = airport_frame(game);
    frame["in_flight"] = json!(true);
    frame["percentage"] = json!(percentage);
    frame["ticket"] = json!({
        "number": 1201,
        "status": "En route",
        "origin": {"airport": "CDG", "city": "Paris", "code": "cdg"},
        "destination": {"airport": "FCO", "city": "Rome", "code": "fco"},
        "depart_time": "3:00 p.m.",
        "arrival_time": "5:00 p.m."
    });
    frame
}

pub fn lobby_frame(state: &str, game: Option<u64>) -> Value {
    json!({
        "current_game": game,
        "current_state": state,
        "finished_current": false,
        "games": []
    })
}

pub fn message(id: u64, kind: &str) -> Message {
    serde_json::from_value(json!({"id": id, "type": kind, "text": format!("message {}", id)}))
        .unwrap()
}
