/// SyncChannel: the single event loop that owns the screen state machine.
///
/// Architecture:
///
/// ```text
///   pull timer ──PullDue──────┐
///   pull task ──PullCompleted─┤
///   message timer/task ───────┤
///   push listener ──Push──────┼──► mpsc ──► SyncChannel::run ──► ScreenStateMachine
///   SyncHandle ──Command/     │             (one event at a time)
///     Pause/Resume/Teardown ──┘
/// ```
///
/// Every source feeds the same queue, so snapshots are applied strictly in
/// arrival order and a push that lands while a pull response is being
/// applied waits for it.  The pull timer is re-armed only after the previous
/// pull has been processed, so pulls never overlap.
///
/// Cancellation:
///   - one root `CancellationToken` per session; teardown cancels it, which
///     stops every timer, in-flight request and the push listener.  A
///     snapshot that redirects navigates away, so it tears down too;
///   - one child token per armed pull timer; pause cancels just that.
use std::sync::Arc;

use airport_proto::config::SyncConfig;
use airport_proto::error::TransportError;
use airport_proto::message::Message;
use airport_proto::push::PushEnvelope;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::audio::AudioCue;
use crate::feed::FeedMode;
use crate::push::PushEvent;
use crate::screen::{ApplyOutcome, ScreenStateMachine, SnapshotSource};
use crate::transport::{GameApi, UserCommand};

#[derive(Debug)]
pub enum SyncEvent {
    /// Pull timer fired.
    PullDue,
    PullCompleted(Result<Value, TransportError>),
    /// Message timer fired.
    MessagesDue,
    MessagesFetched {
        mode: FeedMode,
        result: Result<Vec<Message>, TransportError>,
    },
    /// Envelope from the push listener.
    Push(PushEnvelope),
    /// The player asked for something.
    Command(UserCommand),
    CommandCompleted {
        command: UserCommand,
        result: Result<Option<Value>, TransportError>,
    },
    /// Stop the pull timer.
    Pause,
    /// Re-arm the pull timer.
    Resume,
    /// Leave the page: cancel everything and end the loop.
    Teardown,
}

/// Cloneable sender for the outside world.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<SyncEvent>,
}

impl SyncHandle {
    pub fn new(tx: mpsc::Sender<SyncEvent>) -> Self {
        Self { tx }
    }

    async fn send(&self, event: SyncEvent) {
        if self.tx.send(event).await.is_err() {
            debug!("sync: loop already stopped");
        }
    }

    pub async fn command(&self, command: UserCommand) {
        self.send(SyncEvent::Command(command)).await;
    }

    pub async fn pause(&self) {
        self.send(SyncEvent::Pause).await;
    }

    pub async fn resume(&self) {
        self.send(SyncEvent::Resume).await;
    }

    pub async fn teardown(&self) {
        self.send(SyncEvent::Teardown).await;
    }
}

pub struct SyncChannel<A: GameApi> {
    api: Arc<A>,
    machine: ScreenStateMachine,
    config: SyncConfig,
    event_tx: mpsc::Sender<SyncEvent>,
    /// Root token; cancelled on teardown.
    cancel: CancellationToken,
    /// Token of the armed pull timer, if any.
    pull_timer: Option<CancellationToken>,
    pull_in_flight: bool,
    /// An immediate pull was asked for while one was in flight.
    pull_requested: bool,
    messages_in_flight: bool,
    paused: bool,
    /// Create requests sent but not yet answered.
    pending_creates: usize,
}

impl<A: GameApi> SyncChannel<A> {
    pub fn new(
        api: Arc<A>,
        machine: ScreenStateMachine,
        config: SyncConfig,
        event_tx: mpsc::Sender<SyncEvent>,
    ) -> Self {
        Self {
            api,
            machine,
            config,
            event_tx,
            cancel: CancellationToken::new(),
            pull_timer: None,
            pull_in_flight: false,
            pull_requested: false,
            messages_in_flight: false,
            paused: false,
            pending_creates: 0,
        }
    }

    pub fn handle(&self) -> SyncHandle {
        SyncHandle::new(self.event_tx.clone())
    }

    /// Session token.  Child tokens of it (e.g. for the push listener) are
    /// cancelled on teardown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until teardown.  Starts with an immediate pull and a catch-up
    /// message fetch.  Returns the state machine so callers can inspect
    /// the final session state.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<SyncEvent>) -> ScreenStateMachine {
        info!("sync: starting event loop");
        self.start_pull();
        self.start_message_fetch();

        loop {
            let evt = tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("sync: session cancelled");
                    break;
                }
                evt = event_rx.recv() => evt,
            };
            match evt {
                None => {
                    info!("sync: event channel closed, shutting down");
                    break;
                }
                Some(SyncEvent::Teardown) => {
                    info!("sync: teardown requested");
                    break;
                }
                Some(evt) => self.handle_event(evt),
            }
            if self.cancel.is_cancelled() {
                break;
            }
        }

        self.cancel.cancel();
        self.pull_timer = None;
        self.machine
    }

    fn handle_event(&mut self, evt: SyncEvent) {
        match evt {
            SyncEvent::PullDue => {
                self.pull_timer = None;
                if self.paused {
                    debug!("sync: pull timer fired while paused, ignored");
                } else if self.pull_in_flight {
                    debug!("sync: pull already in flight");
                } else {
                    self.start_pull();
                }
            }

            SyncEvent::PullCompleted(result) => {
                self.pull_in_flight = false;
                match result {
                    Ok(value) => {
                        self.apply(value, SnapshotSource::Pull);
                    }
                    Err(e) => warn!("sync: pull failed: {}", e),
                }
                if std::mem::take(&mut self.pull_requested) {
                    self.start_pull();
                } else {
                    self.arm_pull_timer();
                }
            }

            SyncEvent::MessagesDue => {
                if !self.messages_in_flight {
                    self.start_message_fetch();
                }
            }

            SyncEvent::MessagesFetched { mode, result } => {
                self.messages_in_flight = false;
                match result {
                    Ok(messages) => {
                        let fresh = self.machine.ingest_messages(&messages, mode, false);
                        if fresh > 0 {
                            debug!("sync: {} new message(s) ({:?})", fresh, mode);
                        }
                    }
                    Err(e) => warn!("sync: message fetch failed: {}", e),
                }
                self.arm_message_timer();
            }

            SyncEvent::Push(envelope) => self.handle_push(envelope),

            SyncEvent::Command(command) => self.start_command(command),

            SyncEvent::CommandCompleted { command, result } => {
                if matches!(command, UserCommand::CreateGame { .. }) {
                    self.pending_creates = self.pending_creates.saturating_sub(1);
                    self.machine.set_creating_game(self.pending_creates > 0);
                }
                match result {
                    Ok(Some(value)) => {
                        self.apply(value, SnapshotSource::Response);
                    }
                    Ok(None) => {
                        debug!("sync: {} succeeded without a snapshot, refreshing", command.name());
                        self.request_pull();
                    }
                    Err(e) => warn!("sync: {} failed: {}", command.name(), e),
                }
            }

            SyncEvent::Pause => {
                if !self.paused {
                    info!("sync: paused");
                    self.paused = true;
                    if let Some(timer) = self.pull_timer.take() {
                        timer.cancel();
                    }
                }
            }

            SyncEvent::Resume => {
                if self.paused {
                    info!("sync: resumed");
                    self.paused = false;
                    if !self.pull_in_flight {
                        self.arm_pull_timer();
                    }
                }
            }

            // handled by run()
            SyncEvent::Teardown => {}
        }
    }

    fn apply(&mut self, value: Value, source: SnapshotSource) {
        if let ApplyOutcome::Navigated(url) = self.machine.apply_value(value, source) {
            info!("sync: {:?} snapshot navigated to {}, tearing down", source, url);
            self.cancel.cancel();
        }
    }

    fn handle_push(&mut self, envelope: PushEnvelope) {
        let kind = envelope.kind.clone();
        let event = match PushEvent::from_envelope(envelope) {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!("sync: ignoring push type '{}'", kind);
                return;
            }
            Err(e) => {
                warn!("sync: bad '{}' push: {}", kind, e);
                return;
            }
        };
        match event {
            PushEvent::Snapshot(value) => self.apply(value, SnapshotSource::Push),
            PushEvent::Message(message) => {
                self.machine.ingest_messages(&[message], FeedMode::Live, true);
            }
            PushEvent::Wall(text) => self.machine.announce(&text),
            PushEvent::Membership(kind) => {
                debug!("sync: {:?} push, refreshing", kind);
                self.request_pull();
            }
            PushEvent::NewConnection(data) => info!("sync: new connection {}", data),
        }
    }

    // ── pull ─────────────────────────────────────────────────────────────────

    fn start_pull(&mut self) {
        if let Some(timer) = self.pull_timer.take() {
            timer.cancel();
        }
        if self.cancel.is_cancelled() {
            return;
        }
        self.pull_in_flight = true;
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = api.pull() => {
                    let _ = tx.send(SyncEvent::PullCompleted(result)).await;
                }
            }
        });
    }

    /// Pull now, or right after the pull in flight completes.
    fn request_pull(&mut self) {
        if self.pull_in_flight {
            self.pull_requested = true;
        } else {
            self.start_pull();
        }
    }

    fn arm_pull_timer(&mut self) {
        if self.paused || self.cancel.is_cancelled() {
            return;
        }
        if let Some(old) = self.pull_timer.take() {
            old.cancel();
        }
        let token = self.cancel.child_token();
        self.pull_timer = Some(token.clone());
        let interval = self.config.poll_interval();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(interval) => {
                    let _ = tx.send(SyncEvent::PullDue).await;
                }
            }
        });
    }

    // ── messages ─────────────────────────────────────────────────────────────

    fn start_message_fetch(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.messages_in_flight = true;
        let (query, mode) = self.machine.feed_mut().next_query();
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = api.fetch_messages(query) => {
                    let _ = tx.send(SyncEvent::MessagesFetched { mode, result }).await;
                }
            }
        });
    }

    fn arm_message_timer(&mut self) {
        let interval = self.config.message_interval();
        let tx = self.event_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(interval) => {
                    let _ = tx.send(SyncEvent::MessagesDue).await;
                }
            }
        });
    }

    // ── commands ─────────────────────────────────────────────────────────────

    fn start_command(&mut self, command: UserCommand) {
        info!("sync: {} command {:?}", command.name(), command);
        match command {
            UserCommand::BuyTicket { .. } => self.machine.play_cue(AudioCue::ButtonClick),
            UserCommand::CreateGame { .. } => {
                self.machine.play_cue(AudioCue::ButtonClick);
                self.pending_creates += 1;
                self.machine.set_creating_game(true);
            }
            _ => {}
        }
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = api.send_command(command.clone()) => {
                    let _ = tx.send(SyncEvent::CommandCompleted { command, result }).await;
                }
            }
        });
    }
}
