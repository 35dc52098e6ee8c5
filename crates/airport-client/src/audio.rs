//! Audio cues.
//!
//! Cue detection is a pure function of the session state before and after a
//! snapshot: a cue fires only on the edge where its value changes, never on
//! a steady-state re-render.  Playback goes to an `AudioSink`; a sink that
//! cannot play makes every cue a silent no-op.

use airport_proto::config::AudioConfig;
use airport_proto::message::MessageType;
use tracing::{debug, info};

use crate::state::{Screen, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCue {
    TicketIssued,
    GoalReached,
    Takeoff,
    Landed,
    ButtonClick,
    Message(MessageType),
}

/// Cue for entering `next` from `prev`.  Only entering a screen counts.
pub fn screen_entry_cue(prev: Option<Screen>, next: Option<Screen>) -> Option<AudioCue> {
    if prev == next {
        return None;
    }
    match next? {
        Screen::InFlight => Some(AudioCue::Takeoff),
        Screen::Airport => Some(AudioCue::Landed),
        Screen::GamesMenu => None,
    }
}

/// A new ticket number.  The number is only recorded while a ticket is held,
/// so any change means a ticket is present.
pub fn ticket_cue(prev: Option<u32>, next: Option<u32>) -> Option<AudioCue> {
    match next {
        Some(n) if prev != Some(n) => Some(AudioCue::TicketIssued),
        _ => None,
    }
}

/// The current goal moved on to another city.  The first goal ever seen is
/// not an achievement.
pub fn goal_cue(prev: Option<&str>, next: Option<&str>) -> Option<AudioCue> {
    match (prev, next) {
        (Some(p), Some(n)) if p != n => Some(AudioCue::GoalReached),
        _ => None,
    }
}

/// All edge cues between two session states, in playback order.
pub fn transition_cues(prev: &SessionState, next: &SessionState) -> Vec<AudioCue> {
    [
        screen_entry_cue(prev.screen, next.screen),
        ticket_cue(prev.last_ticket_number, next.last_ticket_number),
        goal_cue(
            prev.last_goal_city.as_deref(),
            next.last_goal_city.as_deref(),
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// External sound output.
pub trait AudioSink: Send {
    /// Whether the platform can play sounds at all.
    fn available(&self) -> bool {
        true
    }

    fn play(&mut self, sound: &str);
}

/// Sink for platforms without audio.
pub struct NullAudioSink;

impl AudioSink for NullAudioSink {
    fn available(&self) -> bool {
        false
    }

    fn play(&mut self, _sound: &str) {}
}

/// Headless sink: records the sound it would have played in the log.
pub struct TracingAudioSink;

impl AudioSink for TracingAudioSink {
    fn play(&mut self, sound: &str) {
        info!("audio: play {}", sound);
    }
}

/// Maps cues to configured sounds and hands them to the sink.
pub struct CueEngine {
    config: AudioConfig,
    sink: Box<dyn AudioSink>,
}

impl CueEngine {
    pub fn new(config: AudioConfig, sink: Box<dyn AudioSink>) -> Self {
        Self { config, sink }
    }

    pub fn silent() -> Self {
        Self::new(AudioConfig::default(), Box::new(NullAudioSink))
    }

    fn sound_for(&self, cue: &AudioCue) -> Option<&str> {
        let sound = match cue {
            AudioCue::TicketIssued => &self.config.ticket,
            AudioCue::GoalReached => &self.config.goal,
            AudioCue::Takeoff => &self.config.takeoff,
            AudioCue::Landed => &self.config.landed,
            AudioCue::ButtonClick => &self.config.button_click,
            AudioCue::Message(kind) => self.config.messages.get(kind.as_str())?,
        };
        Some(sound.as_str())
    }

    pub fn play(&mut self, cue: &AudioCue) {
        if !self.config.enabled || !self.sink.available() {
            return;
        }
        let Some(sound) = self.sound_for(cue).map(str::to_owned) else {
            debug!("audio: no sound configured for {:?}", cue);
            return;
        };
        self.sink.play(&sound);
    }

    /// Play a batch, skipping repeats of a cue already played in it.
    pub fn play_all(&mut self, cues: &[AudioCue]) {
        let mut played: Vec<&AudioCue> = Vec::with_capacity(cues.len());
        for cue in cues {
            if played.contains(&cue) {
                continue;
            }
            self.play(cue);
            played.push(cue);
        }
    }
}
