//! SessionState: the running state derived from the snapshots applied so far.
//!
//! Snapshots are transient; only these fields survive between them.  The
//! screen state machine is the only writer.  Everything else gets a
//! shared reference.

use airport_proto::message::MessageId;

use crate::overlay::Overlay;

/// Top-level screen the player sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    GamesMenu,
    Airport,
    InFlight,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Screen that has actually been shown.  `None` before the first snapshot.
    pub screen: Option<Screen>,
    pub current_overlay: Option<Overlay>,
    /// Number of the last ticket seen.  Kept when the ticket goes away.
    pub last_ticket_number: Option<u32>,
    /// City of the last current goal seen.  Kept when every goal is achieved.
    pub last_goal_city: Option<String>,
    pub last_message_id: Option<MessageId>,
    pub last_background: Option<String>,
    pub progress: Option<u8>,
    pub ticket_visible: bool,
    pub create_control_visible: Option<bool>,
}

impl SessionState {
    /// The screen to report; the games menu until a game screen is entered.
    pub fn current_screen(&self) -> Screen {
        self.screen.unwrap_or(Screen::GamesMenu)
    }
}
