//! Push channel envelopes: `{"type": <string>, "data": <any>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl PushEnvelope {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Handshake the client sends right after connecting, naming the page
    /// it is showing.
    pub fn page(page: &str) -> Self {
        Self::new("page", Value::String(page.to_string()))
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Envelope types the client dispatches.  Anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushKind {
    /// In-game snapshot for this player.
    Info,
    /// Games-menu snapshot.
    GamesInfo,
    /// One message for the feed.
    Message,
    /// Server-wide announcement text.
    Wall,
    JoinGame,
    QuitGame,
    NewConnection,
}

impl PushKind {
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "info" => Some(PushKind::Info),
            "games_info" => Some(PushKind::GamesInfo),
            "message" => Some(PushKind::Message),
            "wall" => Some(PushKind::Wall),
            "join_game" | "player_joined_game" => Some(PushKind::JoinGame),
            "quit_game" | "player_left_game" => Some(PushKind::QuitGame),
            "new_connection" => Some(PushKind::NewConnection),
            _ => None,
        }
    }
}
