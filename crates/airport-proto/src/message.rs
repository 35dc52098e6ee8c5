//! Chat/event messages delivered inside snapshots, by the message endpoint
//! and over the push channel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned message id.  Monotonically increasing per player session.
///
/// The server emits these as integers, older endpoints as numeric strings;
/// both decode to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "IdRepr")]
pub struct MessageId(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(u64),
    Text(String),
}

impl TryFrom<IdRepr> for MessageId {
    type Error = String;

    fn try_from(repr: IdRepr) -> Result<Self, Self::Error> {
        match repr {
            IdRepr::Number(n) => Ok(MessageId(n)),
            IdRepr::Text(s) => s
                .trim()
                .parse::<u64>()
                .map(MessageId)
                .map_err(|_| format!("message id {:?} is not numeric", s)),
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category of a message.  Drives the icon and the optional sound cue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    #[default]
    Default,
    Error,
    Goal,
    Winner,
    PlayerAction,
    NewGame,
    MonkeyWrench,
    /// Any type this client does not know about yet.
    Other(String),
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Default => "DEFAULT",
            MessageType::Error => "ERROR",
            MessageType::Goal => "GOAL",
            MessageType::Winner => "WINNER",
            MessageType::PlayerAction => "PLAYERACTION",
            MessageType::NewGame => "NEW_GAME",
            MessageType::MonkeyWrench => "MONKEYWRENCH",
            MessageType::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for MessageType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "DEFAULT" => MessageType::Default,
            "ERROR" => MessageType::Error,
            "GOAL" => MessageType::Goal,
            "WINNER" => MessageType::Winner,
            "PLAYERACTION" => MessageType::PlayerAction,
            "NEW_GAME" => MessageType::NewGame,
            "MONKEYWRENCH" => MessageType::MonkeyWrench,
            _ => MessageType::Other(s),
        }
    }
}

impl From<MessageType> for String {
    fn from(t: MessageType) -> Self {
        t.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(rename = "type", default)]
    pub kind: MessageType,
    #[serde(default)]
    pub text: String,
}

/// Query parameters for the message endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageQuery {
    /// High-water mark; the server returns messages after this id.
    pub last: MessageId,
    /// Backfill recent history instead of only new messages.
    pub old: bool,
}

impl MessageQuery {
    /// Pairs for the request query string: `last=<id>` plus `old=true` on
    /// catch-up fetches.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("last", self.last.to_string())];
        if self.old {
            pairs.push(("old", "true".to_string()));
        }
        pairs
    }
}
