//! Server snapshots: the wire shape and its validated form.
//!
//! The server sends loosely shaped JSON from several endpoints (`info`,
//! `games_info`, command responses, `info` pushes).  `RawSnapshot` accepts
//! all of them; `Snapshot::from_raw` checks the fields the selected
//! rendering path needs and rejects the frame otherwise.  Nothing here has
//! side effects.

use serde::{Deserialize, Serialize};

use crate::error::MalformedSnapshotError;
use crate::message::Message;

pub type GameId = u64;

// ── wire shape ────────────────────────────────────────────────────────────────

/// One snapshot exactly as the server sent it.  Every field is optional
/// because each endpoint sends a different subset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub player: Option<String>,
    pub time: Option<String>,
    pub city: Option<String>,
    #[serde(alias = "airport")]
    pub airport_name: Option<String>,
    pub in_flight: Option<bool>,
    pub ticket: Option<RawTicket>,
    pub percentage: Option<f64>,
    pub next_flights: Option<Vec<Flight>>,
    pub goals: Option<Vec<GoalEntry>>,
    pub stats: Option<Vec<PlayerStat>>,
    pub messages: Option<Vec<Message>>,
    /// `info` frames call this `game`, `games_info` frames `current_game`.
    #[serde(alias = "game")]
    pub current_game: Option<GameId>,
    pub current_state: Option<String>,
    pub game_state: Option<String>,
    pub finished: Option<bool>,
    #[serde(alias = "redirect")]
    pub redirect_url: Option<String>,
    #[serde(alias = "notify")]
    pub notify_text: Option<String>,
    pub games: Option<Vec<GameSummary>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTicket {
    pub number: Option<u32>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub origin: Endpoint,
    #[serde(default)]
    pub destination: Endpoint,
    #[serde(default)]
    pub depart_time: String,
    #[serde(default)]
    pub arrival_time: String,
}

/// Origin or destination of a flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub airport: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub code: String,
}

/// A departure listed on the airport screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flight {
    pub id: Option<u64>,
    pub number: u32,
    pub status: String,
    pub origin: Endpoint,
    pub destination: Endpoint,
    pub depart_time: String,
    pub arrival_time: String,
    pub buyable: bool,
}

/// A goal city.  Sent as `["Paris", true]` or `{"city_name": .., "achieved": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GoalRepr")]
pub struct GoalEntry {
    pub city_name: String,
    pub achieved: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GoalRepr {
    Pair(String, bool),
    Object { city_name: String, #[serde(default)] achieved: bool },
}

impl From<GoalRepr> for GoalEntry {
    fn from(r: GoalRepr) -> Self {
        match r {
            GoalRepr::Pair(city_name, achieved) => GoalEntry { city_name, achieved },
            GoalRepr::Object { city_name, achieved } => GoalEntry { city_name, achieved },
        }
    }
}

/// Per-player goal tally.  Sent as `["alice", 2]` or an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StatRepr")]
pub struct PlayerStat {
    pub name: String,
    pub achieved_goal_count: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatRepr {
    Pair(String, u32),
    Object { name: String, #[serde(default)] achieved_goal_count: u32 },
}

impl From<StatRepr> for PlayerStat {
    fn from(r: StatRepr) -> Self {
        match r {
            StatRepr::Pair(name, achieved_goal_count) => PlayerStat { name, achieved_goal_count },
            StatRepr::Object { name, achieved_goal_count } => PlayerStat { name, achieved_goal_count },
        }
    }
}

/// Row of the games menu.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSummary {
    pub id: GameId,
    pub players: u32,
    pub host: String,
    pub goals: u32,
    pub airports: u32,
    pub status: String,
    pub created: String,
    pub url: String,
}

// ── validated shape ───────────────────────────────────────────────────────────

/// A ticket the player holds.  Identified by `number`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub number: u32,
    pub status: String,
    pub origin: Endpoint,
    pub destination: Endpoint,
    pub depart_time: String,
    pub arrival_time: String,
}

/// Player's lobby state for the current game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentState {
    Open,
    Hosting,
    Waiting,
    /// Sent by the server once the game is running; renders like no lobby state.
    Playing,
}

impl CurrentState {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(CurrentState::Open),
            "hosting" => Some(CurrentState::Hosting),
            "waiting" => Some(CurrentState::Waiting),
            "playing" => Some(CurrentState::Playing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Playing,
    Paused,
}

impl GameState {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "Paused" => Some(GameState::Paused),
            // the server labels a running game "Started"
            "Playing" | "Started" | "New" | "Finished" => Some(GameState::Playing),
            _ => None,
        }
    }
}

/// A validated snapshot, consumed by the screen state machine and discarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub player: String,
    pub time: String,
    pub city: Option<String>,
    pub airport_name: Option<String>,
    pub in_flight: bool,
    pub ticket: Option<Ticket>,
    pub percentage: u8,
    pub next_flights: Vec<Flight>,
    pub goals: Vec<GoalEntry>,
    pub stats: Vec<PlayerStat>,
    pub messages: Vec<Message>,
    pub current_game: Option<GameId>,
    pub current_state: Option<CurrentState>,
    pub game_state: GameState,
    pub finished: bool,
    pub redirect_url: Option<String>,
    pub notify_text: Option<String>,
    /// Only `games_info` frames carry the game list.
    pub games: Option<Vec<GameSummary>>,
}

impl Snapshot {
    /// Decode and validate a JSON value from any snapshot source.
    pub fn from_value(value: serde_json::Value) -> Result<Self, MalformedSnapshotError> {
        let raw: RawSnapshot = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    /// Validate a raw snapshot against the path it selects.
    ///
    /// A redirect frame needs nothing else.  An in-game frame (one that
    /// carries `in_flight`) needs `player` and `time`, and an airborne
    /// frame needs `ticket.number`.
    pub fn from_raw(raw: RawSnapshot) -> Result<Self, MalformedSnapshotError> {
        if let Some(url) = raw.redirect_url {
            return Ok(Snapshot {
                redirect_url: Some(url),
                ..Snapshot::default()
            });
        }

        let in_game = raw.in_flight.is_some();
        let in_flight = raw.in_flight.unwrap_or(false);

        let player = match raw.player {
            Some(p) => p,
            None if in_game => return Err(MalformedSnapshotError::MissingField("player")),
            None => String::new(),
        };
        let time = match raw.time {
            Some(t) => t,
            None if in_game => return Err(MalformedSnapshotError::MissingField("time")),
            None => String::new(),
        };

        let ticket = match raw.ticket {
            Some(t) => {
                let number = t
                    .number
                    .ok_or(MalformedSnapshotError::MissingField("ticket.number"))?;
                Some(Ticket {
                    number,
                    status: t.status,
                    origin: t.origin,
                    destination: t.destination,
                    depart_time: t.depart_time,
                    arrival_time: t.arrival_time,
                })
            }
            None if in_flight => return Err(MalformedSnapshotError::MissingField("ticket.number")),
            None => None,
        };

        let percentage = match raw.percentage {
            None => 0,
            Some(p) if (0.0..=100.0).contains(&p) => p.round() as u8,
            Some(p) => {
                return Err(MalformedSnapshotError::InvalidValue {
                    field: "percentage",
                    value: p.to_string(),
                })
            }
        };

        let current_state = match raw.current_state.as_deref() {
            None => None,
            Some(s) => Some(CurrentState::parse(s).ok_or_else(|| {
                MalformedSnapshotError::InvalidValue {
                    field: "current_state",
                    value: s.to_string(),
                }
            })?),
        };

        let game_state = match raw.game_state.as_deref() {
            None => GameState::Playing,
            Some(s) => GameState::parse(s).ok_or_else(|| MalformedSnapshotError::InvalidValue {
                field: "game_state",
                value: s.to_string(),
            })?,
        };

        Ok(Snapshot {
            player,
            time,
            city: raw.city,
            airport_name: raw.airport_name,
            in_flight,
            ticket,
            percentage,
            next_flights: raw.next_flights.unwrap_or_default(),
            goals: raw.goals.unwrap_or_default(),
            stats: raw.stats.unwrap_or_default(),
            messages: raw.messages.unwrap_or_default(),
            current_game: raw.current_game,
            current_state,
            game_state,
            finished: raw.finished.unwrap_or(false),
            redirect_url: None,
            notify_text: raw.notify_text,
            games: raw.games,
        })
    }

    /// Index of the current goal: the first one not yet achieved.
    pub fn current_goal_index(&self) -> Option<usize> {
        self.goals.iter().position(|g| !g.achieved)
    }

    /// City of the current goal.
    pub fn current_goal_city(&self) -> Option<&str> {
        self.current_goal_index()
            .map(|i| self.goals[i].city_name.as_str())
    }
}
