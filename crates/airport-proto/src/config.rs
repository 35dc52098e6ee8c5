use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Root of the game's HTTP endpoints; every path below is joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value of the `sessionid` cookie identifying the logged-in player.
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_summary_path")]
    pub summary_path: String,
}

/// Pull cadence and endpoint paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub message_interval_ms: u64,
    #[serde(default = "default_pull_path")]
    pub pull_path: String,
    #[serde(default = "default_messages_path")]
    pub messages_path: String,
    #[serde(default = "default_buy_path")]
    pub buy_path: String,
    #[serde(default = "default_pause_path")]
    pub pause_path: String,
    #[serde(default = "default_quit_path")]
    pub quit_path: String,
    #[serde(default = "default_create_path")]
    pub create_path: String,
    #[serde(default = "default_join_path")]
    pub join_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// WebSocket endpoint of the push server; the `sessionid` cookie from
    /// `[server]` is sent with the upgrade request.
    #[serde(default = "default_push_url")]
    pub url: String,
    /// Page name announced in the connect handshake.
    #[serde(default = "default_page")]
    pub page: String,
}

/// Sound identifiers handed to the audio sink, one per cue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ticket_sound")]
    pub ticket: String,
    #[serde(default = "default_goal_sound")]
    pub goal: String,
    #[serde(default = "default_takeoff_sound")]
    pub takeoff: String,
    #[serde(default = "default_landed_sound")]
    pub landed: String,
    #[serde(default = "default_button_click_sound")]
    pub button_click: String,
    /// Message type (e.g. `GOAL`, `WINNER`) → sound.  Types not listed are silent.
    #[serde(default = "default_message_sounds")]
    pub messages: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_id: None,
            request_timeout_ms: default_request_timeout_ms(),
            summary_path: default_summary_path(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_interval_ms(),
            message_interval_ms: default_interval_ms(),
            pull_path: default_pull_path(),
            messages_path: default_messages_path(),
            buy_path: default_buy_path(),
            pause_path: default_pause_path(),
            quit_path: default_quit_path(),
            create_path: default_create_path(),
            join_path: default_join_path(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            url: default_push_url(),
            page: default_page(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            ticket: default_ticket_sound(),
            goal: default_goal_sound(),
            takeoff: default_takeoff_sound(),
            landed: default_landed_sound(),
            button_click: default_button_click_sound(),
            messages: default_message_sounds(),
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn message_interval(&self) -> Duration {
        Duration::from_millis(self.message_interval_ms)
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/airport/".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_summary_path() -> String {
    "game_summary/".to_string()
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_pull_path() -> String {
    "info".to_string()
}

fn default_messages_path() -> String {
    "messages/".to_string()
}

fn default_buy_path() -> String {
    "info".to_string()
}

fn default_pause_path() -> String {
    "games_pause/".to_string()
}

fn default_quit_path() -> String {
    "games_quit/".to_string()
}

fn default_create_path() -> String {
    "games_create/".to_string()
}

fn default_join_path() -> String {
    "games_join/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_push_url() -> String {
    "ws://localhost:8080/".to_string()
}

fn default_page() -> String {
    "home".to_string()
}

fn default_ticket_sound() -> String {
    "ticket.wav".to_string()
}

fn default_goal_sound() -> String {
    "goal.wav".to_string()
}

fn default_takeoff_sound() -> String {
    "takeoff.wav".to_string()
}

fn default_landed_sound() -> String {
    "landed.wav".to_string()
}

fn default_button_click_sound() -> String {
    "click.wav".to_string()
}

fn default_message_sounds() -> HashMap<String, String> {
    HashMap::from([
        ("GOAL".to_string(), "goal.wav".to_string()),
        ("WINNER".to_string(), "winner.wav".to_string()),
        ("MONKEYWRENCH".to_string(), "wrench.wav".to_string()),
    ])
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            tracing::info!("config: wrote defaults to {}", config_path.display());
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sync.poll_interval(), Duration::from_millis(5000));
        assert_eq!(config.sync.pull_path, "info");
        assert!(config.push.enabled);
        assert!(config.push.url.starts_with("ws://"));
        assert!(config.server.base_url.ends_with('/'));
        assert_eq!(config.audio.messages.get("GOAL").map(String::as_str), Some("goal.wav"));
        assert!(Config::config_path().ends_with("airport/config.toml"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            base_url = "https://airport.example/airport/"
            session_id = "abc123"

            [sync]
            poll_interval_ms = 2500
            "#,
        )
        .unwrap();
        assert_eq!(config.server.session_id.as_deref(), Some("abc123"));
        assert_eq!(config.sync.poll_interval_ms, 2500);
        assert_eq!(config.sync.message_interval_ms, 5000);
        assert_eq!(config.push.page, "home");
        assert!(config.audio.enabled);
    }

    #[test]
    fn test_config_survives_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.sync.join_path, config.sync.join_path);
        assert_eq!(back.audio.messages.len(), config.audio.messages.len());
    }
}
