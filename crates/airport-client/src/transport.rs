//! HTTP side of the game server: pulls, message fetches and user commands.
//!
//! `GameApi` is the seam the sync loop talks to.  `HttpGameClient` is the
//! real implementation; tests substitute a scripted one.

use std::future::Future;

use airport_proto::config::{ServerConfig, SyncConfig};
use airport_proto::error::TransportError;
use airport_proto::message::{Message, MessageQuery};
use airport_proto::snapshot::GameId;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

/// Something the player asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    BuyTicket { ticket_number: u32 },
    /// Pause or resume the game on the server.
    TogglePause { game_id: GameId },
    Quit { game_id: GameId },
    CreateGame { goals: u32, airports: u32, ai_player: bool },
    JoinGame { game_id: GameId },
}

impl UserCommand {
    pub fn name(&self) -> &'static str {
        match self {
            UserCommand::BuyTicket { .. } => "buy",
            UserCommand::TogglePause { .. } => "pause",
            UserCommand::Quit { .. } => "quit",
            UserCommand::CreateGame { .. } => "create",
            UserCommand::JoinGame { .. } => "join",
        }
    }
}

pub trait GameApi: Send + Sync + 'static {
    /// Fetch the current snapshot as raw JSON.
    fn pull(&self) -> impl Future<Output = Result<Value, TransportError>> + Send;

    fn fetch_messages(
        &self,
        query: MessageQuery,
    ) -> impl Future<Output = Result<Vec<Message>, TransportError>> + Send;

    /// Send a command.  `Ok(None)` is a plain success without a snapshot.
    fn send_command(
        &self,
        command: UserCommand,
    ) -> impl Future<Output = Result<Option<Value>, TransportError>> + Send;
}

pub struct HttpGameClient {
    client: Client,
    base: Url,
    paths: SyncConfig,
}

impl HttpGameClient {
    pub fn new(server: &ServerConfig, paths: SyncConfig) -> Result<Self, TransportError> {
        let base = Url::parse(&server.base_url)
            .map_err(|e| TransportError::Request(format!("bad base url {:?}: {}", server.base_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(session) = server.session_id.as_deref() {
            let cookie = HeaderValue::from_str(&format!("sessionid={}", session))
                .map_err(|e| TransportError::Request(format!("bad session id: {}", e)))?;
            headers.insert(COOKIE, cookie);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(server.request_timeout())
            .build()?;

        Ok(Self { client, base, paths })
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path)
            .map_err(|e| TransportError::Request(format!("bad path {:?}: {}", path, e)))
    }

    /// Read a response body as optional JSON.  An empty body is `None`.
    async fn read_json(response: reqwest::Response) -> Result<Option<Value>, TransportError> {
        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

impl GameApi for HttpGameClient {
    async fn pull(&self) -> Result<Value, TransportError> {
        let url = self.url(&self.paths.pull_path)?;
        debug!("http: GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        Self::read_json(response)
            .await?
            .ok_or(TransportError::EmptyBody(status))
    }

    async fn fetch_messages(&self, query: MessageQuery) -> Result<Vec<Message>, TransportError> {
        let url = self.url(&self.paths.messages_path)?;
        debug!("http: GET {} last={} old={}", url, query.last, query.old);
        let response = self.client.get(url).query(&query.to_pairs()).send().await?;
        match Self::read_json(response).await? {
            None => Ok(Vec::new()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    async fn send_command(&self, command: UserCommand) -> Result<Option<Value>, TransportError> {
        let request = match &command {
            UserCommand::BuyTicket { ticket_number } => self
                .client
                .post(self.url(&self.paths.buy_path)?)
                .form(&[("ticket_number", ticket_number.to_string())]),
            UserCommand::TogglePause { game_id } => self
                .client
                .post(self.url(&self.paths.pause_path)?)
                .query(&[("id", game_id.to_string())]),
            UserCommand::Quit { game_id } => self
                .client
                .post(self.url(&self.paths.quit_path)?)
                .query(&[("id", game_id.to_string())]),
            UserCommand::CreateGame { goals, airports, ai_player } => {
                let mut form = vec![
                    ("goals", goals.to_string()),
                    ("airports", airports.to_string()),
                ];
                if *ai_player {
                    form.push(("ai_player", "on".to_string()));
                }
                self.client
                    .post(self.url(&self.paths.create_path)?)
                    .form(&form)
            }
            UserCommand::JoinGame { game_id } => self
                .client
                .get(self.url(&self.paths.join_path)?)
                .query(&[("id", game_id.to_string())]),
        };
        debug!("http: {} command", command.name());
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        // a non-JSON body (e.g. a rendered page after a redirect) is a plain success
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_join_onto_base() {
        let server = ServerConfig {
            base_url: "http://example.test/airport/".into(),
            ..ServerConfig::default()
        };
        let client = HttpGameClient::new(&server, SyncConfig::default()).unwrap();
        assert_eq!(client.url("info").unwrap().as_str(), "http://example.test/airport/info");
        assert_eq!(
            client.url("games_join/").unwrap().as_str(),
            "http://example.test/airport/games_join/"
        );
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let server = ServerConfig {
            base_url: "not a url".into(),
            ..ServerConfig::default()
        };
        assert!(HttpGameClient::new(&server, SyncConfig::default()).is_err());
    }

    #[test]
    fn test_command_names() {
        assert_eq!(UserCommand::BuyTicket { ticket_number: 4 }.name(), "buy");
        assert_eq!(
            UserCommand::CreateGame { goals: 3, airports: 10, ai_player: false }.name(),
            "create"
        );
    }
}
