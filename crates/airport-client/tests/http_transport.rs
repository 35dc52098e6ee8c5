//! `HttpGameClient` against a local axum mock of the game server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use airport_client::transport::{GameApi, HttpGameClient, UserCommand};
use airport_proto::config::{ServerConfig, SyncConfig};
use airport_proto::error::TransportError;
use airport_proto::message::{MessageId, MessageQuery, MessageType};
use airport_proto::snapshot::Snapshot;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::{Form, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct MockState {
    /// Every request as "<route> <params>".
    seen: Arc<Mutex<Vec<String>>>,
}

impl MockState {
    fn log(&self, entry: String) {
        self.seen.lock().unwrap().push(entry);
    }
}

async fn info(State(state): State<MockState>, headers: HeaderMap) -> impl IntoResponse {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if cookie != "sessionid=abc123" {
        return (StatusCode::FORBIDDEN, Json(json!({}))).into_response();
    }
    state.log("info".to_string());
    Json(json!({
        "player": "alice", "time": "9:00 a.m.", "game": 4, "city": "Oslo",
        "in_flight": false, "game_state": "Started", "goals": [["Rome", false]]
    }))
    .into_response()
}

async fn buy(State(state): State<MockState>, Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    let number = form.get("ticket_number").cloned().unwrap_or_default();
    state.log(format!("buy {}", number));
    Json(json!({
        "player": "alice", "time": "9:05 a.m.", "game": 4, "city": "Oslo", "in_flight": false,
        "ticket": {"number": number.parse::<u32>().unwrap_or(0), "status": "On time"}
    }))
}

async fn messages(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let last = params.get("last").cloned().unwrap_or_default();
    let old = params.contains_key("old");
    state.log(format!("messages last={} old={}", last, old));
    if last != "0" {
        return StatusCode::NOT_MODIFIED.into_response();
    }
    Json(json!([
        {"id": 1, "type": "NEW_GAME", "text": "game 4 created"},
        {"id": "2", "type": "GOAL", "text": "bob reached Rome"}
    ]))
    .into_response()
}

async fn pause(State(state): State<MockState>, Query(params): Query<HashMap<String, String>>) -> StatusCode {
    state.log(format!("pause id={}", params.get("id").cloned().unwrap_or_default()));
    StatusCode::OK
}

async fn join(State(state): State<MockState>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    state.log(format!("join id={}", params.get("id").cloned().unwrap_or_default()));
    Json(json!({"current_game": 3, "current_state": "waiting", "games": []}))
}

async fn create(State(state): State<MockState>, Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    state.log(format!(
        "create goals={} airports={} ai={}",
        form.get("goals").cloned().unwrap_or_default(),
        form.get("airports").cloned().unwrap_or_default(),
        form.contains_key("ai_player")
    ));
    Json(json!({"current_game": 8, "current_state": "hosting", "games": []}))
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn stale() -> StatusCode {
    StatusCode::NOT_MODIFIED
}

async fn blank() -> &'static str {
    ""
}

async fn not_json() -> &'static str {
    "<html>ok</html>"
}

async fn start_mock() -> (String, MockState) {
    let state = MockState::default();
    let app = Router::new()
        .route("/airport/info", get(info).post(buy))
        .route("/airport/messages/", get(messages))
        .route("/airport/games_pause/", axum::routing::post(pause))
        .route("/airport/games_quit/", axum::routing::post(not_json))
        .route("/airport/games_join/", get(join))
        .route("/airport/games_create/", axum::routing::post(create))
        .route("/airport/broken", get(broken))
        .route("/airport/stale", get(stale))
        .route("/airport/blank", get(blank))
        .with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/airport/", addr), state)
}

fn client(base_url: String, paths: SyncConfig) -> HttpGameClient {
    let server = ServerConfig {
        base_url,
        session_id: Some("abc123".to_string()),
        ..ServerConfig::default()
    };
    HttpGameClient::new(&server, paths).unwrap()
}

#[tokio::test]
async fn pull_sends_session_cookie_and_decodes() {
    let (base, state) = start_mock().await;
    let api = client(base, SyncConfig::default());

    let value = api.pull().await.unwrap();
    let snapshot = Snapshot::from_value(value).unwrap();
    assert_eq!(snapshot.current_game, Some(4));
    assert_eq!(snapshot.current_goal_city(), Some("Rome"));
    assert_eq!(*state.seen.lock().unwrap(), vec!["info"]);
}

#[tokio::test]
async fn pull_without_session_is_a_status_error() {
    let (base, _state) = start_mock().await;
    let server = ServerConfig {
        base_url: base,
        ..ServerConfig::default()
    };
    let api = HttpGameClient::new(&server, SyncConfig::default()).unwrap();
    assert!(matches!(api.pull().await, Err(TransportError::Status(403))));
}

#[tokio::test]
async fn server_error_is_reported() {
    let (base, _state) = start_mock().await;
    let paths = SyncConfig {
        pull_path: "broken".to_string(),
        ..SyncConfig::default()
    };
    let api = client(base, paths);
    assert!(matches!(api.pull().await, Err(TransportError::Status(500))));
}

#[tokio::test]
async fn pull_without_snapshot_reports_the_real_status() {
    let (base, _state) = start_mock().await;
    for (path, status) in [("stale", 304), ("blank", 200)] {
        let paths = SyncConfig {
            pull_path: path.to_string(),
            ..SyncConfig::default()
        };
        let api = client(base.clone(), paths);
        match api.pull().await {
            Err(TransportError::EmptyBody(code)) => assert_eq!(code, status),
            other => panic!("{}: unexpected {:?}", path, other),
        }
    }
}

#[tokio::test]
async fn catch_up_then_not_modified() {
    let (base, state) = start_mock().await;
    let api = client(base, SyncConfig::default());

    let first = api
        .fetch_messages(MessageQuery { last: MessageId(0), old: true })
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[1].id, MessageId(2));
    assert_eq!(first[0].kind, MessageType::NewGame);

    let second = api
        .fetch_messages(MessageQuery { last: MessageId(2), old: false })
        .await
        .unwrap();
    assert!(second.is_empty());

    assert_eq!(
        *state.seen.lock().unwrap(),
        vec!["messages last=0 old=true", "messages last=2 old=false"]
    );
}

#[tokio::test]
async fn commands_hit_their_endpoints() {
    let (base, state) = start_mock().await;
    let api = client(base, SyncConfig::default());

    let bought = api
        .send_command(UserCommand::BuyTicket { ticket_number: 1201 })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bought["ticket"]["number"], json!(1201));

    let paused = api
        .send_command(UserCommand::TogglePause { game_id: 4 })
        .await
        .unwrap();
    assert_eq!(paused, None);

    let quit = api.send_command(UserCommand::Quit { game_id: 4 }).await.unwrap();
    assert_eq!(quit, None);

    let joined = api
        .send_command(UserCommand::JoinGame { game_id: 3 })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(joined["current_state"], json!("waiting"));

    let created = api
        .send_command(UserCommand::CreateGame { goals: 3, airports: 12, ai_player: false })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created["current_game"], json!(8));

    assert_eq!(
        *state.seen.lock().unwrap(),
        vec![
            "buy 1201",
            "pause id=4",
            "join id=3",
            "create goals=3 airports=12 ai=false",
        ]
    );
}

#[tokio::test]
async fn unreachable_server_is_an_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = client(format!("http://{}/airport/", addr), SyncConfig::default());
    assert!(matches!(api.pull().await, Err(TransportError::Http(_))));
}
