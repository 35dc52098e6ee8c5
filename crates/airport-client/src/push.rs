/// Push channel listener.
///
/// ```text
///   spawn_push_listener()
///         │
///         └── listener task   ← WebSocket, one JSON envelope per text frame
///                                ├── upgrade with Cookie: sessionid=<id>
///                                ├── open → send {"type":"page","data":<page>}
///                                └── each frame → PushEnvelope → SyncEvent::Push
/// ```
///
/// The listener never touches session state; envelopes are queued on the
/// sync loop's channel and applied there in arrival order.  A disconnect
/// ends the task; pulls carry on without it.
use airport_proto::config::PushConfig;
use airport_proto::error::TransportError;
use airport_proto::message::Message;
use airport_proto::push::{PushEnvelope, PushKind};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::sync::SyncEvent;

/// A push envelope resolved to what the sync loop should do with it.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// `info` / `games_info`: a snapshot to apply.
    Snapshot(Value),
    Message(Message),
    /// Server-wide announcement.
    Wall(String),
    /// A player joined or left a game; the current snapshot is stale.
    Membership(PushKind),
    NewConnection(Value),
}

impl PushEvent {
    /// `Ok(None)` for envelope types the client does not handle.
    pub fn from_envelope(envelope: PushEnvelope) -> Result<Option<Self>, serde_json::Error> {
        let Some(kind) = PushKind::from_type(&envelope.kind) else {
            return Ok(None);
        };
        let event = match kind {
            PushKind::Info | PushKind::GamesInfo => PushEvent::Snapshot(envelope.data),
            PushKind::Message => PushEvent::Message(serde_json::from_value(envelope.data)?),
            PushKind::Wall => PushEvent::Wall(match envelope.data {
                Value::String(text) => text,
                other => other.to_string(),
            }),
            PushKind::JoinGame | PushKind::QuitGame => PushEvent::Membership(kind),
            PushKind::NewConnection => PushEvent::NewConnection(envelope.data),
        };
        Ok(Some(event))
    }
}

/// Upgrade request for `url`, carrying the player's session cookie so the
/// server can tell who is listening.
fn upgrade_request(url: &str, session_id: Option<&str>) -> Result<Request, TransportError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| TransportError::Request(format!("push url '{}': {}", url, e)))?;
    if let Some(id) = session_id {
        let cookie = HeaderValue::from_str(&format!("sessionid={}", id))
            .map_err(|e| TransportError::Request(format!("session cookie: {}", e)))?;
        request.headers_mut().insert(header::COOKIE, cookie);
    }
    Ok(request)
}

/// Connect, announce the page and forward envelopes until the socket closes
/// or `cancel` fires.  Returns `Ok(())` only on cancellation or when the
/// sync loop has gone away.
pub async fn run_push_listener(
    config: PushConfig,
    session_id: Option<String>,
    event_tx: mpsc::Sender<SyncEvent>,
    cancel: CancellationToken,
) -> Result<(), TransportError> {
    let request = upgrade_request(&config.url, session_id.as_deref())?;
    let (mut socket, _) = tokio::select! {
        _ = cancel.cancelled() => return Ok(()),
        connected = tokio_tungstenite::connect_async(request) => connected?,
    };
    info!("push: connected to {}", config.url);

    let hello = PushEnvelope::page(&config.page)
        .encode()
        .map_err(|e| TransportError::Frame(e.to_string()))?;
    socket.send(Frame::Text(hello)).await?;

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("push: detached");
                let _ = socket.close(None).await;
                return Ok(());
            }
            next = socket.next() => next,
        };
        let text = match next {
            None | Some(Ok(Frame::Close(_))) => return Err(TransportError::Closed),
            Some(Err(e)) => return Err(e.into()),
            Some(Ok(Frame::Text(text))) => text,
            Some(Ok(Frame::Binary(_))) => {
                debug!("push: ignoring binary frame");
                continue;
            }
            // ping/pong are answered by tungstenite
            Some(Ok(_)) => continue,
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        let envelope = match PushEnvelope::decode(trimmed) {
            Ok(env) => env,
            Err(e) => {
                debug!("push: invalid json '{}': {}", trimmed, e);
                continue;
            }
        };
        if event_tx.send(SyncEvent::Push(envelope)).await.is_err() {
            debug!("push: sync loop gone, exiting");
            return Ok(());
        }
    }
}

pub fn spawn_push_listener(
    config: PushConfig,
    session_id: Option<String>,
    event_tx: mpsc::Sender<SyncEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let url = config.url.clone();
        if let Err(e) = run_push_listener(config, session_id, event_tx, cancel).await {
            warn!("push: listener on {} stopped: {}", url, e);
        }
    })
}
