use thiserror::Error;

/// A snapshot that cannot be rendered on the path it selects.
///
/// Frames that fail validation are dropped by the client; the previous
/// derived state stays in place.
#[derive(Debug, Error)]
pub enum MalformedSnapshotError {
    #[error("snapshot is missing `{0}`")]
    MissingField(&'static str),
    #[error("snapshot field `{field}` has invalid value {value:?}")]
    InvalidValue { field: &'static str, value: String },
    #[error("snapshot could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Network failure on the pull, push or command paths.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid request: {0}")]
    Request(String),
    #[error("server answered {0}")]
    Status(u16),
    #[error("server answered {0} without a snapshot")]
    EmptyBody(u16),
    #[error("response body could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("push socket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("push frame rejected: {0}")]
    Frame(String),
    #[error("push stream closed by server")]
    Closed,
}
