use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("unknown strategy type: {0}")]
    UnknownStrategy(String),

    #[error("snapshot request failed with status {status}")]
    SnapshotStatus { status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("STOMP frame error: {0}")]
    Stomp(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures raised while a feature drives its overlay layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },

    #[error("{0} layer is already borrowed")]
    LayerBusy(&'static str),
}

impl OverlayError {
    pub fn invalid(kind: &'static str, reason: impl Into<String>) -> Self {
        OverlayError::InvalidPayload {
            kind,
            reason: reason.into(),
        }
    }
}
