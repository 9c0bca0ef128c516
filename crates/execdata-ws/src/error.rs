//! WebSocket transport errors.

use thiserror::Error;

use execdata_core::SourceError;

#[derive(Debug, Error)]
pub enum WsError {
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("WebSocket connect to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("invalid JSON message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not convert message: {0}")]
    Decode(String),
}

impl From<WsError> for SourceError {
    fn from(err: WsError) -> Self {
        match err {
            WsError::Json(_) | WsError::Decode(_) => SourceError::Decode(err.to_string()),
            other => SourceError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_errors_map_to_decode() {
        let err: SourceError = WsError::Decode("block id".into()).into();
        assert!(matches!(err, SourceError::Decode(_)));

        let err: SourceError = WsError::WebSocket("reset".into()).into();
        assert!(matches!(err, SourceError::Transport(_)));
    }
}
