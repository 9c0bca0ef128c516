//! Error types for the follow pipeline.

use thiserror::Error;

use crate::types::Identifier;

/// Errors from converting a raw execution data message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("execution data message is empty")]
    EmptyMessage,

    #[error("could not convert chunk {index}: {reason}")]
    Chunk { index: usize, reason: String },

    #[error("invalid block id: {0}")]
    BlockId(String),

    #[error("protobuf decode failed: {0}")]
    Protobuf(String),
}

/// Errors from deriving accounts out of a trie update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("malformed register key in payload {payload}: {reason}")]
    MalformedKey { payload: usize, reason: String },
}

/// Errors reported by a remote source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The requested artifact has not been produced yet. Transient.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other remote-call failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The source returned data that could not be converted.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The source does not implement this operation.
    #[error("operation not supported by source: {0}")]
    Unsupported(&'static str),
}

impl SourceError {
    /// Returns `true` if the error is the transient "not produced yet" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Invalid configuration, reported before any loop starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cannot specify both start block ID and start height")]
    ConflictingStart,

    #[error("{name} must be greater than zero")]
    ZeroInterval { name: &'static str },

    #[error("address width must be greater than zero")]
    ZeroAddressWidth,

    #[error("channel capacity must be greater than zero")]
    ZeroCapacity,
}

/// Terminal error of a follow/stream task, delivered through the subscription.
#[derive(Debug, Error)]
pub enum FollowError {
    #[error("could not get latest sealed block header: {source}")]
    LatestHeader { source: SourceError },

    #[error("could not get start block header {id}: {source}")]
    StartBlock { id: Identifier, source: SourceError },

    #[error("could not get block header for height {height}: {source}")]
    Header { height: u64, source: SourceError },

    #[error("could not get execution data for block {block_id} at height {height}: {source}")]
    ExecutionData {
        height: u64,
        block_id: Identifier,
        source: SourceError,
    },

    #[error("could not decode execution data at height {height}: {source}")]
    Decode { height: u64, source: DecodeError },

    #[error("could not extract block data at height {height}: {source}")]
    Extract { height: u64, source: ExtractError },

    #[error("source returned height {got}, expected at least {expected}")]
    HeightRegression { expected: u64, got: u64 },

    #[error("error receiving from stream: {source}")]
    Stream { source: SourceError },
}

impl FollowError {
    /// Height the failure is attributed to, where known.
    pub fn height(&self) -> Option<u64> {
        match self {
            Self::Header { height, .. }
            | Self::ExecutionData { height, .. }
            | Self::Decode { height, .. }
            | Self::Extract { height, .. } => Some(*height),
            Self::HeightRegression { got, .. } => Some(*got),
            Self::LatestHeader { .. } | Self::StartBlock { .. } | Self::Stream { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_transient() {
        assert!(SourceError::NotFound("block".into()).is_not_found());
        assert!(!SourceError::Transport("reset".into()).is_not_found());
    }

    #[test]
    fn follow_error_carries_context() {
        let err = FollowError::Header {
            height: 42,
            source: SourceError::Transport("connection reset".into()),
        };
        assert_eq!(err.height(), Some(42));
        let msg = err.to_string();
        assert!(msg.contains("height 42"), "{msg}");
        assert!(msg.contains("connection reset"), "{msg}");
    }
}
