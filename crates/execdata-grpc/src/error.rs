//! gRPC transport errors and status mapping.

use thiserror::Error;
use tonic::{Code, Status};

use execdata_core::SourceError;

/// Errors raised while setting up a gRPC connection.
#[derive(Debug, Error)]
pub enum GrpcError {
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("could not connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Map a gRPC status onto the follower's error classes.
///
/// Only `NOT_FOUND` is the transient "not produced yet" condition.
pub fn status_to_source_error(status: Status) -> SourceError {
    if status.code() == Code::NotFound {
        return SourceError::NotFound(status.message().to_string());
    }
    SourceError::Transport(format!("{:?}: {}", status.code(), status.message()))
}

/// [`status_to_source_error`] for `GetExecutionDataByBlockID`.
///
/// Execution nodes report a missing execution data blob under other codes,
/// so any status whose message contains "not found" is also transient.
pub fn execution_data_status_to_source_error(status: Status) -> SourceError {
    if status.message().to_ascii_lowercase().contains("not found") {
        return SourceError::NotFound(status.message().to_string());
    }
    status_to_source_error(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_code_is_transient() {
        let err = status_to_source_error(Status::not_found("block 101"));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: block 101");
    }

    #[test]
    fn not_found_message_is_transient_for_execution_data() {
        let err = execution_data_status_to_source_error(Status::internal(
            "failed to get execution data: blob not found",
        ));
        assert!(err.is_not_found());
        assert!(execution_data_status_to_source_error(Status::not_found("block 101")).is_not_found());
    }

    #[test]
    fn not_found_message_is_fatal_for_other_calls() {
        let err = status_to_source_error(Status::internal("block header not found in storage index"));
        assert!(!err.is_not_found());
        assert!(matches!(&err, SourceError::Transport(msg) if msg.contains("Internal")), "{err}");
    }

    #[test]
    fn execution_data_mapping_keeps_other_statuses_fatal() {
        let err = execution_data_status_to_source_error(Status::unavailable("connection refused"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn other_statuses_are_fatal() {
        let err = status_to_source_error(Status::unavailable("connection refused"));
        assert!(!err.is_not_found());
        assert!(matches!(&err, SourceError::Transport(msg) if msg.contains("Unavailable")), "{err}");
    }
}
