//! gRPC endpoint configuration.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};

use crate::error::GrpcError;

/// Default cap on a single response, sized for large execution data blocks.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Connection settings for an Access or Execution Data API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrpcConfig {
    /// `host:port`, optionally with an `http://` or `https://` scheme.
    pub endpoint: String,
    /// Largest response message accepted, in bytes.
    pub max_message_size: usize,
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
}

impl GrpcConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = bytes;
        self
    }

    /// The endpoint as a URI, defaulting to plaintext `http://`.
    pub fn uri(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("http://{}", self.endpoint)
        }
    }

    fn endpoint(&self) -> Result<Endpoint, GrpcError> {
        Endpoint::from_shared(self.uri())
            .map(|e| e.connect_timeout(self.connect_timeout))
            .map_err(|e| GrpcError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })
    }

    /// Open a channel, failing fast if the server is unreachable.
    pub async fn connect(&self) -> Result<Channel, GrpcError> {
        tracing::info!(endpoint = %self.endpoint, "Connecting to gRPC endpoint");
        self.endpoint()?
            .connect()
            .await
            .map_err(|source| GrpcError::Connect {
                endpoint: self.endpoint.clone(),
                source,
            })
    }

    /// Create a channel that connects on first use.
    pub fn connect_lazy(&self) -> Result<Channel, GrpcError> {
        Ok(self.endpoint()?.connect_lazy())
    }
}
