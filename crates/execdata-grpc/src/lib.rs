//! execdata-grpc: Flow Access API and Execution Data API over gRPC.
//!
//! [`AccessClient`] implements [`execdata_core::HeaderSource`];
//! [`ExecutionDataClient`] implements [`execdata_core::ExecutionDataSource`]
//! and [`execdata_core::EventSource`]. Both can share one channel when the
//! server exposes both services on the same port.
//!
//! ```rust,no_run
//! use execdata_grpc::{AccessClient, ExecutionDataClient, GrpcConfig};
//!
//! # async fn run() -> Result<(), execdata_grpc::GrpcError> {
//! let config = GrpcConfig::new("access.mainnet.nodes.onflow.org:9000");
//! let channel = config.connect().await?;
//! let access = AccessClient::new(channel.clone(), config.max_message_size);
//! let data = ExecutionDataClient::new(channel, config.max_message_size);
//! println!("chain: {}", access.chain_id().await?);
//! # let _ = data;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod proto;

pub use client::{AccessClient, ExecutionDataClient};
pub use config::{GrpcConfig, DEFAULT_MAX_MESSAGE_SIZE};
pub use error::{execution_data_status_to_source_error, status_to_source_error, GrpcError};
