//! execdata-core: follow a Flow chain's execution data block by block.
//!
//! # Architecture
//!
//! ```text
//! FollowerBuilder → Follower
//!                      ├── HeaderSource         (sealed headers by height / id)
//!                      ├── ExecutionDataSource  (execution data by block id, or pushed)
//!                      ├── PollingStrategy      (fixed-interval "not found" retry)
//!                      ├── decoder              (raw protobuf → BlockExecutionData)
//!                      ├── BlockExtractor       (modified accounts / filtered events)
//!                      └── Publisher ──► Subscription (consumer)
//!
//! EventSource → relay::spawn_events ──► Subscription<BlockEvents>
//! ```
//!
//! Transports live in `execdata-grpc` and `execdata-ws`; this crate only
//! sees them through the traits in [`source`].

pub mod accounts;
pub mod config;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod extract;
pub mod filter;
pub mod follower;
pub mod polling;
pub mod raw;
pub mod relay;
pub mod source;
pub mod subscription;
pub mod types;

pub use accounts::extract_accounts;
pub use config::{ChainConfig, FollowerBuilder, FollowerConfig, FLOW_ADDRESS_WIDTH};
pub use cursor::Cursor;
pub use decoder::{decode, decode_bytes};
pub use error::{ConfigError, DecodeError, ExtractError, FollowError, SourceError};
pub use extract::{BlockExtractor, FilteredEvents, ModifiedAccounts};
pub use filter::{EventFilter, StartPosition};
pub use follower::{Follower, FollowerState};
pub use polling::{Clock, PollingStrategy, RecordingClock, TokioClock};
pub use source::{EventSource, EventStream, ExecutionDataMessage, ExecutionDataSource, ExecutionDataStream, HeaderSource};
pub use subscription::{Publisher, Subscription};
pub use types::{
    Address, BlockAccounts, BlockEvents, BlockExecutionData, BlockRef, ChunkExecutionData, Event, Identifier,
    TrieUpdate,
};
