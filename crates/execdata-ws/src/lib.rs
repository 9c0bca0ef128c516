//! execdata-ws: server-filtered event streams over the Access node's REST
//! WebSocket endpoint.
//!
//! # Usage
//! ```no_run
//! use execdata_core::relay::spawn_events;
//! use execdata_core::{EventFilter, StartPosition};
//! use execdata_ws::RestEventsClient;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() {
//! let client = RestEventsClient::new("localhost:8070");
//! let filter = EventFilter::contract("A.1654653399040a61.FlowToken");
//! let (mut sub, _task) = spawn_events(client, StartPosition::Latest, filter, CancellationToken::new());
//! while let Some(block) = sub.receive().await {
//!     println!("{} events at height {}", block.events.len(), block.height);
//! }
//! # }
//! ```

pub mod client;
pub mod error;
pub mod message;

pub use client::RestEventsClient;
pub use error::WsError;
pub use message::{parse_message, RawEventsResponse};
