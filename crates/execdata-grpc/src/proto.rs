//! Request/response messages of the `flow.access` and `flow.executiondata`
//! services.
//!
//! Hand-maintained equivalents of the generated protobuf types, limited to
//! the RPCs this crate calls. Block execution data and events reuse the
//! message types from [`execdata_core::raw`].

use execdata_core::raw::{RawBlockExecutionData, RawEvent};

// ─── flow.entities ────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockHeader {
    #[prost(bytes = "vec", tag = "1")]
    pub id: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub parent_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "3")]
    pub height: u64,
}

/// `flow.entities.EventEncodingVersion`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EventEncodingVersion {
    JsonCdcV0 = 0,
    CcfV0 = 1,
}

// ─── flow.access ──────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetLatestBlockHeaderRequest {
    #[prost(bool, tag = "1")]
    pub is_sealed: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBlockHeaderByIdRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub id: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBlockHeaderByHeightRequest {
    #[prost(uint64, tag = "1")]
    pub height: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockHeaderResponse {
    #[prost(message, optional, tag = "1")]
    pub block: ::core::option::Option<BlockHeader>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetNetworkParametersRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetNetworkParametersResponse {
    #[prost(string, tag = "1")]
    pub chain_id: ::prost::alloc::string::String,
}

// ─── flow.executiondata ───────────────────────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetExecutionDataByBlockIdRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub block_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(enumeration = "EventEncodingVersion", tag = "2")]
    pub event_encoding_version: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetExecutionDataByBlockIdResponse {
    #[prost(message, optional, tag = "1")]
    pub block_execution_data: ::core::option::Option<RawBlockExecutionData>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeExecutionDataRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub start_block_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub start_block_height: u64,
    #[prost(enumeration = "EventEncodingVersion", tag = "3")]
    pub event_encoding_version: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeExecutionDataResponse {
    #[prost(uint64, tag = "1")]
    pub block_height: u64,
    #[prost(message, optional, tag = "2")]
    pub block_execution_data: ::core::option::Option<RawBlockExecutionData>,
}

/// `flow.executiondata.EventFilter`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EventFilter {
    #[prost(string, repeated, tag = "1")]
    pub event_type: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, repeated, tag = "2")]
    pub contract: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, repeated, tag = "3")]
    pub address: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeEventsRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub start_block_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub start_block_height: u64,
    #[prost(message, optional, tag = "3")]
    pub filter: ::core::option::Option<EventFilter>,
    /// Blocks between heartbeat messages; zero uses the server default.
    #[prost(uint64, tag = "4")]
    pub heartbeat_interval: u64,
    #[prost(enumeration = "EventEncodingVersion", tag = "5")]
    pub event_encoding_version: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeEventsResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub block_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub block_height: u64,
    #[prost(message, repeated, tag = "3")]
    pub events: ::prost::alloc::vec::Vec<RawEvent>,
}
