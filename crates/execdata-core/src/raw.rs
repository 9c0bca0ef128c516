//! Wire messages for block execution data (`flow.entities` / `flow.ledger`).
//!
//! Hand-maintained equivalents of the generated protobuf types. Only the
//! fields this crate reads are declared; prost skips the rest when decoding.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawBlockExecutionData {
    #[prost(bytes = "vec", tag = "1")]
    pub block_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, repeated, tag = "2")]
    pub chunk_execution_data: ::prost::alloc::vec::Vec<RawChunkExecutionData>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawChunkExecutionData {
    /// Tag 1 carries the chunk's collection, which is not decoded here.
    #[prost(message, repeated, tag = "2")]
    pub events: ::prost::alloc::vec::Vec<RawEvent>,
    /// Absent when the chunk wrote no registers.
    #[prost(message, optional, tag = "3")]
    pub trie_update: ::core::option::Option<RawTrieUpdate>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawTrieUpdate {
    #[prost(bytes = "vec", tag = "1")]
    pub root_hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub paths: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    #[prost(message, repeated, tag = "3")]
    pub payloads: ::prost::alloc::vec::Vec<RawPayload>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawPayload {
    #[prost(message, repeated, tag = "1")]
    pub key_part: ::prost::alloc::vec::Vec<RawKeyPart>,
    #[prost(bytes = "vec", tag = "2")]
    pub value: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawKeyPart {
    /// Key-part type; the ledger stores it as a u16.
    #[prost(uint32, tag = "1")]
    pub r#type: u32,
    #[prost(bytes = "vec", tag = "2")]
    pub value: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawEvent {
    #[prost(string, tag = "1")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub transaction_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub transaction_index: u32,
    #[prost(uint32, tag = "4")]
    pub event_index: u32,
    #[prost(bytes = "vec", tag = "5")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}
