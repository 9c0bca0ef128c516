//! Access API and Execution Data API clients.
//!
//! Both wrap a [`tonic::client::Grpc`] over a shared [`Channel`] and call
//! the RPCs by path with a prost codec, so no generated service code is
//! needed.

use async_trait::async_trait;
use futures::StreamExt;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{Request, Status};

use execdata_core::decoder::decode_events;
use execdata_core::raw::RawBlockExecutionData;
use execdata_core::{
    BlockEvents, BlockRef, EventFilter, EventSource, EventStream, ExecutionDataMessage, ExecutionDataSource,
    ExecutionDataStream, HeaderSource, Identifier, SourceError, StartPosition,
};

use crate::config::GrpcConfig;
use crate::error::{execution_data_status_to_source_error, status_to_source_error, GrpcError};
use crate::proto;

const GET_LATEST_BLOCK_HEADER: &str = "/flow.access.AccessAPI/GetLatestBlockHeader";
const GET_BLOCK_HEADER_BY_ID: &str = "/flow.access.AccessAPI/GetBlockHeaderByID";
const GET_BLOCK_HEADER_BY_HEIGHT: &str = "/flow.access.AccessAPI/GetBlockHeaderByHeight";
const GET_NETWORK_PARAMETERS: &str = "/flow.access.AccessAPI/GetNetworkParameters";
const GET_EXECUTION_DATA_BY_BLOCK_ID: &str = "/flow.executiondata.ExecutionDataAPI/GetExecutionDataByBlockID";
const SUBSCRIBE_EXECUTION_DATA: &str = "/flow.executiondata.ExecutionDataAPI/SubscribeExecutionData";
const SUBSCRIBE_EVENTS: &str = "/flow.executiondata.ExecutionDataAPI/SubscribeEvents";

// ─── Shared call plumbing ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct RpcChannel {
    grpc: Grpc<Channel>,
}

impl RpcChannel {
    fn new(channel: Channel, max_message_size: usize) -> Self {
        Self {
            grpc: Grpc::new(channel).max_decoding_message_size(max_message_size),
        }
    }

    async fn ready(&self) -> Result<Grpc<Channel>, Status> {
        let mut grpc = self.grpc.clone();
        grpc.ready()
            .await
            .map_err(|e| Status::unknown(format!("service was not ready: {e}")))?;
        Ok(grpc)
    }

    async fn unary<Req, Resp>(&self, path: &'static str, req: Req) -> Result<Resp, SourceError>
    where
        Req: prost::Message + 'static,
        Resp: prost::Message + Default + 'static,
    {
        self.unary_mapped(path, req, status_to_source_error).await
    }

    async fn unary_mapped<Req, Resp>(
        &self,
        path: &'static str,
        req: Req,
        map_status: fn(Status) -> SourceError,
    ) -> Result<Resp, SourceError>
    where
        Req: prost::Message + 'static,
        Resp: prost::Message + Default + 'static,
    {
        let mut grpc = self.ready().await.map_err(map_status)?;
        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        grpc.unary(Request::new(req), PathAndQuery::from_static(path), codec)
            .await
            .map(|resp| resp.into_inner())
            .map_err(map_status)
    }

    async fn server_streaming<Req, Resp>(
        &self,
        path: &'static str,
        req: Req,
    ) -> Result<tonic::codec::Streaming<Resp>, SourceError>
    where
        Req: prost::Message + 'static,
        Resp: prost::Message + Default + 'static,
    {
        let mut grpc = self.ready().await.map_err(status_to_source_error)?;
        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        grpc.server_streaming(Request::new(req), PathAndQuery::from_static(path), codec)
            .await
            .map(|resp| resp.into_inner())
            .map_err(status_to_source_error)
    }
}

// ─── AccessClient ─────────────────────────────────────────────────────────────

/// Client for the `flow.access.AccessAPI` header RPCs.
#[derive(Debug, Clone)]
pub struct AccessClient {
    rpc: RpcChannel,
}

impl AccessClient {
    pub async fn connect(config: &GrpcConfig) -> Result<Self, GrpcError> {
        let channel = config.connect().await?;
        Ok(Self::new(channel, config.max_message_size))
    }

    pub fn new(channel: Channel, max_message_size: usize) -> Self {
        Self {
            rpc: RpcChannel::new(channel, max_message_size),
        }
    }

    /// The network's chain id, e.g. `flow-mainnet`.
    pub async fn chain_id(&self) -> Result<String, SourceError> {
        let resp: proto::GetNetworkParametersResponse = self
            .rpc
            .unary(GET_NETWORK_PARAMETERS, proto::GetNetworkParametersRequest {})
            .await?;
        Ok(resp.chain_id)
    }
}

fn header_to_block_ref(resp: proto::BlockHeaderResponse) -> Result<BlockRef, SourceError> {
    let header = resp
        .block
        .ok_or_else(|| SourceError::Decode("response has no block header".into()))?;
    let id = Identifier::from_slice(&header.id).map_err(|e| SourceError::Decode(format!("block id: {e}")))?;
    Ok(BlockRef::new(header.height, id))
}

#[async_trait]
impl HeaderSource for AccessClient {
    async fn latest_sealed_header(&self) -> Result<BlockRef, SourceError> {
        let req = proto::GetLatestBlockHeaderRequest { is_sealed: true };
        let resp: proto::BlockHeaderResponse = self.rpc.unary(GET_LATEST_BLOCK_HEADER, req).await?;
        header_to_block_ref(resp)
    }

    async fn header_by_height(&self, height: u64) -> Result<BlockRef, SourceError> {
        let req = proto::GetBlockHeaderByHeightRequest { height };
        let resp: proto::BlockHeaderResponse = self.rpc.unary(GET_BLOCK_HEADER_BY_HEIGHT, req).await?;
        header_to_block_ref(resp)
    }

    async fn header_by_id(&self, id: Identifier) -> Result<BlockRef, SourceError> {
        let req = proto::GetBlockHeaderByIdRequest { id: id.as_bytes().to_vec() };
        let resp: proto::BlockHeaderResponse = self.rpc.unary(GET_BLOCK_HEADER_BY_ID, req).await?;
        header_to_block_ref(resp)
    }
}

// ─── ExecutionDataClient ──────────────────────────────────────────────────────

/// Client for the `flow.executiondata.ExecutionDataAPI`.
#[derive(Debug, Clone)]
pub struct ExecutionDataClient {
    rpc: RpcChannel,
    encoding: proto::EventEncodingVersion,
}

impl ExecutionDataClient {
    pub async fn connect(config: &GrpcConfig) -> Result<Self, GrpcError> {
        let channel = config.connect().await?;
        Ok(Self::new(channel, config.max_message_size))
    }

    pub fn new(channel: Channel, max_message_size: usize) -> Self {
        Self {
            rpc: RpcChannel::new(channel, max_message_size),
            encoding: proto::EventEncodingVersion::JsonCdcV0,
        }
    }

    /// Request event payloads in this encoding. Defaults to JSON-CDC.
    pub fn with_event_encoding(mut self, encoding: proto::EventEncodingVersion) -> Self {
        self.encoding = encoding;
        self
    }
}

pub(crate) fn subscribe_execution_data_request(
    start: StartPosition,
    encoding: proto::EventEncodingVersion,
) -> proto::SubscribeExecutionDataRequest {
    let (id, height) = start.to_options();
    proto::SubscribeExecutionDataRequest {
        start_block_id: start_id_bytes(id),
        start_block_height: height,
        event_encoding_version: encoding as i32,
    }
}

pub(crate) fn subscribe_events_request(
    start: StartPosition,
    filter: &EventFilter,
    encoding: proto::EventEncodingVersion,
) -> proto::SubscribeEventsRequest {
    let (id, height) = start.to_options();
    proto::SubscribeEventsRequest {
        start_block_id: start_id_bytes(id),
        start_block_height: height,
        filter: Some(proto::EventFilter {
            event_type: filter.event_types.clone(),
            contract: filter.contracts.clone(),
            address: filter.addresses.clone(),
        }),
        heartbeat_interval: 0,
        event_encoding_version: encoding as i32,
    }
}

/// Unset start ids are sent as empty bytes.
fn start_id_bytes(id: Identifier) -> Vec<u8> {
    if id.is_zero() {
        Vec::new()
    } else {
        id.as_bytes().to_vec()
    }
}

pub(crate) fn execution_data_message(resp: proto::SubscribeExecutionDataResponse) -> ExecutionDataMessage {
    let block_id = resp
        .block_execution_data
        .as_ref()
        .and_then(|d| Identifier::from_slice(&d.block_id).ok())
        .unwrap_or_default();
    ExecutionDataMessage {
        height: resp.block_height,
        block_id,
        data: resp.block_execution_data,
    }
}

pub(crate) fn block_events(resp: proto::SubscribeEventsResponse) -> Result<BlockEvents, SourceError> {
    let block_id = Identifier::from_slice(&resp.block_id).map_err(|e| SourceError::Decode(format!("block id: {e}")))?;
    let events = decode_events(resp.events).map_err(SourceError::Decode)?;
    Ok(BlockEvents {
        height: resp.block_height,
        block_id,
        events,
    })
}

#[async_trait]
impl ExecutionDataSource for ExecutionDataClient {
    async fn execution_data(&self, block_id: Identifier) -> Result<Option<RawBlockExecutionData>, SourceError> {
        let req = proto::GetExecutionDataByBlockIdRequest {
            block_id: block_id.as_bytes().to_vec(),
            event_encoding_version: self.encoding as i32,
        };
        let resp: proto::GetExecutionDataByBlockIdResponse = self
            .rpc
            .unary_mapped(GET_EXECUTION_DATA_BY_BLOCK_ID, req, execution_data_status_to_source_error)
            .await?;
        Ok(resp.block_execution_data)
    }

    async fn subscribe_execution_data(&self, start: StartPosition) -> Result<ExecutionDataStream, SourceError> {
        let req = subscribe_execution_data_request(start, self.encoding);
        let stream = self
            .rpc
            .server_streaming::<_, proto::SubscribeExecutionDataResponse>(SUBSCRIBE_EXECUTION_DATA, req)
            .await?;
        tracing::info!(start = ?start, "Subscribed to execution data");
        Ok(Box::pin(stream.map(|item| {
            item.map(execution_data_message).map_err(status_to_source_error)
        })))
    }
}

#[async_trait]
impl EventSource for ExecutionDataClient {
    async fn subscribe_events(&self, start: StartPosition, filter: &EventFilter) -> Result<EventStream, SourceError> {
        let req = subscribe_events_request(start, filter, self.encoding);
        let stream = self
            .rpc
            .server_streaming::<_, proto::SubscribeEventsResponse>(SUBSCRIBE_EVENTS, req)
            .await?;
        tracing::info!(start = ?start, "Subscribed to events");
        Ok(Box::pin(stream.map(|item| item.map_err(status_to_source_error).and_then(block_events))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use execdata_core::raw::RawEvent;
    use prost::Message;

    #[test]
    fn header_response_conversion() {
        let resp = proto::BlockHeaderResponse {
            block: Some(proto::BlockHeader {
                id: vec![7; 32],
                parent_id: vec![6; 32],
                height: 101,
            }),
        };
        let block = header_to_block_ref(resp).unwrap();
        assert_eq!(block, BlockRef::new(101, Identifier::new([7; 32])));

        let err = header_to_block_ref(proto::BlockHeaderResponse { block: None }).unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));

        let short = proto::BlockHeaderResponse {
            block: Some(proto::BlockHeader { id: vec![1; 4], parent_id: vec![], height: 1 }),
        };
        assert!(matches!(header_to_block_ref(short), Err(SourceError::Decode(_))));
    }

    #[test]
    fn subscribe_requests_carry_start_and_filter() {
        let filter = EventFilter::new(["A.1.Foo.Bar"], ["A.1.Foo"], ["0x01"]);
        let req = subscribe_events_request(StartPosition::Height(42), &filter, proto::EventEncodingVersion::CcfV0);
        assert!(req.start_block_id.is_empty());
        assert_eq!(req.start_block_height, 42);
        assert_eq!(req.event_encoding_version, 1);
        let f = req.filter.unwrap();
        assert_eq!(f.event_type, vec!["A.1.Foo.Bar"]);
        assert_eq!(f.contract, vec!["A.1.Foo"]);
        assert_eq!(f.address, vec!["0x01"]);

        let id = Identifier::new([3; 32]);
        let req = subscribe_execution_data_request(StartPosition::BlockId(id), proto::EventEncodingVersion::JsonCdcV0);
        assert_eq!(req.start_block_id, vec![3; 32]);
        assert_eq!(req.start_block_height, 0);
    }

    #[test]
    fn events_response_survives_the_wire() {
        let resp = proto::SubscribeEventsResponse {
            block_id: vec![9; 32],
            block_height: 77,
            events: vec![RawEvent {
                r#type: "A.1654653399040a61.FlowToken.TokensDeposited".into(),
                transaction_id: vec![1; 32],
                transaction_index: 2,
                event_index: 3,
                payload: b"{}".to_vec(),
            }],
        };
        let bytes = resp.encode_to_vec();
        let decoded = proto::SubscribeEventsResponse::decode(bytes.as_slice()).unwrap();

        let block = block_events(decoded).unwrap();
        assert_eq!(block.height, 77);
        assert_eq!(block.block_id, Identifier::new([9; 32]));
        assert_eq!(block.events[0].transaction_index, 2);
        assert_eq!(block.events[0].event_index, 3);
    }

    #[test]
    fn execution_data_message_takes_id_from_payload() {
        let resp = proto::SubscribeExecutionDataResponse {
            block_height: 5,
            block_execution_data: Some(RawBlockExecutionData {
                block_id: vec![4; 32],
                chunk_execution_data: vec![],
            }),
        };
        let msg = execution_data_message(resp);
        assert_eq!(msg.height, 5);
        assert_eq!(msg.block_id, Identifier::new([4; 32]));

        let empty = execution_data_message(proto::SubscribeExecutionDataResponse {
            block_height: 6,
            block_execution_data: None,
        });
        assert!(empty.block_id.is_zero());
        assert!(empty.data.is_none());
    }
}
