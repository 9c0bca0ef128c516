//! Capability traits for the remote services the follower talks to.
//!
//! Transports implement these; the follower only sees the traits, so each
//! can be replaced by an in-memory mock in tests.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;

use crate::error::SourceError;
use crate::filter::{EventFilter, StartPosition};
use crate::raw::RawBlockExecutionData;
use crate::types::{BlockEvents, BlockRef, Identifier};

/// One message of a pushed execution data stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionDataMessage {
    pub height: u64,
    /// Block the data belongs to. Zero when the server omitted it.
    pub block_id: Identifier,
    /// `None` when the message carried no execution data.
    pub data: Option<RawBlockExecutionData>,
}

/// Pushed execution data.
pub type ExecutionDataStream =
    Pin<Box<dyn Stream<Item = Result<ExecutionDataMessage, SourceError>> + Send>>;

/// Pushed, server-filtered events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<BlockEvents, SourceError>> + Send>>;

/// Block header lookups.
#[async_trait]
pub trait HeaderSource: Send + Sync {
    /// The most recent sealed block.
    async fn latest_sealed_header(&self) -> Result<BlockRef, SourceError>;

    /// The block at `height`. Fails with [`SourceError::NotFound`] past the tip.
    async fn header_by_height(&self, height: u64) -> Result<BlockRef, SourceError>;

    /// The block with `id`.
    async fn header_by_id(&self, id: Identifier) -> Result<BlockRef, SourceError>;
}

/// Execution data lookups.
#[async_trait]
pub trait ExecutionDataSource: Send + Sync {
    /// Execution data of a sealed block. Fails with [`SourceError::NotFound`]
    /// until the data has been published.
    async fn execution_data(
        &self,
        block_id: Identifier,
    ) -> Result<Option<RawBlockExecutionData>, SourceError>;

    /// Push-based variant: one message per block starting at `start`.
    async fn subscribe_execution_data(
        &self,
        _start: StartPosition,
    ) -> Result<ExecutionDataStream, SourceError> {
        Err(SourceError::Unsupported("subscribe_execution_data"))
    }
}

/// Server-side filtered event streams.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn subscribe_events(
        &self,
        start: StartPosition,
        filter: &EventFilter,
    ) -> Result<EventStream, SourceError>;
}

#[async_trait]
impl<T: HeaderSource + ?Sized> HeaderSource for Arc<T> {
    async fn latest_sealed_header(&self) -> Result<BlockRef, SourceError> {
        (**self).latest_sealed_header().await
    }

    async fn header_by_height(&self, height: u64) -> Result<BlockRef, SourceError> {
        (**self).header_by_height(height).await
    }

    async fn header_by_id(&self, id: Identifier) -> Result<BlockRef, SourceError> {
        (**self).header_by_id(id).await
    }
}

#[async_trait]
impl<T: ExecutionDataSource + ?Sized> ExecutionDataSource for Arc<T> {
    async fn execution_data(
        &self,
        block_id: Identifier,
    ) -> Result<Option<RawBlockExecutionData>, SourceError> {
        (**self).execution_data(block_id).await
    }

    async fn subscribe_execution_data(
        &self,
        start: StartPosition,
    ) -> Result<ExecutionDataStream, SourceError> {
        (**self).subscribe_execution_data(start).await
    }
}

#[async_trait]
impl<T: EventSource + ?Sized> EventSource for Arc<T> {
    async fn subscribe_events(
        &self,
        start: StartPosition,
        filter: &EventFilter,
    ) -> Result<EventStream, SourceError> {
        (**self).subscribe_events(start, filter).await
    }
}
