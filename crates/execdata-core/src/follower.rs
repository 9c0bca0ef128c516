//! The block follower. Walks sealed blocks one height at a time.
//!
//! # Polling
//! Resolve the start position, then for every height:
//!   - request the sealed header, retrying "not found" at a fixed interval
//!   - request the block's execution data, same retry policy
//!   - decode and hand the block to a [`BlockExtractor`]
//!   - deliver the result, waiting for the consumer
//!   - optionally pause before the next block
//!
//! # Streaming
//! [`Follower::spawn_streaming`] consumes a pushed execution data stream
//! instead and applies the same decode / extract / deliver steps.
//!
//! Every remote call, wait and delivery is raced against a
//! [`CancellationToken`]. Cancellation and a dropped consumer close the
//! subscription cleanly; every other failure becomes its terminal error.

use std::future::Future;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::FollowerConfig;
use crate::cursor::Cursor;
use crate::decoder;
use crate::error::{ConfigError, FollowError, SourceError};
use crate::extract::{BlockExtractor, FilteredEvents, ModifiedAccounts};
use crate::filter::{EventFilter, StartPosition};
use crate::polling::{Clock, PollingStrategy, TokioClock, Wait};
use crate::source::{ExecutionDataSource, HeaderSource};
use crate::subscription::{channel_with_capacity, Publisher, Subscription};
use crate::types::{BlockAccounts, BlockEvents, BlockExecutionData, BlockRef};

// ─── FollowerState ────────────────────────────────────────────────────────────

/// Runtime state of a follower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowerState {
    /// Resolving the start position.
    Initializing,
    /// Requesting and delivering blocks.
    Streaming,
    /// Waiting for a block or its execution data to become available.
    Retrying,
    /// Stopped without error.
    Closed,
    /// Stopped on a terminal error.
    Failed,
}

impl std::fmt::Display for FollowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Streaming => write!(f, "streaming"),
            Self::Retrying => write!(f, "retrying"),
            Self::Closed => write!(f, "closed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ─── Follower ─────────────────────────────────────────────────────────────────

/// Follows sealed blocks and delivers one extracted value per block.
pub struct Follower<H, D, C = TokioClock> {
    config: FollowerConfig,
    headers: H,
    data: D,
    clock: C,
    state: watch::Sender<FollowerState>,
}

impl<H, D> Follower<H, D>
where
    H: HeaderSource + 'static,
    D: ExecutionDataSource + 'static,
{
    /// Validate `config` and create a follower using real time.
    pub fn new(config: FollowerConfig, headers: H, data: D) -> Result<Self, ConfigError> {
        config.validate()?;
        let (state, _) = watch::channel(FollowerState::Initializing);
        Ok(Self {
            config,
            headers,
            data,
            clock: TokioClock,
            state,
        })
    }
}

impl<H, D, C> Follower<H, D, C>
where
    H: HeaderSource + 'static,
    D: ExecutionDataSource + 'static,
    C: Clock + 'static,
{
    /// Replace the clock used for every wait.
    pub fn with_clock<C2: Clock + 'static>(self, clock: C2) -> Follower<H, D, C2> {
        Follower {
            config: self.config,
            headers: self.headers,
            data: self.data,
            clock,
            state: self.state,
        }
    }

    pub fn config(&self) -> &FollowerConfig {
        &self.config
    }

    /// Watch handle on the follower's state.
    pub fn state(&self) -> watch::Receiver<FollowerState> {
        self.state.subscribe()
    }

    /// Follow blocks by polling, delivering modified accounts per block.
    pub fn spawn_accounts(self, cancel: CancellationToken) -> (Subscription<BlockAccounts>, JoinHandle<()>) {
        let extractor = ModifiedAccounts::new(self.config.chain.address_width);
        self.spawn(extractor, cancel)
    }

    /// Follow blocks by polling, delivering the events matching `filter`.
    pub fn spawn_events(
        self,
        filter: EventFilter,
        cancel: CancellationToken,
    ) -> (Subscription<BlockEvents>, JoinHandle<()>) {
        self.spawn(FilteredEvents::new(filter), cancel)
    }

    /// Follow blocks by polling, delivering whatever `extractor` produces.
    pub fn spawn<X: BlockExtractor>(
        self,
        extractor: X,
        cancel: CancellationToken,
    ) -> (Subscription<X::Output>, JoinHandle<()>) {
        let (mut publisher, subscription) = channel_with_capacity(self.config.channel_capacity);
        let handle = tokio::spawn(async move {
            let result = self.follow(&extractor, &publisher, &cancel).await;
            self.finish(result, &mut publisher);
        });
        (subscription, handle)
    }

    /// Consume the source's pushed execution data stream instead of polling.
    pub fn spawn_streaming<X: BlockExtractor>(
        self,
        extractor: X,
        cancel: CancellationToken,
    ) -> (Subscription<X::Output>, JoinHandle<()>) {
        let (mut publisher, subscription) = channel_with_capacity(self.config.channel_capacity);
        let handle = tokio::spawn(async move {
            let result = self.follow_stream(&extractor, &publisher, &cancel).await;
            self.finish(result, &mut publisher);
        });
        (subscription, handle)
    }

    // ─── Polling loop ─────────────────────────────────────────────────────────

    async fn follow<X: BlockExtractor>(
        &self,
        extractor: &X,
        publisher: &Publisher<X::Output>,
        cancel: &CancellationToken,
    ) -> Result<(), FollowError> {
        self.set_state(FollowerState::Initializing);
        tracing::info!(
            start = ?self.config.start,
            chain = %self.config.chain.chain_id,
            "Starting block follower"
        );

        let Some(mut cursor) = self.initial_cursor(cancel).await? else {
            return Ok(());
        };
        self.set_state(FollowerState::Streaming);

        let header_poll = PollingStrategy::new(self.config.header_poll_interval());
        let data_poll = PollingStrategy::new(self.config.execution_data_poll_interval());
        let pause = self.config.block_interval().map(PollingStrategy::new);

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let height = cursor.next_height();
            let headers = &self.headers;
            let header = self
                .poll_found(height, "block header", header_poll, cancel, move || {
                    headers.header_by_height(height)
                })
                .await
                .map_err(|source| FollowError::Header { height, source })?;
            let Some(header) = header else {
                return Ok(());
            };

            let skipped = cursor.advance(header)?;
            if skipped > 0 {
                tracing::warn!(
                    requested = height,
                    got = header.height,
                    skipped,
                    "Source returned a later block than requested"
                );
            }

            let data = &self.data;
            let block_id = header.id;
            let raw = self
                .poll_found(header.height, "execution data", data_poll, cancel, move || {
                    data.execution_data(block_id)
                })
                .await
                .map_err(|source| FollowError::ExecutionData {
                    height: header.height,
                    block_id,
                    source,
                })?;
            let Some(raw) = raw else {
                return Ok(());
            };

            let decoded = decoder::decode(raw).map_err(|source| FollowError::Decode {
                height: header.height,
                source,
            })?;

            if !self.process(extractor, &header, decoded, publisher, cancel).await? {
                return Ok(());
            }

            if let Some(pause) = pause {
                if pause.wait(&self.clock, cancel).await == Wait::Cancelled {
                    return Ok(());
                }
            }
        }
    }

    async fn initial_cursor(&self, cancel: &CancellationToken) -> Result<Option<Cursor>, FollowError> {
        match self.config.start {
            StartPosition::Latest => {
                let Some(tip) = cancellable(cancel, self.headers.latest_sealed_header()).await else {
                    return Ok(None);
                };
                let tip = tip.map_err(|source| FollowError::LatestHeader { source })?;
                tracing::info!(height = tip.height, block_id = %tip.id, "Following from latest sealed block");
                Ok(Some(Cursor::after(tip)))
            }
            StartPosition::Height(height) => {
                tracing::info!(height, "Following from start height");
                Ok(Some(Cursor::at(height)))
            }
            StartPosition::BlockId(id) => {
                let Some(block) = cancellable(cancel, self.headers.header_by_id(id)).await else {
                    return Ok(None);
                };
                let block = block.map_err(|source| FollowError::StartBlock { id, source })?;
                tracing::info!(height = block.height, block_id = %id, "Following from start block");
                Ok(Some(Cursor::at(block.height)))
            }
        }
    }

    /// Repeat `request` until it stops failing with "not found".
    ///
    /// `Ok(None)` means the follower was cancelled while waiting.
    async fn poll_found<T, F, Fut>(
        &self,
        height: u64,
        what: &'static str,
        strategy: PollingStrategy,
        cancel: &CancellationToken,
        mut request: F,
    ) -> Result<Option<T>, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut attempts: u32 = 0;
        loop {
            let Some(result) = cancellable(cancel, request()).await else {
                return Ok(None);
            };
            match result {
                Ok(value) => {
                    if attempts > 0 {
                        self.set_state(FollowerState::Streaming);
                    }
                    return Ok(Some(value));
                }
                Err(err) if err.is_not_found() => {
                    attempts += 1;
                    self.set_state(FollowerState::Retrying);
                    tracing::debug!(height, attempts, what, "Not available yet, retrying");
                    if strategy.wait(&self.clock, cancel).await == Wait::Cancelled {
                        return Ok(None);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    // ─── Streaming loop ───────────────────────────────────────────────────────

    async fn follow_stream<X: BlockExtractor>(
        &self,
        extractor: &X,
        publisher: &Publisher<X::Output>,
        cancel: &CancellationToken,
    ) -> Result<(), FollowError> {
        self.set_state(FollowerState::Initializing);
        let start = self.config.start;
        let Some(stream) = cancellable(cancel, self.data.subscribe_execution_data(start)).await else {
            return Ok(());
        };
        let mut stream = stream.map_err(|source| FollowError::Stream { source })?;
        tracing::info!(start = ?start, "Execution data stream opened");
        self.set_state(FollowerState::Streaming);

        let mut cursor: Option<Cursor> = None;
        loop {
            let Some(next) = cancellable(cancel, stream.next()).await else {
                return Ok(());
            };
            let Some(message) = next else {
                tracing::info!("Execution data stream ended");
                return Ok(());
            };
            let message = message.map_err(|source| FollowError::Stream { source })?;

            let height = message.height;
            let decoded = decoder::decode(message.data)
                .map_err(|source| FollowError::Decode { height, source })?;
            let block_id = if message.block_id.is_zero() {
                decoded.block_id
            } else {
                message.block_id
            };
            let block = BlockRef::new(height, block_id);

            let skipped = cursor.get_or_insert_with(|| Cursor::at(height)).advance(block)?;
            if skipped > 0 {
                tracing::warn!(height, skipped, "Execution data stream skipped heights");
            }

            if !self.process(extractor, &block, decoded, publisher, cancel).await? {
                return Ok(());
            }
        }
    }

    // ─── Shared steps ─────────────────────────────────────────────────────────

    /// Extract and deliver one block. Returns `false` once nothing more
    /// should be delivered.
    async fn process<X: BlockExtractor>(
        &self,
        extractor: &X,
        block: &BlockRef,
        data: BlockExecutionData,
        publisher: &Publisher<X::Output>,
        cancel: &CancellationToken,
    ) -> Result<bool, FollowError> {
        let output = extractor.extract(block, data).map_err(|source| FollowError::Extract {
            height: block.height,
            source,
        })?;

        tracing::debug!(height = block.height, block_id = %block.id, "Delivering block");
        match cancellable(cancel, publisher.send(output)).await {
            None => Ok(false),
            Some(Err(_)) => {
                tracing::debug!(height = block.height, "Consumer dropped the subscription");
                Ok(false)
            }
            Some(Ok(())) => Ok(true),
        }
    }

    fn finish<T>(&self, result: Result<(), FollowError>, publisher: &mut Publisher<T>) {
        match result {
            Ok(()) => {
                tracing::info!("Block follower closed");
                self.set_state(FollowerState::Closed);
                publisher.close();
            }
            Err(err) => {
                tracing::error!(error = %err, height = ?err.height(), "Block follower failed");
                self.set_state(FollowerState::Failed);
                publisher.fail(err);
            }
        }
    }

    fn set_state(&self, state: FollowerState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}
