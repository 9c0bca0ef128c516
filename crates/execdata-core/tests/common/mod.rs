//! In-memory sources shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use execdata_core::raw::{
    RawBlockExecutionData, RawChunkExecutionData, RawEvent, RawKeyPart, RawPayload, RawTrieUpdate,
};
use execdata_core::{
    BlockEvents, BlockRef, EventFilter, EventSource, EventStream, ExecutionDataMessage,
    ExecutionDataSource, ExecutionDataStream, HeaderSource, Identifier, SourceError, StartPosition,
};

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Deterministic block id: the height in the first eight bytes.
pub fn block_id(height: u64) -> Identifier {
    let mut bytes = [0xab; 32];
    bytes[..8].copy_from_slice(&height.to_be_bytes());
    Identifier::new(bytes)
}

fn height_of(id: &Identifier) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&id.as_bytes()[..8]);
    u64::from_be_bytes(bytes)
}

/// Account owner bytes used for the registers written at `height`.
pub fn owner(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}

pub fn raw_event(ty: &str, tx_index: u32) -> RawEvent {
    RawEvent {
        r#type: ty.to_string(),
        transaction_id: vec![0x11; 32],
        transaction_index: tx_index,
        event_index: 0,
        payload: b"{}".to_vec(),
    }
}

fn register(owner: &[u8]) -> RawPayload {
    RawPayload {
        key_part: vec![
            RawKeyPart { r#type: 0, value: owner.to_vec() },
            RawKeyPart { r#type: 2, value: b"balance".to_vec() },
        ],
        value: vec![1, 2, 3],
    }
}

/// One chunk writing registers of `owner(height)` (twice) and `owner(1)`.
pub fn raw_block(height: u64, events: Vec<RawEvent>) -> RawBlockExecutionData {
    RawBlockExecutionData {
        block_id: block_id(height).as_bytes().to_vec(),
        chunk_execution_data: vec![RawChunkExecutionData {
            events,
            trie_update: Some(RawTrieUpdate {
                root_hash: vec![0; 32],
                paths: vec![],
                payloads: vec![register(&owner(height)), register(&owner(1)), register(&owner(height))],
            }),
        }],
    }
}

// ─── MockChain ────────────────────────────────────────────────────────────────

/// Header and execution data source over a synthetic chain.
///
/// `tip` is what `latest_sealed_header` reports. Without an `end`, heights
/// past the tip fail with "not found". With an `end`, every height up to it
/// exists and anything above fails with a transport error, which lets a test
/// run the follower to a deterministic stop.
#[derive(Default)]
pub struct MockChain {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    tip: u64,
    end: Option<u64>,
    header_not_found: HashMap<u64, usize>,
    data_not_found: HashMap<u64, usize>,
    header_errors: HashMap<u64, String>,
    redirects: HashMap<u64, u64>,
    missing_data: HashSet<u64>,
    events: HashMap<u64, Vec<RawEvent>>,
    stream: Option<Vec<Result<ExecutionDataMessage, SourceError>>>,
    header_requests: Vec<u64>,
    data_requests: Vec<u64>,
}

impl MockChain {
    pub fn new(tip: u64) -> Self {
        let chain = Self::default();
        chain.with(|i| i.tip = tip);
        chain
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        f(&mut self.inner.lock().unwrap())
    }

    /// Requests above `height` fail with a transport error.
    pub fn end_at(self, height: u64) -> Self {
        self.with(|i| i.end = Some(height));
        self
    }

    pub fn header_not_found(self, height: u64, times: usize) -> Self {
        self.with(|i| i.header_not_found.insert(height, times));
        self
    }

    pub fn data_not_found(self, height: u64, times: usize) -> Self {
        self.with(|i| i.data_not_found.insert(height, times));
        self
    }

    pub fn header_error(self, height: u64, msg: &str) -> Self {
        self.with(|i| i.header_errors.insert(height, msg.to_string()));
        self
    }

    /// Answer a request for `requested` with the block at `returned`.
    pub fn redirect(self, requested: u64, returned: u64) -> Self {
        self.with(|i| i.redirects.insert(requested, returned));
        self
    }

    /// The block at `height` has no execution data message.
    pub fn missing_data(self, height: u64) -> Self {
        self.with(|i| i.missing_data.insert(height));
        self
    }

    pub fn events(self, height: u64, events: Vec<RawEvent>) -> Self {
        self.with(|i| i.events.insert(height, events));
        self
    }

    pub fn stream(self, messages: Vec<Result<ExecutionDataMessage, SourceError>>) -> Self {
        self.with(|i| i.stream = Some(messages));
        self
    }

    pub fn header_requests(&self) -> Vec<u64> {
        self.with(|i| i.header_requests.clone())
    }

    pub fn data_requests(&self) -> Vec<u64> {
        self.with(|i| i.data_requests.clone())
    }

    pub fn message(&self, height: u64) -> ExecutionDataMessage {
        let events = self.with(|i| i.events.get(&height).cloned().unwrap_or_default());
        ExecutionDataMessage {
            height,
            block_id: block_id(height),
            data: Some(raw_block(height, events)),
        }
    }
}

fn countdown(map: &mut HashMap<u64, usize>, height: u64) -> bool {
    match map.get_mut(&height) {
        Some(n) if *n > 0 => {
            *n -= 1;
            true
        }
        _ => false,
    }
}

#[async_trait]
impl HeaderSource for MockChain {
    async fn latest_sealed_header(&self) -> Result<BlockRef, SourceError> {
        let tip = self.with(|i| i.tip);
        Ok(BlockRef::new(tip, block_id(tip)))
    }

    async fn header_by_height(&self, height: u64) -> Result<BlockRef, SourceError> {
        self.with(|i| {
            i.header_requests.push(height);
            if countdown(&mut i.header_not_found, height) {
                return Err(SourceError::NotFound(format!("block {height}")));
            }
            if let Some(msg) = i.header_errors.get(&height) {
                return Err(SourceError::Transport(msg.clone()));
            }
            let returned = i.redirects.get(&height).copied().unwrap_or(height);
            let exists = match i.end {
                Some(end) if returned > end => return Err(SourceError::Transport("end of mock chain".into())),
                Some(_) => true,
                None => returned <= i.tip,
            };
            if !exists {
                return Err(SourceError::NotFound(format!("block {returned}")));
            }
            Ok(BlockRef::new(returned, block_id(returned)))
        })
    }

    async fn header_by_id(&self, id: Identifier) -> Result<BlockRef, SourceError> {
        let height = height_of(&id);
        let tip = self.with(|i| i.tip);
        if height > tip {
            return Err(SourceError::NotFound(format!("block {id}")));
        }
        Ok(BlockRef::new(height, id))
    }
}

#[async_trait]
impl ExecutionDataSource for MockChain {
    async fn execution_data(&self, id: Identifier) -> Result<Option<RawBlockExecutionData>, SourceError> {
        let height = height_of(&id);
        self.with(|i| {
            i.data_requests.push(height);
            if countdown(&mut i.data_not_found, height) {
                return Err(SourceError::NotFound(format!("execution data for {id}")));
            }
            if i.missing_data.contains(&height) {
                return Ok(None);
            }
            let events = i.events.get(&height).cloned().unwrap_or_default();
            Ok(Some(raw_block(height, events)))
        })
    }

    async fn subscribe_execution_data(&self, _start: StartPosition) -> Result<ExecutionDataStream, SourceError> {
        let messages = self
            .with(|i| i.stream.take())
            .ok_or(SourceError::Unsupported("subscribe_execution_data"))?;
        Ok(Box::pin(futures::stream::iter(messages)))
    }
}

// ─── MockEvents ───────────────────────────────────────────────────────────────

/// Event source replaying a fixed list of stream items.
#[derive(Default)]
pub struct MockEvents {
    items: Mutex<Option<Vec<Result<BlockEvents, SourceError>>>>,
    requests: Mutex<Vec<(StartPosition, EventFilter)>>,
}

impl MockEvents {
    pub fn new(items: Vec<Result<BlockEvents, SourceError>>) -> Self {
        Self {
            items: Mutex::new(Some(items)),
            requests: Mutex::default(),
        }
    }

    pub fn requests(&self) -> Vec<(StartPosition, EventFilter)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSource for MockEvents {
    async fn subscribe_events(&self, start: StartPosition, filter: &EventFilter) -> Result<EventStream, SourceError> {
        self.requests.lock().unwrap().push((start, filter.clone()));
        let items = self
            .items
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| SourceError::Transport("already subscribed".into()))?;
        Ok(Box::pin(futures::stream::iter(items)))
    }
}
