//! What the follower derives from each decoded block.

use crate::accounts::extract_accounts;
use crate::error::ExtractError;
use crate::filter::EventFilter;
use crate::types::{BlockAccounts, BlockEvents, BlockExecutionData, BlockRef};

/// Turns a decoded block into the value delivered to the consumer.
pub trait BlockExtractor: Send + Sync + 'static {
    type Output: Send + 'static;

    fn extract(&self, block: &BlockRef, data: BlockExecutionData) -> Result<Self::Output, ExtractError>;
}

/// Accounts whose registers were written in the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifiedAccounts {
    pub address_width: usize,
}

impl ModifiedAccounts {
    pub fn new(address_width: usize) -> Self {
        Self { address_width }
    }
}

impl BlockExtractor for ModifiedAccounts {
    type Output = BlockAccounts;

    fn extract(&self, block: &BlockRef, data: BlockExecutionData) -> Result<BlockAccounts, ExtractError> {
        let accounts = extract_accounts(data.trie_updates(), self.address_width)?;
        Ok(BlockAccounts { block: *block, accounts })
    }
}

/// Events matching a filter, applied client-side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredEvents {
    pub filter: EventFilter,
}

impl FilteredEvents {
    pub fn new(filter: EventFilter) -> Self {
        Self { filter }
    }
}

impl BlockExtractor for FilteredEvents {
    type Output = BlockEvents;

    fn extract(&self, block: &BlockRef, data: BlockExecutionData) -> Result<BlockEvents, ExtractError> {
        let events = data
            .chunks
            .into_iter()
            .flat_map(|c| c.events)
            .filter(|e| self.filter.matches(e))
            .collect();
        Ok(BlockEvents {
            height: block.height,
            block_id: block.id,
            events,
        })
    }
}
