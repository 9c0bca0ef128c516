//! Follower cursor: tracks the next height to request.

use serde::{Deserialize, Serialize};

use crate::error::FollowError;
use crate::types::BlockRef;

/// The follower's position in the chain.
///
/// Delivered heights are strictly increasing: [`Cursor::advance`] accepts
/// any height at or above [`Cursor::next_height`] and rejects anything lower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Height of the next block to request.
    next_height: u64,
    /// Last block that was accepted.
    last: Option<BlockRef>,
}

impl Cursor {
    /// Cursor whose first request is `height`.
    pub fn at(height: u64) -> Self {
        Self {
            next_height: height,
            last: None,
        }
    }

    /// Cursor positioned right after `block`.
    pub fn after(block: BlockRef) -> Self {
        Self {
            next_height: block.height.saturating_add(1),
            last: Some(block),
        }
    }

    pub fn next_height(&self) -> u64 {
        self.next_height
    }

    pub fn last(&self) -> Option<&BlockRef> {
        self.last.as_ref()
    }

    /// Accept `block` as the block returned for the current request.
    ///
    /// Returns the number of heights skipped over, which is zero unless the
    /// source answered with a later block than was asked for.
    pub fn advance(&mut self, block: BlockRef) -> Result<u64, FollowError> {
        if block.height < self.next_height {
            return Err(FollowError::HeightRegression {
                expected: self.next_height,
                got: block.height,
            });
        }
        let skipped = block.height - self.next_height;
        self.next_height = block.height.saturating_add(1);
        self.last = Some(block);
        Ok(skipped)
    }
}
