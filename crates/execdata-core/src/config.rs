//! Follower configuration and fluent builder.
//!
//! # Example
//!
//! ```rust
//! use execdata_core::config::{ChainConfig, FollowerBuilder};
//!
//! let config = FollowerBuilder::new()
//!     .chain(ChainConfig::from_chain_id("flow-testnet"))
//!     .start_height(50_000_000)
//!     .header_poll_interval_ms(500)
//!     .block_interval_ms(800)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.chain.address_width, 8);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::filter::StartPosition;
use crate::subscription::DEFAULT_CAPACITY;
use crate::types::Identifier;

/// Width of a Flow account address in bytes.
pub const FLOW_ADDRESS_WIDTH: usize = 8;

// ─── ChainConfig ──────────────────────────────────────────────────────────────

/// Per-chain constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain identifier as reported by the network, e.g. `"flow-mainnet"`.
    pub chain_id: String,
    /// Account address width in bytes.
    pub address_width: usize,
}

impl ChainConfig {
    /// Config for a Flow network identified by `chain_id`.
    pub fn from_chain_id(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            address_width: FLOW_ADDRESS_WIDTH,
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::from_chain_id("flow-mainnet")
    }
}

// ─── FollowerConfig ───────────────────────────────────────────────────────────

/// Configuration for a [`crate::follower::Follower`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerConfig {
    /// Where to begin following.
    pub start: StartPosition,
    /// Wait between header requests while the next block is not sealed (ms).
    pub header_poll_interval_ms: u64,
    /// Wait between execution data requests while it is not published (ms).
    pub execution_data_poll_interval_ms: u64,
    /// Optional pause after each delivered block (ms).
    pub block_interval_ms: Option<u64>,
    /// Values buffered between the follower and its consumer.
    pub channel_capacity: usize,
    pub chain: ChainConfig,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            start: StartPosition::Latest,
            header_poll_interval_ms: 500,
            execution_data_poll_interval_ms: 500,
            block_interval_ms: None,
            channel_capacity: DEFAULT_CAPACITY,
            chain: ChainConfig::default(),
        }
    }
}

impl FollowerConfig {
    /// Check the config for values the follower cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.header_poll_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval { name: "header_poll_interval_ms" });
        }
        if self.execution_data_poll_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval { name: "execution_data_poll_interval_ms" });
        }
        if self.block_interval_ms == Some(0) {
            return Err(ConfigError::ZeroInterval { name: "block_interval_ms" });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.chain.address_width == 0 {
            return Err(ConfigError::ZeroAddressWidth);
        }
        Ok(())
    }

    pub fn header_poll_interval(&self) -> Duration {
        Duration::from_millis(self.header_poll_interval_ms)
    }

    pub fn execution_data_poll_interval(&self) -> Duration {
        Duration::from_millis(self.execution_data_poll_interval_ms)
    }

    pub fn block_interval(&self) -> Option<Duration> {
        self.block_interval_ms.map(Duration::from_millis)
    }
}

// ─── FollowerBuilder ──────────────────────────────────────────────────────────

/// Fluent builder for [`FollowerConfig`].
#[derive(Debug, Default)]
pub struct FollowerBuilder {
    config: FollowerConfig,
    start_block_id: Option<Identifier>,
    start_height: u64,
}

impl FollowerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(mut self, chain: ChainConfig) -> Self {
        self.config.chain = chain;
        self
    }

    /// Start at this block id (inclusive). Conflicts with [`Self::start_height`].
    pub fn start_block_id(mut self, id: Identifier) -> Self {
        self.start_block_id = Some(id);
        self
    }

    /// Start at this height (inclusive). Conflicts with [`Self::start_block_id`].
    pub fn start_height(mut self, height: u64) -> Self {
        self.start_height = height;
        self
    }

    pub fn header_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.header_poll_interval_ms = ms;
        self
    }

    pub fn execution_data_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.execution_data_poll_interval_ms = ms;
        self
    }

    /// Pause between delivered blocks.
    pub fn block_interval_ms(mut self, ms: u64) -> Self {
        self.config.block_interval_ms = Some(ms);
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// Resolve the start position and validate.
    pub fn build(self) -> Result<FollowerConfig, ConfigError> {
        let mut config = self.config;
        config.start = StartPosition::from_options(self.start_block_id, self.start_height)?;
        config.validate()?;
        Ok(config)
    }
}
