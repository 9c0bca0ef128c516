//! Event filter and subscription start position.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{Event, Identifier};

/// Hex digits in a normalised account address.
const ADDRESS_HEX_LEN: usize = 16;

// ─── StartPosition ────────────────────────────────────────────────────────────

/// Where a follower or stream begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPosition {
    /// The block after the latest sealed block.
    #[default]
    Latest,
    /// The block at this height (inclusive).
    Height(u64),
    /// The block with this id (inclusive).
    BlockId(Identifier),
}

impl StartPosition {
    /// Build from the pair of optional start options a caller may supply.
    ///
    /// A zero id and a zero height mean "unset". Setting both is an error.
    pub fn from_options(start_block_id: Option<Identifier>, start_height: u64) -> Result<Self, ConfigError> {
        let block_id = start_block_id.filter(|id| !id.is_zero());
        match (block_id, start_height) {
            (Some(_), h) if h > 0 => Err(ConfigError::ConflictingStart),
            (Some(id), _) => Ok(Self::BlockId(id)),
            (None, 0) => Ok(Self::Latest),
            (None, h) => Ok(Self::Height(h)),
        }
    }

    /// `(start_block_id, start_height)` with zero values for unset fields, as
    /// request messages expect them.
    pub fn to_options(&self) -> (Identifier, u64) {
        match *self {
            Self::Latest => (Identifier::ZERO, 0),
            Self::Height(h) => (Identifier::ZERO, h),
            Self::BlockId(id) => (id, 0),
        }
    }
}

// ─── EventFilter ──────────────────────────────────────────────────────────────

/// Which events a subscription should carry.
///
/// An empty list on any axis places no restriction on that axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Fully qualified event types, e.g. `A.1654653399040a61.FlowToken.TokensDeposited`.
    #[serde(default)]
    pub event_types: Vec<String>,
    /// Contract identifiers, e.g. `A.1654653399040a61.FlowToken`.
    #[serde(default)]
    pub contracts: Vec<String>,
    /// Account addresses (hex, with or without `0x`).
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl EventFilter {
    pub fn new(
        event_types: impl IntoIterator<Item = impl Into<String>>,
        contracts: impl IntoIterator<Item = impl Into<String>>,
        addresses: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            event_types: event_types.into_iter().map(Into::into).collect(),
            contracts: contracts.into_iter().map(Into::into).collect(),
            addresses: addresses.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from comma-separated lists. An empty string yields an empty list.
    pub fn from_csv(events: &str, contracts: &str, addresses: &str) -> Self {
        Self {
            event_types: split_csv(events),
            contracts: split_csv(contracts),
            addresses: split_csv(addresses),
        }
    }

    /// Filter on a single contract.
    pub fn contract(contract: impl Into<String>) -> Self {
        Self {
            contracts: vec![contract.into()],
            ..Default::default()
        }
    }

    /// Returns `true` if no axis is restricted.
    pub fn is_empty(&self) -> bool {
        self.event_types.is_empty() && self.contracts.is_empty() && self.addresses.is_empty()
    }

    /// Query parameters for the REST subscribe endpoint, in a stable order.
    pub fn query_pairs(&self, start: &StartPosition) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        match start {
            StartPosition::Latest => {}
            StartPosition::BlockId(id) => pairs.push(("start_block_id", id.to_string())),
            StartPosition::Height(h) => pairs.push(("height", h.to_string())),
        }
        if !self.event_types.is_empty() {
            pairs.push(("event_types", self.event_types.join(",")));
        }
        if !self.addresses.is_empty() {
            pairs.push(("addresses", self.addresses.join(",")));
        }
        if !self.contracts.is_empty() {
            pairs.push(("contracts", self.contracts.join(",")));
        }
        pairs
    }

    /// Client-side match: the event must satisfy every non-empty axis.
    pub fn matches(&self, event: &Event) -> bool {
        let ty = event.event_type.as_str();

        if !self.event_types.is_empty() && !self.event_types.iter().any(|t| t == ty) {
            return false;
        }

        if !self.contracts.is_empty() {
            let contract = contract_of(ty);
            if !self.contracts.iter().any(|c| Some(c.as_str()) == contract) {
                return false;
            }
        }

        if !self.addresses.is_empty() {
            let Some(address) = address_of(ty).map(normalize_address) else {
                return false;
            };
            if !self.addresses.iter().any(|a| normalize_address(a) == address) {
                return false;
            }
        }

        true
    }
}

fn split_csv(s: &str) -> Vec<String> {
    if s.is_empty() {
        return vec![];
    }
    s.split(',').map(str::to_string).collect()
}

/// `A.<address>.<Contract>` for an account event type, `None` for protocol events.
fn contract_of(event_type: &str) -> Option<&str> {
    let mut parts = event_type.splitn(4, '.');
    let (kind, address, contract) = (parts.next()?, parts.next()?, parts.next()?);
    if kind != "A" {
        return None;
    }
    Some(&event_type[..kind.len() + address.len() + contract.len() + 2])
}

fn address_of(event_type: &str) -> Option<&str> {
    let mut parts = event_type.split('.');
    match (parts.next(), parts.next()) {
        (Some("A"), Some(address)) => Some(address),
        _ => None,
    }
}

fn normalize_address(address: &str) -> String {
    let hex = address.strip_prefix("0x").unwrap_or(address).to_ascii_lowercase();
    format!("{:0>width$}", hex, width = ADDRESS_HEX_LEN)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
