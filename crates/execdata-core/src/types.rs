//! Shared types: identifiers, addresses, blocks, events and decoded execution data.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ─── Identifier ───────────────────────────────────────────────────────────────

/// Error returned when bytes or a hex string do not form a valid [`Identifier`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier must be {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("invalid hex in identifier: {0}")]
    Hex(String),
}

/// A 32-byte block or transaction identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Identifier([u8; Identifier::LEN]);

impl Identifier {
    /// Identifier width in bytes.
    pub const LEN: usize = 32;

    /// The all-zero identifier, used as "unset".
    pub const ZERO: Identifier = Identifier([0u8; Identifier::LEN]);

    pub const fn new(bytes: [u8; Identifier::LEN]) -> Self {
        Self(bytes)
    }

    /// Build an identifier from a byte slice of exactly [`Identifier::LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentifierError> {
        let arr: [u8; Identifier::LEN] =
            bytes.try_into().map_err(|_| IdentifierError::Length {
                expected: Identifier::LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; Identifier::LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| IdentifierError::Hex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({self})")
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─── Address ──────────────────────────────────────────────────────────────────

/// An account address. Its width is fixed per chain (see [`crate::config::ChainConfig`]).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(Vec<u8>);

impl Address {
    /// Derive an address from a register owner.
    ///
    /// Uses the trailing `width` bytes of `owner`. Returns `None` when the
    /// owner is shorter than `width`.
    pub fn from_owner(owner: &[u8], width: usize) -> Option<Self> {
        if width == 0 || owner.len() < width {
            return None;
        }
        Some(Self(owner[owner.len() - width..].to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex without the `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// ─── BlockRef ─────────────────────────────────────────────────────────────────

/// A sealed block as reported by the header service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRef {
    pub height: u64,
    pub id: Identifier,
}

impl BlockRef {
    pub fn new(height: u64, id: Identifier) -> Self {
        Self { height, id }
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.height, self.id)
    }
}

// ─── Events ───────────────────────────────────────────────────────────────────

/// An event emitted during transaction execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Fully qualified event type, e.g. `A.1654653399040a61.FlowToken.TokensDeposited`.
    pub event_type: String,
    pub transaction_id: Identifier,
    pub transaction_index: u32,
    pub event_index: u32,
    /// Encoded event payload (opaque to this crate).
    pub payload: Vec<u8>,
}

/// Events of one block, in the order the source delivered them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockEvents {
    pub height: u64,
    pub block_id: Identifier,
    pub events: Vec<Event>,
}

/// Accounts whose registers were written while executing one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockAccounts {
    pub block: BlockRef,
    /// Iteration order is unspecified.
    pub accounts: HashSet<Address>,
}

// ─── Ledger / trie updates ────────────────────────────────────────────────────

/// One component of a register key. Part 0 is the owning account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPart {
    pub kind: u16,
    pub value: Vec<u8>,
}

/// A structured register key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerKey {
    pub parts: Vec<KeyPart>,
}

impl LedgerKey {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self { parts }
    }

    /// The owner key-part, if the key has any parts.
    pub fn owner(&self) -> Option<&[u8]> {
        self.parts.first().map(|p| p.value.as_slice())
    }
}

/// A register write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub key: LedgerKey,
    pub value: Vec<u8>,
}

/// Key/value diff written to state storage by a single chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieUpdate {
    pub root_hash: [u8; 32],
    pub paths: Vec<[u8; 32]>,
    pub payloads: Vec<Payload>,
}

/// Execution output of one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkExecutionData {
    pub events: Vec<Event>,
    /// `None` when the chunk wrote no registers.
    pub trie_update: Option<TrieUpdate>,
}

/// Execution output of a whole block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockExecutionData {
    pub block_id: Identifier,
    pub chunks: Vec<ChunkExecutionData>,
}

impl BlockExecutionData {
    /// Present trie updates, in chunk order.
    pub fn trie_updates(&self) -> impl Iterator<Item = &TrieUpdate> {
        self.chunks.iter().filter_map(|c| c.trie_update.as_ref())
    }

    /// All events, in chunk order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.chunks.iter().flat_map(|c| c.events.iter())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
