//! JSON messages of the REST `subscribe_events` stream.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer};

use execdata_core::{BlockEvents, Event, Identifier};

use crate::error::WsError;

/// One block of events as sent by the server.
///
/// Keys are snake_case; the PascalCase spelling is accepted too. Numbers may
/// arrive as JSON numbers or as decimal strings.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEventsResponse {
    #[serde(alias = "BlockID", alias = "BlockId")]
    pub block_id: String,
    #[serde(alias = "Height", deserialize_with = "u64_from_number_or_string")]
    pub height: u64,
    #[serde(alias = "Events", default, deserialize_with = "null_as_empty")]
    pub events: Vec<RawRestEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRestEvent {
    #[serde(rename = "type", alias = "Type")]
    pub event_type: String,
    #[serde(alias = "TransactionID", alias = "TransactionId")]
    pub transaction_id: String,
    #[serde(alias = "TransactionIndex", deserialize_with = "u32_from_number_or_string")]
    pub transaction_index: u32,
    #[serde(alias = "EventIndex", deserialize_with = "u32_from_number_or_string")]
    pub event_index: u32,
    /// Base64 of the encoded event value.
    #[serde(alias = "Payload")]
    pub payload: String,
}

impl RawEventsResponse {
    pub fn into_block_events(self) -> Result<BlockEvents, WsError> {
        let block_id: Identifier = self
            .block_id
            .parse()
            .map_err(|e| WsError::Decode(format!("block id: {e}")))?;

        let events = self
            .events
            .into_iter()
            .enumerate()
            .map(|(i, e)| e.into_event().map_err(|reason| WsError::Decode(format!("event {i}: {reason}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BlockEvents {
            height: self.height,
            block_id,
            events,
        })
    }
}

impl RawRestEvent {
    fn into_event(self) -> Result<Event, String> {
        let transaction_id: Identifier = self
            .transaction_id
            .parse()
            .map_err(|e| format!("transaction id: {e}"))?;
        let payload = STANDARD
            .decode(self.payload.as_bytes())
            .map_err(|e| format!("payload base64: {e}"))?;
        Ok(Event {
            event_type: self.event_type,
            transaction_id,
            transaction_index: self.transaction_index,
            event_index: self.event_index,
            payload,
        })
    }
}

/// Parse and convert one text frame.
pub fn parse_message(text: &str) -> Result<BlockEvents, WsError> {
    let raw: RawEventsResponse = serde_json::from_str(text)?;
    raw.into_block_events()
}

// ─── Number helpers ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

fn u64_from_number_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    match NumberOrString::deserialize(d)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn u32_from_number_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let n = u64_from_number_or_string(d)?;
    u32::try_from(n).map_err(serde::de::Error::custom)
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RawRestEvent>, D::Error> {
    Ok(Option::<Vec<RawRestEvent>>::deserialize(d)?.unwrap_or_default())
}
