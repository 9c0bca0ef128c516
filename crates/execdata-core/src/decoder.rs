//! Raw execution data → structured chunks.
//!
//! Conversion is all-or-nothing: the first malformed chunk fails the whole
//! block and its index is reported in [`DecodeError::Chunk`].

use prost::Message;

use crate::error::DecodeError;
use crate::raw::{RawBlockExecutionData, RawChunkExecutionData, RawEvent, RawPayload, RawTrieUpdate};
use crate::types::{
    BlockExecutionData, ChunkExecutionData, Event, Identifier, KeyPart, LedgerKey, Payload,
    TrieUpdate,
};

const HASH_LEN: usize = 32;

/// Convert a raw block execution data message.
///
/// `None` (an absent message in the response) fails with [`DecodeError::EmptyMessage`].
pub fn decode(raw: Option<RawBlockExecutionData>) -> Result<BlockExecutionData, DecodeError> {
    let raw = raw.ok_or(DecodeError::EmptyMessage)?;

    let block_id = if raw.block_id.is_empty() {
        Identifier::ZERO
    } else {
        Identifier::from_slice(&raw.block_id).map_err(|e| DecodeError::BlockId(e.to_string()))?
    };

    let chunks = raw
        .chunk_execution_data
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            decode_chunk(chunk).map_err(|reason| DecodeError::Chunk { index, reason })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BlockExecutionData { block_id, chunks })
}

/// Decode the protobuf encoding of a block execution data message, then convert it.
pub fn decode_bytes(bytes: &[u8]) -> Result<BlockExecutionData, DecodeError> {
    let raw =
        RawBlockExecutionData::decode(bytes).map_err(|e| DecodeError::Protobuf(e.to_string()))?;
    decode(Some(raw))
}

/// Convert raw events. Shared with the streaming transports, which receive
/// events outside of a chunk.
pub fn decode_events(raw: Vec<RawEvent>) -> Result<Vec<Event>, String> {
    raw.into_iter()
        .enumerate()
        .map(|(i, e)| decode_event(e).map_err(|reason| format!("event {i}: {reason}")))
        .collect()
}

fn decode_chunk(raw: RawChunkExecutionData) -> Result<ChunkExecutionData, String> {
    let events = decode_events(raw.events)?;
    let trie_update = raw.trie_update.map(decode_trie_update).transpose()?;
    Ok(ChunkExecutionData { events, trie_update })
}

fn decode_event(raw: RawEvent) -> Result<Event, String> {
    let transaction_id = Identifier::from_slice(&raw.transaction_id)
        .map_err(|e| format!("transaction id: {e}"))?;
    Ok(Event {
        event_type: raw.r#type,
        transaction_id,
        transaction_index: raw.transaction_index,
        event_index: raw.event_index,
        payload: raw.payload,
    })
}

fn decode_trie_update(raw: RawTrieUpdate) -> Result<TrieUpdate, String> {
    let root_hash = to_hash(&raw.root_hash).map_err(|e| format!("root hash: {e}"))?;

    if !raw.paths.is_empty() && raw.paths.len() != raw.payloads.len() {
        return Err(format!(
            "trie update has {} paths but {} payloads",
            raw.paths.len(),
            raw.payloads.len()
        ));
    }

    let paths = raw
        .paths
        .iter()
        .enumerate()
        .map(|(i, p)| to_hash(p).map_err(|e| format!("path {i}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    let payloads = raw
        .payloads
        .into_iter()
        .enumerate()
        .map(|(i, p)| decode_payload(p).map_err(|e| format!("payload {i}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TrieUpdate {
        root_hash,
        paths,
        payloads,
    })
}

fn decode_payload(raw: RawPayload) -> Result<Payload, String> {
    if raw.key_part.is_empty() {
        return Err("key has no key parts".into());
    }
    let parts = raw
        .key_part
        .into_iter()
        .map(|kp| {
            let kind = u16::try_from(kp.r#type)
                .map_err(|_| format!("key part type {} overflows u16", kp.r#type))?;
            Ok(KeyPart {
                kind,
                value: kp.value,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    Ok(Payload {
        key: LedgerKey::new(parts),
        value: raw.value,
    })
}

fn to_hash(bytes: &[u8]) -> Result<[u8; HASH_LEN], String> {
    bytes
        .try_into()
        .map_err(|_| format!("expected {HASH_LEN} bytes, got {}", bytes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawKeyPart;

    fn payload(owner: &[u8]) -> RawPayload {
        RawPayload {
            key_part: vec![
                RawKeyPart { r#type: 0, value: owner.to_vec() },
                RawKeyPart { r#type: 2, value: b"balance".to_vec() },
            ],
            value: vec![1, 2, 3],
        }
    }

    fn update(payloads: Vec<RawPayload>) -> RawTrieUpdate {
        RawTrieUpdate {
            root_hash: vec![7; 32],
            paths: payloads.iter().map(|_| vec![9; 32]).collect(),
            payloads,
        }
    }

    fn event(tx_index: u32) -> RawEvent {
        RawEvent {
            r#type: "A.0000000000000001.Foo.Bar".into(),
            transaction_id: vec![tx_index as u8; 32],
            transaction_index: tx_index,
            event_index: 0,
            payload: b"{}".to_vec(),
        }
    }

    #[test]
    fn empty_message_fails() {
        assert_eq!(decode(None).unwrap_err(), DecodeError::EmptyMessage);
    }

    #[test]
    fn decodes_chunks_with_and_without_updates() {
        let raw = RawBlockExecutionData {
            block_id: vec![1; 32],
            chunk_execution_data: vec![
                RawChunkExecutionData {
                    events: vec![event(0), event(1)],
                    trie_update: Some(update(vec![payload(&[1; 8])])),
                },
                RawChunkExecutionData {
                    events: vec![],
                    trie_update: None,
                },
            ],
        };
        let data = decode(Some(raw)).unwrap();
        assert_eq!(data.block_id, Identifier::new([1; 32]));
        assert_eq!(data.chunks.len(), 2);
        assert_eq!(data.chunks[0].events.len(), 2);
        assert_eq!(data.chunks[0].events[1].transaction_index, 1);
        let update = data.chunks[0].trie_update.as_ref().unwrap();
        assert_eq!(update.payloads[0].key.owner(), Some(&[1u8; 8][..]));
        assert_eq!(update.payloads[0].key.parts[1].kind, 2);
        assert!(data.chunks[1].trie_update.is_none());
    }

    #[test]
    fn malformed_chunk_reports_index() {
        let mut bad = update(vec![payload(&[1; 8])]);
        bad.payloads[0].key_part.clear();
        let raw = RawBlockExecutionData {
            block_id: vec![],
            chunk_execution_data: vec![
                RawChunkExecutionData { events: vec![], trie_update: Some(update(vec![])) },
                RawChunkExecutionData { events: vec![], trie_update: Some(bad) },
            ],
        };
        match decode(Some(raw)).unwrap_err() {
            DecodeError::Chunk { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("no key parts"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_root_hash_and_path_mismatch() {
        let mut short_root = update(vec![]);
        short_root.root_hash = vec![1; 4];
        let raw = RawBlockExecutionData {
            block_id: vec![],
            chunk_execution_data: vec![RawChunkExecutionData {
                events: vec![],
                trie_update: Some(short_root),
            }],
        };
        assert!(matches!(decode(Some(raw)), Err(DecodeError::Chunk { index: 0, .. })));

        let mut mismatch = update(vec![payload(&[1; 8]), payload(&[2; 8])]);
        mismatch.paths.pop();
        let raw = RawBlockExecutionData {
            block_id: vec![],
            chunk_execution_data: vec![RawChunkExecutionData {
                events: vec![],
                trie_update: Some(mismatch),
            }],
        };
        assert!(matches!(decode(Some(raw)), Err(DecodeError::Chunk { index: 0, .. })));
    }

    #[test]
    fn rejects_wide_key_part_type() {
        let mut p = payload(&[1; 8]);
        p.key_part[1].r#type = u32::from(u16::MAX) + 1;
        let raw = RawBlockExecutionData {
            block_id: vec![],
            chunk_execution_data: vec![RawChunkExecutionData {
                events: vec![],
                trie_update: Some(update(vec![p])),
            }],
        };
        assert!(matches!(decode(Some(raw)), Err(DecodeError::Chunk { index: 0, .. })));
    }

    #[test]
    fn rejects_short_transaction_id() {
        let mut e = event(0);
        e.transaction_id.truncate(4);
        let raw = RawBlockExecutionData {
            block_id: vec![],
            chunk_execution_data: vec![RawChunkExecutionData { events: vec![e], trie_update: None }],
        };
        assert!(matches!(decode(Some(raw)), Err(DecodeError::Chunk { index: 0, .. })));
    }

    #[test]
    fn decode_bytes_reads_protobuf() {
        let raw = RawBlockExecutionData {
            block_id: vec![3; 32],
            chunk_execution_data: vec![RawChunkExecutionData {
                events: vec![event(4)],
                trie_update: Some(update(vec![payload(&[5; 8])])),
            }],
        };
        let data = decode_bytes(&raw.encode_to_vec()).unwrap();
        assert_eq!(data.block_id, Identifier::new([3; 32]));
        assert_eq!(data.events().next().unwrap().transaction_index, 4);

        assert!(matches!(decode_bytes(&[0xff, 0xff]), Err(DecodeError::Protobuf(_))));
    }
}
