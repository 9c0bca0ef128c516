//! Modified-account extraction from trie updates.

use std::collections::HashSet;

use crate::error::ExtractError;
use crate::types::{Address, TrieUpdate};

/// Collect the set of accounts owning any register written by `updates`.
///
/// Key-part 0 of every payload is the owner; the address is its trailing
/// `address_width` bytes. The result is a set, its iteration order is not
/// stable.
pub fn extract_accounts<'a, I>(updates: I, address_width: usize) -> Result<HashSet<Address>, ExtractError>
where
    I: IntoIterator<Item = &'a TrieUpdate>,
{
    let mut accounts = HashSet::new();
    let mut index = 0usize;

    for update in updates {
        for payload in &update.payloads {
            let owner = payload.key.owner().ok_or_else(|| ExtractError::MalformedKey {
                payload: index,
                reason: "key has no key parts".into(),
            })?;
            let address = Address::from_owner(owner, address_width).ok_or_else(|| {
                ExtractError::MalformedKey {
                    payload: index,
                    reason: format!(
                        "owner is {} bytes, address width is {address_width}",
                        owner.len()
                    ),
                }
            })?;
            accounts.insert(address);
            index += 1;
        }
    }

    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KeyPart, LedgerKey, Payload};

    fn payload(owner: &[u8]) -> Payload {
        Payload {
            key: LedgerKey::new(vec![
                KeyPart { kind: 0, value: owner.to_vec() },
                KeyPart { kind: 2, value: b"storage".to_vec() },
            ]),
            value: vec![],
        }
    }

    fn update(payloads: Vec<Payload>) -> TrieUpdate {
        TrieUpdate {
            root_hash: [0; 32],
            paths: vec![],
            payloads,
        }
    }

    #[test]
    fn deduplicates_across_updates() {
        let a = [0xaa; 8];
        let b = [0xbb; 8];
        let updates = vec![
            update(vec![payload(&a), payload(&b)]),
            update(vec![payload(&a)]),
        ];
        let accounts = extract_accounts(&updates, 8).unwrap();
        let expected: HashSet<_> = [a, b]
            .iter()
            .map(|o| Address::from_owner(o, 8).unwrap())
            .collect();
        assert_eq!(accounts, expected);
    }

    #[test]
    fn no_updates_yields_empty_set() {
        assert!(extract_accounts(&[], 8).unwrap().is_empty());
    }

    #[test]
    fn key_without_parts_is_rejected() {
        let updates = vec![update(vec![
            payload(&[1; 8]),
            Payload { key: LedgerKey::default(), value: vec![] },
        ])];
        let err = extract_accounts(&updates, 8).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedKey { payload: 1, .. }));
    }

    #[test]
    fn short_owner_is_rejected() {
        let updates = vec![update(vec![payload(&[1; 3])])];
        assert!(matches!(
            extract_accounts(&updates, 8),
            Err(ExtractError::MalformedKey { payload: 0, .. })
        ));
    }
}
