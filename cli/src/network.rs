//! Per-network defaults chosen from the host name.

use anyhow::{bail, Result};
use execdata_core::EventFilter;

pub const MAINNET_FLOW_TOKEN: &str = "A.1654653399040a61.FlowToken";
pub const DEVNET_FLOW_TOKEN: &str = "A.7e60df042a9c0868.FlowToken";
pub const CANARY_FLOW_TOKEN: &str = "A.0ae53cb6e3f42a79.FlowToken";

/// The FlowToken contract of the network `host` belongs to.
pub fn flow_token_contract(host: &str) -> Option<&'static str> {
    let host = host.to_ascii_lowercase();
    if host.contains("mainnet") {
        Some(MAINNET_FLOW_TOKEN)
    } else if host.contains("devnet") || host.contains("testnet") {
        Some(DEVNET_FLOW_TOKEN)
    } else if host.contains("canary") {
        Some(CANARY_FLOW_TOKEN)
    } else {
        None
    }
}

/// Filter from the comma-separated flags, or the network's FlowToken events
/// when no flag is set.
pub fn resolve_filter(host: &str, events: &str, contracts: &str, addresses: &str) -> Result<EventFilter> {
    let filter = EventFilter::from_csv(events, contracts, addresses);
    if !filter.is_empty() {
        return Ok(filter);
    }
    match flow_token_contract(host) {
        Some(contract) => Ok(EventFilter::contract(contract)),
        None => bail!(
            "could not determine FlowToken contract for host '{host}'; pass --event-types, --contracts or --addresses"
        ),
    }
}
