//! `execdata stream-accounts` / `execdata stream-events`: consume pushed streams.

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;

use execdata_core::relay::spawn_events;
use execdata_core::{Follower, ModifiedAccounts};
use execdata_ws::RestEventsClient;

use crate::cmd_follow::{drain, print_accounts, print_events};
use crate::network::resolve_filter;
use crate::{connect, follower_config, start_position, ConnectionArgs, FilterArgs, StartArgs, Transport};

pub async fn accounts(conn: &ConnectionArgs, start: &StartArgs, cancel: CancellationToken) -> Result<()> {
    let clients = connect(conn).await?;
    let config = follower_config(clients.chain.clone(), start, None)?;
    tracing::info!(start = ?config.start, "Streaming modified accounts");

    let extractor = ModifiedAccounts::new(config.chain.address_width);
    let follower = Follower::new(config, clients.access, clients.data)?;
    let (sub, handle) = follower.spawn_streaming(extractor, cancel);
    drain(sub, handle, print_accounts).await
}

#[allow(clippy::too_many_arguments)]
pub async fn events(
    conn: &ConnectionArgs,
    start: &StartArgs,
    filter: &FilterArgs,
    transport: Transport,
    rest_host: Option<&str>,
    json: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let start = start_position(start)?;

    let (sub, handle) = match transport {
        Transport::Grpc => {
            let filter = resolve_filter(&conn.host, &filter.event_types, &filter.contracts, &filter.addresses)?;
            let clients = connect(conn).await?;
            tracing::info!(start = ?start, filter = ?filter, "Subscribing to events over gRPC");
            spawn_events(clients.data, start, filter, cancel)
        }
        Transport::Rest => {
            let Some(rest_host) = rest_host else {
                bail!("--rest-host is required with --transport rest");
            };
            let filter = resolve_filter(rest_host, &filter.event_types, &filter.contracts, &filter.addresses)?;
            tracing::info!(start = ?start, filter = ?filter, host = rest_host, "Subscribing to events over REST");
            spawn_events(RestEventsClient::new(rest_host), start, filter, cancel)
        }
    };

    drain(sub, handle, |block| print_events(block, json)).await
}
