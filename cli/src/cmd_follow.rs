//! `execdata accounts` / `execdata events`: follow blocks by polling.
//!
//! Both commands run a [`Follower`] against the Access and Execution Data
//! APIs and print each delivered block until Ctrl-C or a terminal error.

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use execdata_core::{BlockAccounts, BlockEvents, Follower, Subscription};

use crate::network::resolve_filter;
use crate::{connect, follower_config, ConnectionArgs, FilterArgs, PollingArgs, StartArgs};

// ─── Entry points ────────────────────────────────────────────────────────────

pub async fn accounts(
    conn: &ConnectionArgs,
    start: &StartArgs,
    polling: &PollingArgs,
    cancel: CancellationToken,
) -> Result<()> {
    let clients = connect(conn).await?;
    let config = follower_config(clients.chain.clone(), start, Some(polling))?;
    tracing::info!(start = ?config.start, chain_id = %config.chain.chain_id, "Following modified accounts");

    let follower = Follower::new(config, clients.access, clients.data)?;
    let (sub, handle) = follower.spawn_accounts(cancel);
    drain(sub, handle, print_accounts).await
}

pub async fn events(
    conn: &ConnectionArgs,
    start: &StartArgs,
    polling: &PollingArgs,
    filter: &FilterArgs,
    json: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let filter = resolve_filter(&conn.host, &filter.event_types, &filter.contracts, &filter.addresses)?;
    let clients = connect(conn).await?;
    let config = follower_config(clients.chain.clone(), start, Some(polling))?;
    tracing::info!(start = ?config.start, filter = ?filter, "Following events");

    let follower = Follower::new(config, clients.access, clients.data)?;
    let (sub, handle) = follower.spawn_events(filter, cancel);
    drain(sub, handle, |block| print_events(block, json)).await
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// Print every delivered value, wait for the task, then surface its error.
pub async fn drain<T>(
    mut sub: Subscription<T>,
    handle: JoinHandle<()>,
    mut print: impl FnMut(T) -> Result<()>,
) -> Result<()> {
    while let Some(value) = sub.receive().await {
        print(value)?;
    }
    handle.await.context("follow task panicked")?;

    if let Some(err) = sub.error() {
        bail!("{err}");
    }
    Ok(())
}

pub fn print_accounts(block: BlockAccounts) -> Result<()> {
    let mut accounts: Vec<String> = block.accounts.iter().map(|a| a.to_hex()).collect();
    accounts.sort();

    println!("block {} {}: {} accounts", block.block.height, block.block.id, accounts.len());
    for account in accounts {
        println!("  0x{account}");
    }
    Ok(())
}

pub fn print_events(block: BlockEvents, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&block)?);
        return Ok(());
    }

    println!("block {} {}: {} events", block.height, block.block_id, block.events.len());
    for event in &block.events {
        println!(
            "  {} (tx {} #{}, event #{})",
            event.event_type, event.transaction_id, event.transaction_index, event.event_index
        );
    }
    Ok(())
}
