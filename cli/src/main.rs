//! execdata CLI: follow Flow blocks and print what changed in each.
//!
//! # Commands
//! ```text
//! execdata accounts        --host <addr> [--start-height <n> | --start-block-id <hex>]
//! execdata events          --host <addr> [--event-types <csv>] [--contracts <csv>] [--addresses <csv>]
//! execdata stream-accounts --host <addr> [--start-height <n> | --start-block-id <hex>]
//! execdata stream-events   --host <addr> [--transport grpc|rest] [--rest-host <addr>]
//! execdata info
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use execdata_core::{ChainConfig, FollowerBuilder, FollowerConfig, Identifier, StartPosition};
use execdata_grpc::{AccessClient, ExecutionDataClient, GrpcConfig, DEFAULT_MAX_MESSAGE_SIZE};

mod cmd_follow;
mod cmd_stream;
mod network;

const DEFAULT_HOST: &str = "access-001.devnet49.nodes.onflow.org:9000";

#[derive(Parser)]
#[command(
    name = "execdata",
    about = "Follow Flow execution data: modified accounts and events per block",
    long_about = "
execdata follows sealed Flow blocks through an Access node and prints, per
block, the accounts whose registers were written or the events that match a
filter.

ENVIRONMENT VARIABLES:
  RUST_LOG                  Log filter (default: info)
  EXECDATA_HOST             Access API address
",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll block by block and print the accounts modified in each
    Accounts {
        #[command(flatten)]
        conn: ConnectionArgs,
        #[command(flatten)]
        start: StartArgs,
        #[command(flatten)]
        polling: PollingArgs,
    },

    /// Poll block by block and print the matching events of each
    Events {
        #[command(flatten)]
        conn: ConnectionArgs,
        #[command(flatten)]
        start: StartArgs,
        #[command(flatten)]
        polling: PollingArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Print each block as JSON
        #[arg(long)]
        json: bool,
    },

    /// Consume the pushed execution data stream and print modified accounts
    #[command(name = "stream-accounts")]
    StreamAccounts {
        #[command(flatten)]
        conn: ConnectionArgs,
        #[command(flatten)]
        start: StartArgs,
    },

    /// Subscribe to server-filtered events
    #[command(name = "stream-events")]
    StreamEvents {
        #[command(flatten)]
        conn: ConnectionArgs,
        #[command(flatten)]
        start: StartArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Which API to subscribe through
        #[arg(long, value_enum, default_value_t = Transport::Grpc)]
        transport: Transport,
        /// REST API address, required with `--transport rest`
        #[arg(long)]
        rest_host: Option<String>,
        /// Print each block as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the network and latest sealed block of an Access node
    Info {
        #[command(flatten)]
        conn: ConnectionArgs,
    },
}

#[derive(Args, Clone)]
pub struct ConnectionArgs {
    /// Access API address (headers and network parameters)
    #[arg(long, env = "EXECDATA_HOST", default_value = DEFAULT_HOST)]
    pub host: String,
    /// Execution Data API address (default: same as --host)
    #[arg(long)]
    pub execution_data_host: Option<String>,
    /// Largest gRPC response accepted, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    pub max_message_size: usize,
}

#[derive(Args, Clone)]
pub struct StartArgs {
    /// First block height to follow (inclusive)
    #[arg(long, default_value_t = 0)]
    pub start_height: u64,
    /// First block id to follow (inclusive, hex)
    #[arg(long, conflicts_with = "start_height")]
    pub start_block_id: Option<String>,
}

#[derive(Args, Clone)]
pub struct PollingArgs {
    /// Wait between header requests while the next block is not sealed
    #[arg(long, default_value_t = 500)]
    pub header_poll_ms: u64,
    /// Wait between execution data requests while it is not published
    #[arg(long, default_value_t = 500)]
    pub execution_data_poll_ms: u64,
    /// Pause after each delivered block
    #[arg(long)]
    pub block_interval_ms: Option<u64>,
}

#[derive(Args, Clone)]
pub struct FilterArgs {
    /// Comma-separated event types
    #[arg(long, default_value = "")]
    pub event_types: String,
    /// Comma-separated contracts, e.g. A.1654653399040a61.FlowToken
    #[arg(long, default_value = "")]
    pub contracts: String,
    /// Comma-separated account addresses
    #[arg(long, default_value = "")]
    pub addresses: String,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    Grpc,
    Rest,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cancel = cancel_on_ctrl_c();

    match cli.command {
        Commands::Accounts { conn, start, polling } => cmd_follow::accounts(&conn, &start, &polling, cancel).await,

        Commands::Events {
            conn,
            start,
            polling,
            filter,
            json,
        } => cmd_follow::events(&conn, &start, &polling, &filter, json, cancel).await,

        Commands::StreamAccounts { conn, start } => cmd_stream::accounts(&conn, &start, cancel).await,

        Commands::StreamEvents {
            conn,
            start,
            filter,
            transport,
            rest_host,
            json,
        } => cmd_stream::events(&conn, &start, &filter, transport, rest_host.as_deref(), json, cancel).await,

        Commands::Info { conn } => cmd_info(&conn).await,
    }
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, shutting down");
            token.cancel();
        }
    });
    cancel
}

// ─── Shared setup ─────────────────────────────────────────────────────────────

/// Connected clients for the Access API and the Execution Data API.
pub struct Clients {
    pub access: AccessClient,
    pub data: ExecutionDataClient,
    pub chain: ChainConfig,
}

pub async fn connect(conn: &ConnectionArgs) -> Result<Clients> {
    let access_config = GrpcConfig::new(&conn.host).with_max_message_size(conn.max_message_size);
    let access = AccessClient::connect(&access_config)
        .await
        .with_context(|| format!("connect to access API at {}", conn.host))?;

    let data = match &conn.execution_data_host {
        Some(host) => {
            let config = GrpcConfig::new(host).with_max_message_size(conn.max_message_size);
            ExecutionDataClient::connect(&config)
                .await
                .with_context(|| format!("connect to execution data API at {host}"))?
        }
        None => ExecutionDataClient::connect(&access_config)
            .await
            .with_context(|| format!("connect to execution data API at {}", conn.host))?,
    };

    let chain_id = access.chain_id().await.context("get network parameters")?;
    tracing::info!(chain_id = %chain_id, host = %conn.host, "Connected");

    Ok(Clients {
        access,
        data,
        chain: ChainConfig::from_chain_id(chain_id),
    })
}

pub fn start_position(start: &StartArgs) -> Result<StartPosition> {
    let id = parse_block_id(start.start_block_id.as_deref())?;
    Ok(StartPosition::from_options(id, start.start_height)?)
}

pub fn follower_config(chain: ChainConfig, start: &StartArgs, polling: Option<&PollingArgs>) -> Result<FollowerConfig> {
    let mut builder = FollowerBuilder::new().chain(chain).start_height(start.start_height);
    if let Some(id) = parse_block_id(start.start_block_id.as_deref())? {
        builder = builder.start_block_id(id);
    }
    if let Some(polling) = polling {
        builder = builder
            .header_poll_interval_ms(polling.header_poll_ms)
            .execution_data_poll_interval_ms(polling.execution_data_poll_ms);
        if let Some(ms) = polling.block_interval_ms {
            builder = builder.block_interval_ms(ms);
        }
    }
    Ok(builder.build()?)
}

fn parse_block_id(hex: Option<&str>) -> Result<Option<Identifier>> {
    hex.map(|s| s.parse::<Identifier>().with_context(|| format!("invalid block id '{s}'")))
        .transpose()
}

// ─── Command implementations ─────────────────────────────────────────────────

async fn cmd_info(conn: &ConnectionArgs) -> Result<()> {
    use execdata_core::HeaderSource;

    let clients = connect(conn).await?;
    let latest = clients
        .access
        .latest_sealed_header()
        .await
        .context("get latest sealed block header")?;

    println!("execdata v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Access API:    {}", conn.host);
    println!("Data API:      {}", conn.execution_data_host.as_deref().unwrap_or(&conn.host));
    println!("Chain:         {}", clients.chain.chain_id);
    println!("Address width: {} bytes", clients.chain.address_width);
    println!("Latest sealed: {} ({})", latest.height, latest.id);
    if let Some(contract) = network::flow_token_contract(&conn.host) {
        println!("FlowToken:     {contract}");
    }
    Ok(())
}
