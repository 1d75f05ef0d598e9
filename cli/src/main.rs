//! chaingate CLI — query a JSON-RPC node with normalized values from the terminal.
//!
//! # Commands
//! ```text
//! chaingate chain-id      --url <url>
//! chaingate block-number  --url <url>
//! chaingate balance       --address <addr> [--block latest]
//! chaingate call          --method eth_getBlockByNumber --params '["latest", false]'
//! chaingate batch         --methods eth_chainId,eth_blockNumber,eth_gasPrice
//! chaingate units         --to-wire 1.5 [--scale 18]
//! chaingate units         --from-wire 0x14d1120d7b160000 [--scale 18]
//! ```

mod logging;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use chaingate_core::config::DEFAULT_NATIVE_SCALE;
use chaingate_core::{units, BlockTag, ChainClient, GatewayConfig, RpcCall};

use logging::{init_tracing, LogConfig};

#[derive(Parser)]
#[command(
    name = "chaingate",
    about = "Query a JSON-RPC node with normalized values",
    long_about = "
ChainGate CLI: JSON-RPC calls with hex quantities rendered as decimals.

ENVIRONMENT VARIABLES:
  CHAINGATE_RPC_URL       RPC endpoint URL (when --url is not given)
  CHAINGATE_NATIVE_SCALE  Decimals of the native currency (default 18)
  CHAINGATE_TOKEN_SCALE   Decimals of token amounts (default 18)
  RUST_LOG                Overrides --log-level
",
    version
)]
struct Cli {
    /// RPC endpoint URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// trace | debug | info | warn | error
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit JSON logs on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the chain id
    #[command(name = "chain-id")]
    ChainId,

    /// Print the head block number
    #[command(name = "block-number")]
    BlockNumber,

    /// Native balance in whole units
    Balance {
        /// Account address
        #[arg(long)]
        address: String,
        /// latest | earliest | pending | safe | finalized | <number>
        #[arg(long, default_value = "latest")]
        block: BlockTag,
    },

    /// Send any JSON-RPC call
    Call {
        /// Method name, e.g. eth_getBlockByNumber
        #[arg(long)]
        method: String,
        /// JSON array of positional params
        #[arg(long, default_value = "[]")]
        params: String,
    },

    /// Send parameterless methods as one batch
    Batch {
        /// Comma-separated method names
        #[arg(long, value_delimiter = ',', required = true)]
        methods: Vec<String>,
    },

    /// Convert amounts offline
    Units {
        /// Decimal amount to encode as base units on the wire
        #[arg(long, conflicts_with = "from_wire", required_unless_present = "from_wire")]
        to_wire: Option<String>,
        /// Wire value to render in whole units
        #[arg(long)]
        from_wire: Option<String>,
        /// Number of decimals
        #[arg(long, default_value_t = DEFAULT_NATIVE_SCALE)]
        scale: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&LogConfig {
        level: cli.log_level.clone(),
        json: cli.json_logs,
        ..Default::default()
    });

    let url = cli.url.as_deref();
    match cli.command {
        Commands::ChainId => print_json(&client(url)?.chain_id().await?),

        Commands::BlockNumber => print_json(&client(url)?.block_number().await?),

        Commands::Balance { address, block } => {
            print_json(&client(url)?.get_balance(&address, block).await?)
        }

        Commands::Call { method, params } => cmd_call(url, &method, &params).await,

        Commands::Batch { methods } => cmd_batch(url, &methods).await,

        Commands::Units { to_wire, from_wire, scale } => {
            cmd_units(to_wire.as_deref(), from_wire.as_deref(), scale)
        }
    }
}

fn client(url: Option<&str>) -> Result<ChainClient> {
    let mut config = GatewayConfig::from_env();
    if let Some(url) = url {
        config = config.with_endpoint(url);
    }
    tracing::debug!(endpoint = ?config.endpoint, native_scale = config.native_scale, "connecting");
    let dispatcher = chaingate_http::connect(&config).context("building HTTP transport")?;
    Ok(ChainClient::new(Arc::new(dispatcher)))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_call(url: Option<&str>, method: &str, params: &str) -> Result<()> {
    let params: Vec<Value> =
        serde_json::from_str(params).context("--params must be a JSON array")?;
    let client = client(url)?;
    print_json(&client.dispatcher().call(method, params).await?)
}

async fn cmd_batch(url: Option<&str>, methods: &[String]) -> Result<()> {
    let calls: Vec<RpcCall> = methods
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(|m| RpcCall::new(m, vec![]))
        .collect();
    if calls.is_empty() {
        bail!("--methods must name at least one method");
    }

    let client = client(url)?;
    let results = client.dispatcher().batch_call(calls.clone()).await;
    for (call, result) in calls.iter().zip(results) {
        match result {
            Ok(v) => println!("{:<28} {v}", call.method),
            Err(e) => println!("{:<28} error: {e}", call.method),
        }
    }
    Ok(())
}

fn cmd_units(to_wire: Option<&str>, from_wire: Option<&str>, scale: u32) -> Result<()> {
    match (to_wire, from_wire) {
        (Some(value), _) => println!("{}", units::parse_scaled_units(value, scale)?),
        (None, Some(wire)) => println!("{}", units::format_scaled_units(wire, scale)?),
        (None, None) => bail!("one of --to-wire or --from-wire is required"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("chaingate").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flag_is_not_taken_as_a_value() {
        assert!(parse(&["units", "--to-wire", "--scale", "6"]).is_err());
    }

    #[test]
    fn units_requires_exactly_one_direction() {
        assert!(parse(&["units"]).is_err());
        assert!(parse(&["units", "--to-wire", "1", "--from-wire", "0x1"]).is_err());

        let cli = parse(&["units", "--to-wire", "1.5", "--scale", "6"]).unwrap();
        match cli.command {
            Commands::Units { to_wire, scale, .. } => {
                assert_eq!(to_wire.as_deref(), Some("1.5"));
                assert_eq!(scale, 6);
            }
            _ => panic!("expected units"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = parse(&["balance", "--address", "0x01", "--block", "0x10", "--url", "http://node"])
            .unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://node"));
        assert_eq!(cli.log_level, "warn");
        match cli.command {
            Commands::Balance { block, .. } => assert_eq!(block, BlockTag::Number(16)),
            _ => panic!("expected balance"),
        }
    }

    #[test]
    fn batch_splits_methods_on_commas() {
        let cli = parse(&["batch", "--methods", "eth_chainId,eth_blockNumber"]).unwrap();
        match cli.command {
            Commands::Batch { methods } => assert_eq!(methods, ["eth_chainId", "eth_blockNumber"]),
            _ => panic!("expected batch"),
        }
    }
}
