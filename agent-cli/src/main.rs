mod config;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use agent_sdk::{
    install_idl, AgentClient, AgentRecord, AgentRegistryIdl, RegisterOptions, RpcProgramProvider,
    SolanaAdapter, UpdateOptions, DEFAULT_AGENT_LIMIT,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use solana_sdk::{pubkey::Pubkey, signer::Signer};
use tracing_subscriber::EnvFilter;

const MIN_BALANCE_LAMPORTS: u64 = 1_000_000;

#[derive(Parser)]
#[command(name = "agent-cli", version, about = "Manage agents in the on-chain registry")]
struct Cli {
    /// JSON keypair file (overrides WALLET_KEYPAIR_PATH)
    #[arg(long, global = true)]
    keypair: Option<PathBuf>,

    /// Print records as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register the wallet as an agent
    Register {
        #[arg(long)]
        capabilities: u64,
        #[arg(long)]
        metadata_uri: String,
    },
    /// Update the wallet's agent; omitted fields stay unchanged
    Update {
        #[arg(long)]
        capabilities: Option<u64>,
        #[arg(long)]
        metadata_uri: Option<String>,
    },
    /// Show one agent (defaults to the wallet's own)
    Get {
        #[arg(long)]
        owner: Option<String>,
    },
    /// List registered agents
    List {
        #[arg(long, default_value_t = DEFAULT_AGENT_LIMIT)]
        limit: usize,
    },
    /// Show the wallet's SOL balance
    Balance,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.keypair.clone())?;

    if let Some(idl_path) = &config.idl_path {
        let idl = AgentRegistryIdl::from_file(idl_path)?;
        tracing::info!(path = %idl_path.display(), version = %idl.version, "using custom IDL");
        install_idl(idl)?;
    }

    let rpc = SolanaAdapter::connect(config.client.rpc_url.clone(), config.client.commitment);
    let reader = SolanaAdapter::read_only(Arc::clone(&rpc));
    let mut client = AgentClient::new(Arc::new(RpcProgramProvider::new(rpc)), &config.client)?;

    tracing::info!(
        rpc_url = %config.client.rpc_url,
        program_id = %client.program_id(),
        "agent registry client ready"
    );

    match cli.command {
        Command::Register {
            capabilities,
            metadata_uri,
        } => {
            let wallet = config.load_wallet()?;
            startup_checks(&reader, &wallet.pubkey()).await?;

            client.initialize(Arc::clone(&wallet))?;
            let signature = client
                .register_agent(
                    &wallet,
                    &RegisterOptions {
                        capabilities,
                        metadata_uri,
                    },
                )
                .await?;
            println!("Registered agent. Signature: {}", signature);
        }
        Command::Update {
            capabilities,
            metadata_uri,
        } => {
            if capabilities.is_none() && metadata_uri.is_none() {
                anyhow::bail!("Nothing to update. Pass --capabilities and/or --metadata-uri");
            }
            let wallet = config.load_wallet()?;
            startup_checks(&reader, &wallet.pubkey()).await?;

            let signature = client
                .update_agent(
                    &wallet,
                    &UpdateOptions {
                        capabilities,
                        metadata_uri,
                    },
                )
                .await?;
            println!("Updated agent. Signature: {}", signature);
        }
        Command::Get { owner } => {
            let owner = match owner {
                Some(owner) => Pubkey::from_str(&owner)
                    .map_err(|_| anyhow::anyhow!("Failed to parse owner as Pubkey: {}", owner))?,
                None => config.load_wallet()?.pubkey(),
            };

            match client.get_agent(&owner).await? {
                Some(record) => print_record(&record, cli.json)?,
                None => println!("No agent registered for {}", owner),
            }
        }
        Command::List { limit } => {
            let records = client.get_all_agents(limit).await?;
            if cli.json {
                let values: Vec<_> = records.iter().map(record_json).collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                println!("{} agent(s)", records.len());
                for record in &records {
                    print_record(record, false)?;
                }
            }
        }
        Command::Balance => {
            let wallet = config.load_wallet()?;
            let balance = reader.get_balance(&wallet.pubkey()).await?;
            println!(
                "Balance: {} lamports ({} SOL)",
                balance,
                balance as f64 / 1_000_000_000.0
            );
        }
    }

    Ok(())
}

async fn startup_checks(reader: &SolanaAdapter, wallet: &Pubkey) -> Result<()> {
    let balance = reader
        .get_balance(wallet)
        .await
        .context("Failed to check wallet balance")?;

    if balance < MIN_BALANCE_LAMPORTS {
        anyhow::bail!(
            "Wallet requires at least 0.001 SOL. Current balance: {} lamports. Please fund: {}",
            balance,
            wallet
        );
    }

    Ok(())
}

fn record_json(record: &AgentRecord) -> serde_json::Value {
    serde_json::json!({
        "address": record.address.to_string(),
        "capabilities": record.capabilities,
        "metadataUri": record.metadata_uri,
        "reputation": record.reputation,
        "lastUpdated": record.last_updated.to_rfc3339(),
        "bump": record.bump,
    })
}

fn print_record(record: &AgentRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&record_json(record))?);
        return Ok(());
    }

    println!("Agent {}", record.address);
    println!("  capabilities: {:#b}", record.capabilities);
    println!("  metadata uri: {}", record.metadata_uri);
    println!("  reputation:   {}", record.reputation);
    println!("  last updated: {}", record.last_updated);
    println!("  bump:         {}", record.bump);
    Ok(())
}
