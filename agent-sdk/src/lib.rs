//! Client SDK for the on-chain agent registry program.
//!
//! ```ignore
//! use agent_sdk::{AgentClient, AgentClientConfig, RegisterOptions};
//!
//! let config = AgentClientConfig::from_env()?;
//! let mut client = AgentClient::connect(&config)?;
//! client.initialize(wallet.clone())?;
//!
//! let signature = client
//!     .register_agent(&wallet, &RegisterOptions { capabilities: 7, metadata_uri: "ipfs://x".into() })
//!     .await?;
//! let record = client.get_agent(&wallet.pubkey()).await?;
//! ```

mod accounts;
mod client;
mod config;
mod error;
mod idl;
mod instructions;
mod pdas;
mod program;
mod retry;

pub use accounts::{account_last_updated, AgentAccount, AgentRecord};
pub use client::{AgentClient, RegisterOptions, UpdateOptions, DEFAULT_AGENT_LIMIT};
pub use config::{AgentClientConfig, DEFAULT_RPC_URL};
pub use error::{AgentError, Result};
pub use idl::{anchor_discriminator, ensure_idl, install_idl, AgentRegistryIdl};
pub use instructions::{RegisterAgentBuilder, UpdateAgentBuilder, SYSTEM_PROGRAM_ID};
pub use pdas::{derive_agent_pda, AGENT_SEED};
pub use program::{
    AgentProgram, ProgramProvider, RegisterAgentCall, RpcAgentProgram, RpcProgramProvider,
    UpdateAgentCall,
};
pub use retry::{retry, RetryPolicy};

pub use solana_adapter::{SendOptions, SolanaAdapter};
