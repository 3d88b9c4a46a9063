//! Program handles: the seam between [`crate::AgentClient`] and the chain.
//!
//! An [`AgentProgram`] is bound either to a signer or to nothing at all
//! (read-only). [`ProgramProvider`] builds transient handles on demand; the
//! production implementations talk to an RPC node through [`SolanaAdapter`].

use anyhow::Result;
use async_trait::async_trait;
use solana_adapter::{AccountFilter, SendOptions, SolanaAdapter};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{pubkey::Pubkey, signature::Keypair};
use std::sync::Arc;

use crate::accounts::AgentAccount;
use crate::idl::AgentRegistryIdl;
use crate::instructions::{RegisterAgentBuilder, UpdateAgentBuilder};

/// Arguments and accounts of a `register_agent` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAgentCall {
    pub agent_account: Pubkey,
    pub signer: Pubkey,
    pub capabilities: u64,
    pub metadata_uri: String,
}

/// Arguments and accounts of an `update_agent` call. `None` leaves the field unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAgentCall {
    pub agent_account: Pubkey,
    pub signer: Pubkey,
    pub capabilities: Option<u64>,
    pub metadata_uri: Option<String>,
}

#[async_trait]
pub trait AgentProgram: Send + Sync {
    /// Signer the handle is bound to; `None` for read-only handles.
    fn signer(&self) -> Option<Pubkey>;

    async fn register_agent(&self, call: RegisterAgentCall) -> Result<String>;

    async fn update_agent(&self, call: UpdateAgentCall) -> Result<String>;

    /// Fails with "Account does not exist" when nothing is stored at `address`.
    async fn fetch_agent_account(&self, address: &Pubkey) -> Result<AgentAccount>;

    async fn all_agent_accounts(&self) -> Result<Vec<(Pubkey, AgentAccount)>>;
}

pub trait ProgramProvider: Send + Sync {
    fn signer_program(
        &self,
        program_id: Pubkey,
        idl: &'static AgentRegistryIdl,
        wallet: Arc<Keypair>,
        send_options: SendOptions,
    ) -> Arc<dyn AgentProgram>;

    fn read_only_program(
        &self,
        program_id: Pubkey,
        idl: &'static AgentRegistryIdl,
    ) -> Arc<dyn AgentProgram>;
}

pub struct RpcAgentProgram {
    adapter: SolanaAdapter,
    program_id: Pubkey,
    idl: &'static AgentRegistryIdl,
}

impl RpcAgentProgram {
    pub fn new(adapter: SolanaAdapter, program_id: Pubkey, idl: &'static AgentRegistryIdl) -> Self {
        Self {
            adapter,
            program_id,
            idl,
        }
    }
}

#[async_trait]
impl AgentProgram for RpcAgentProgram {
    fn signer(&self) -> Option<Pubkey> {
        self.adapter.payer_pubkey()
    }

    async fn register_agent(&self, call: RegisterAgentCall) -> Result<String> {
        let instruction = RegisterAgentBuilder::new()
            .program_id(self.program_id)
            .agent_account(call.agent_account)
            .signer(call.signer)
            .capabilities(call.capabilities)
            .metadata_uri(call.metadata_uri)
            .instruction(self.idl.register_agent)?;

        self.adapter
            .send_and_confirm_transaction(&[instruction])
            .await
    }

    async fn update_agent(&self, call: UpdateAgentCall) -> Result<String> {
        let mut builder = UpdateAgentBuilder::new();
        builder
            .program_id(self.program_id)
            .agent_account(call.agent_account)
            .signer(call.signer);

        if let Some(capabilities) = call.capabilities {
            builder.capabilities(capabilities);
        }

        if let Some(metadata_uri) = call.metadata_uri {
            builder.metadata_uri(metadata_uri);
        }

        let instruction = builder.instruction(self.idl.update_agent)?;

        self.adapter
            .send_and_confirm_transaction(&[instruction])
            .await
    }

    async fn fetch_agent_account(&self, address: &Pubkey) -> Result<AgentAccount> {
        let discriminator = self.idl.agent_account;
        self.adapter
            .get_account(address, move |data| AgentAccount::decode(&discriminator, data))
            .await?
            .ok_or_else(|| anyhow::anyhow!("Account does not exist or has no data {}", address))
    }

    async fn all_agent_accounts(&self) -> Result<Vec<(Pubkey, AgentAccount)>> {
        let discriminator = self.idl.agent_account;
        self.adapter
            .get_program_accounts(
                &self.program_id,
                vec![AccountFilter::new(0, discriminator.to_vec())],
                move |data| AgentAccount::decode(&discriminator, data),
            )
            .await
    }
}

/// Builds RPC-backed handles that share one connection.
pub struct RpcProgramProvider {
    client: Arc<RpcClient>,
}

impl RpcProgramProvider {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }
}

impl ProgramProvider for RpcProgramProvider {
    fn signer_program(
        &self,
        program_id: Pubkey,
        idl: &'static AgentRegistryIdl,
        wallet: Arc<Keypair>,
        send_options: SendOptions,
    ) -> Arc<dyn AgentProgram> {
        let adapter = SolanaAdapter::with_client(Arc::clone(&self.client), Some(wallet))
            .with_send_options(send_options);
        Arc::new(RpcAgentProgram::new(adapter, program_id, idl))
    }

    fn read_only_program(
        &self,
        program_id: Pubkey,
        idl: &'static AgentRegistryIdl,
    ) -> Arc<dyn AgentProgram> {
        let adapter = SolanaAdapter::read_only(Arc::clone(&self.client));
        Arc::new(RpcAgentProgram::new(adapter, program_id, idl))
    }
}
