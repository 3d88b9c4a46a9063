use solana_adapter::{SendOptions, SolanaAdapter};
use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};
use std::sync::Arc;

use crate::accounts::AgentRecord;
use crate::config::AgentClientConfig;
use crate::error::{AgentError, Result};
use crate::idl::ensure_idl;
use crate::pdas;
use crate::program::{
    AgentProgram, ProgramProvider, RegisterAgentCall, RpcProgramProvider, UpdateAgentCall,
};
use crate::retry::{retry, RetryPolicy};

pub const DEFAULT_AGENT_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOptions {
    pub capabilities: u64,
    pub metadata_uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    pub capabilities: Option<u64>,
    pub metadata_uri: Option<String>,
}

/// Which program handles an operation accepts.
enum HandleAccess<'a> {
    /// Only the handle installed by [`AgentClient::initialize`], bound to this wallet.
    BoundSigner(&'a Pubkey),
    /// The bound handle if it belongs to this wallet, otherwise a transient one.
    Signer(&'a Arc<Keypair>),
    /// The bound handle if any, otherwise a transient read-only one.
    Read,
    /// Always a transient read-only handle.
    FreshRead,
}

pub struct AgentClient {
    provider: Arc<dyn ProgramProvider>,
    program: Option<Arc<dyn AgentProgram>>,
    program_id: Pubkey,
    retry: RetryPolicy,
    update_send_options: SendOptions,
}

impl AgentClient {
    pub fn new(provider: Arc<dyn ProgramProvider>, config: &AgentClientConfig) -> Result<Self> {
        let program_id = match config.program_id {
            Some(program_id) => program_id,
            None => ensure_idl()?.program_id,
        };

        Ok(Self {
            provider,
            program: None,
            program_id,
            retry: config.retry.clone(),
            update_send_options: SendOptions {
                skip_preflight: config.skip_preflight_on_update,
            },
        })
    }

    /// Client backed by an RPC node at `config.rpc_url`.
    pub fn connect(config: &AgentClientConfig) -> Result<Self> {
        let rpc = SolanaAdapter::connect(config.rpc_url.clone(), config.commitment);
        Self::new(Arc::new(RpcProgramProvider::new(rpc)), config)
    }

    /// Binds the long-lived program handle to `wallet`. Required before
    /// [`AgentClient::register_agent`].
    pub fn initialize(&mut self, wallet: Arc<Keypair>) -> Result<()> {
        let idl = ensure_idl()?;
        let owner = wallet.pubkey();
        self.program = Some(self.provider.signer_program(
            self.program_id,
            idl,
            wallet,
            SendOptions::default(),
        ));
        tracing::info!(%owner, program_id = %self.program_id, "agent client initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.program.is_some()
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn derive_agent_pda(&self, owner: &Pubkey) -> Result<(Pubkey, u8)> {
        pdas::derive_agent_pda(owner, &self.program_id)
    }

    fn resolve_program(&self, access: HandleAccess<'_>) -> Result<Arc<dyn AgentProgram>> {
        match access {
            HandleAccess::BoundSigner(wallet) => {
                let program = self.program.as_ref().ok_or_else(|| {
                    AgentError::Configuration(
                        "No program instance available. Ensure client.initialize(wallet) was called successfully."
                            .to_string(),
                    )
                })?;
                if program.signer() != Some(*wallet) {
                    return Err(AgentError::Configuration(format!(
                        "Program instance is bound to a different wallet than {}",
                        wallet
                    )));
                }
                Ok(Arc::clone(program))
            }
            HandleAccess::Signer(wallet) => match &self.program {
                Some(program) if program.signer() == Some(wallet.pubkey()) => {
                    Ok(Arc::clone(program))
                }
                _ => {
                    tracing::debug!(wallet = %wallet.pubkey(), "building transient signer handle");
                    Ok(self.provider.signer_program(
                        self.program_id,
                        ensure_idl()?,
                        Arc::clone(wallet),
                        self.update_send_options,
                    ))
                }
            },
            HandleAccess::Read => match &self.program {
                Some(program) => Ok(Arc::clone(program)),
                None => Ok(self.provider.read_only_program(self.program_id, ensure_idl()?)),
            },
            HandleAccess::FreshRead => {
                Ok(self.provider.read_only_program(self.program_id, ensure_idl()?))
            }
        }
    }

    pub async fn register_agent(
        &self,
        wallet: &Arc<Keypair>,
        options: &RegisterOptions,
    ) -> Result<String> {
        let owner = wallet.pubkey();
        let (agent_pda, _) = self.derive_agent_pda(&owner)?;

        let signature = retry(&self.retry, "register_agent", move || {
            self.register_attempt(owner, agent_pda, options)
        })
        .await?;

        tracing::info!(%owner, agent = %agent_pda, %signature, "agent registered");
        Ok(signature)
    }

    async fn register_attempt(
        &self,
        owner: Pubkey,
        agent_pda: Pubkey,
        options: &RegisterOptions,
    ) -> Result<String> {
        let program = self.resolve_program(HandleAccess::BoundSigner(&owner))?;

        program
            .register_agent(RegisterAgentCall {
                agent_account: agent_pda,
                signer: owner,
                capabilities: options.capabilities,
                metadata_uri: options.metadata_uri.clone(),
            })
            .await
            .map_err(|e| AgentError::classify("Agent registration", e))
    }

    pub async fn update_agent(
        &self,
        wallet: &Arc<Keypair>,
        options: &UpdateOptions,
    ) -> Result<String> {
        let owner = wallet.pubkey();
        let (agent_pda, _) = self.derive_agent_pda(&owner)?;

        let signature = retry(&self.retry, "update_agent", move || {
            self.update_attempt(wallet, agent_pda, options)
        })
        .await?;

        tracing::info!(%owner, agent = %agent_pda, %signature, "agent updated");
        Ok(signature)
    }

    async fn update_attempt(
        &self,
        wallet: &Arc<Keypair>,
        agent_pda: Pubkey,
        options: &UpdateOptions,
    ) -> Result<String> {
        let program = self.resolve_program(HandleAccess::Signer(wallet))?;

        program
            .update_agent(UpdateAgentCall {
                agent_account: agent_pda,
                signer: wallet.pubkey(),
                capabilities: options.capabilities,
                metadata_uri: options.metadata_uri.clone(),
            })
            .await
            .map_err(|e| AgentError::classify("Agent update", e))
    }

    /// Returns `None` when no agent account exists for `owner`.
    pub async fn get_agent(&self, owner: &Pubkey) -> Result<Option<AgentRecord>> {
        let (agent_pda, _) = self.derive_agent_pda(owner)?;
        let program = self.resolve_program(HandleAccess::Read)?;

        match program.fetch_agent_account(&agent_pda).await {
            Ok(account) => Ok(Some(AgentRecord::from_account(agent_pda, &account))),
            Err(e) => match AgentError::classify("Agent fetch", e) {
                AgentError::AccountNotFound => {
                    tracing::debug!(%owner, agent = %agent_pda, "agent account not found");
                    Ok(None)
                }
                other => Err(other),
            },
        }
    }

    /// First `limit` agent accounts in the order the node returns them.
    pub async fn get_all_agents(&self, limit: usize) -> Result<Vec<AgentRecord>> {
        let program = self
            .resolve_program(HandleAccess::FreshRead)
            .map_err(|e| AgentError::Fetch(e.to_string()))?;

        let accounts = program
            .all_agent_accounts()
            .await
            .map_err(|e| AgentError::Fetch(format!("{:#}", e)))?;

        tracing::debug!(total = accounts.len(), limit, "fetched agent accounts");
        Ok(accounts
            .iter()
            .take(limit)
            .map(|(address, account)| AgentRecord::from_account(*address, account))
            .collect())
    }
}
