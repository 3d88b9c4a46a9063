//! In-memory stand-in for the registry program, recording every call.

use agent_sdk::{
    derive_agent_pda, AgentAccount, AgentError, AgentProgram, AgentRegistryIdl, ProgramProvider,
    RegisterAgentCall, SendOptions, UpdateAgentCall,
};
use async_trait::async_trait;
use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

pub const LAST_UPDATED: i64 = 1_700_000_000;

#[derive(Default)]
pub struct LedgerState {
    pub accounts: Vec<(Pubkey, AgentAccount)>,
    pub register_calls: Vec<RegisterAgentCall>,
    pub update_calls: Vec<UpdateAgentCall>,
    pub remote_attempts: usize,
    pub signer_handles_built: usize,
    pub read_only_handles_built: usize,
    pub last_send_options: Option<SendOptions>,
    /// Each remote call pops one entry and fails with it, if any.
    pub failures: VecDeque<anyhow::Error>,
}

#[derive(Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<LedgerState>>,
}

#[allow(dead_code)]
impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap()
    }

    pub fn fail_next(&self, message: &str) {
        self.state().failures.push_back(anyhow::anyhow!(message.to_string()));
    }

    /// Fails the next remote call with an error raised before anything is sent.
    pub fn fail_next_locally(&self, error: AgentError) {
        self.state().failures.push_back(error.into());
    }

    pub fn seed_agent(&self, program_id: &Pubkey, owner: Pubkey, capabilities: u64, uri: &str) -> Pubkey {
        let (address, bump) = derive_agent_pda(&owner, program_id).unwrap();
        self.state().accounts.push((
            address,
            AgentAccount {
                owner,
                capabilities,
                metadata_uri: uri.to_string(),
                reputation: Some(capabilities * 10),
                last_updated: LAST_UPDATED,
                bump,
            },
        ));
        address
    }
}

impl ProgramProvider for MockLedger {
    fn signer_program(
        &self,
        program_id: Pubkey,
        _idl: &'static AgentRegistryIdl,
        wallet: Arc<Keypair>,
        send_options: SendOptions,
    ) -> Arc<dyn AgentProgram> {
        let mut state = self.state();
        state.signer_handles_built += 1;
        state.last_send_options = Some(send_options);
        Arc::new(MockProgram {
            state: Arc::clone(&self.state),
            program_id,
            signer: Some(wallet.pubkey()),
        })
    }

    fn read_only_program(
        &self,
        program_id: Pubkey,
        _idl: &'static AgentRegistryIdl,
    ) -> Arc<dyn AgentProgram> {
        self.state().read_only_handles_built += 1;
        Arc::new(MockProgram {
            state: Arc::clone(&self.state),
            program_id,
            signer: None,
        })
    }
}

pub struct MockProgram {
    state: Arc<Mutex<LedgerState>>,
    program_id: Pubkey,
    signer: Option<Pubkey>,
}

impl MockProgram {
    fn begin(&self) -> anyhow::Result<MutexGuard<'_, LedgerState>> {
        let mut state = self.state.lock().unwrap();
        state.remote_attempts += 1;
        if let Some(failure) = state.failures.pop_front() {
            return Err(failure);
        }
        Ok(state)
    }

    fn require_signer(&self, signer: &Pubkey) -> anyhow::Result<()> {
        match self.signer {
            Some(bound) if bound == *signer => Ok(()),
            Some(_) => anyhow::bail!("Signature verification failed"),
            None => anyhow::bail!("Read-only adapter cannot sign transactions"),
        }
    }
}

#[async_trait]
impl AgentProgram for MockProgram {
    fn signer(&self) -> Option<Pubkey> {
        self.signer
    }

    async fn register_agent(&self, call: RegisterAgentCall) -> anyhow::Result<String> {
        self.require_signer(&call.signer)?;
        let mut state = self.begin()?;

        let (expected, bump) = derive_agent_pda(&call.signer, &self.program_id)?;
        if expected != call.agent_account {
            anyhow::bail!("custom program error: 0x7d6");
        }
        if state.accounts.iter().any(|(address, _)| *address == call.agent_account) {
            anyhow::bail!("custom program error: 0x0");
        }

        state.accounts.push((
            call.agent_account,
            AgentAccount {
                owner: call.signer,
                capabilities: call.capabilities,
                metadata_uri: call.metadata_uri.clone(),
                reputation: None,
                last_updated: LAST_UPDATED,
                bump,
            },
        ));
        state.register_calls.push(call);
        Ok(format!("register-sig-{}", state.register_calls.len()))
    }

    async fn update_agent(&self, call: UpdateAgentCall) -> anyhow::Result<String> {
        self.require_signer(&call.signer)?;
        let mut state = self.begin()?;

        let account = state
            .accounts
            .iter_mut()
            .find(|(address, _)| *address == call.agent_account)
            .map(|(_, account)| account)
            .ok_or_else(|| anyhow::anyhow!("AnchorError: AccountNotInitialized"))?;

        if let Some(capabilities) = call.capabilities {
            account.capabilities = capabilities;
        }
        if let Some(uri) = &call.metadata_uri {
            account.metadata_uri = uri.clone();
        }
        account.last_updated += 1;

        state.update_calls.push(call);
        Ok(format!("update-sig-{}", state.update_calls.len()))
    }

    async fn fetch_agent_account(&self, address: &Pubkey) -> anyhow::Result<AgentAccount> {
        let state = self.begin()?;
        state
            .accounts
            .iter()
            .find(|(candidate, _)| candidate == address)
            .map(|(_, account)| account.clone())
            .ok_or_else(|| anyhow::anyhow!("Account does not exist or has no data {}", address))
    }

    async fn all_agent_accounts(&self) -> anyhow::Result<Vec<(Pubkey, AgentAccount)>> {
        let state = self.begin()?;
        Ok(state.accounts.clone())
    }
}
