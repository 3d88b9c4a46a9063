use borsh::BorshSerialize;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use crate::error::{AgentError, Result};

pub const SYSTEM_PROGRAM_ID: Pubkey = solana_sdk::pubkey!("11111111111111111111111111111111");

#[derive(BorshSerialize)]
struct RegisterAgentArgs {
    capabilities: u64,
    metadata_uri: String,
}

#[derive(BorshSerialize)]
struct UpdateAgentArgs {
    capabilities: Option<u64>,
    metadata_uri: Option<String>,
}

fn instruction_data<T: BorshSerialize>(discriminator: [u8; 8], args: &T) -> Result<Vec<u8>> {
    let mut data = discriminator.to_vec();
    args.serialize(&mut data)
        .map_err(|e| AgentError::Configuration(format!("Failed to encode instruction: {}", e)))?;
    Ok(data)
}

fn required<T: Copy>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| AgentError::Configuration(format!("`{}` is not set", field)))
}

/// Accounts:
///   0. `[writable]` agent_account
///   1. `[writable, signer]` signer
///   2. `[]` system_program
#[derive(Debug, Default)]
pub struct RegisterAgentBuilder {
    program_id: Option<Pubkey>,
    agent_account: Option<Pubkey>,
    signer: Option<Pubkey>,
    capabilities: Option<u64>,
    metadata_uri: Option<String>,
}

impl RegisterAgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program_id(&mut self, program_id: Pubkey) -> &mut Self {
        self.program_id = Some(program_id);
        self
    }

    pub fn agent_account(&mut self, agent_account: Pubkey) -> &mut Self {
        self.agent_account = Some(agent_account);
        self
    }

    pub fn signer(&mut self, signer: Pubkey) -> &mut Self {
        self.signer = Some(signer);
        self
    }

    pub fn capabilities(&mut self, capabilities: u64) -> &mut Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn metadata_uri(&mut self, metadata_uri: String) -> &mut Self {
        self.metadata_uri = Some(metadata_uri);
        self
    }

    pub fn instruction(&self, discriminator: [u8; 8]) -> Result<Instruction> {
        let args = RegisterAgentArgs {
            capabilities: required(self.capabilities, "capabilities")?,
            metadata_uri: self
                .metadata_uri
                .clone()
                .ok_or_else(|| AgentError::Configuration("`metadata_uri` is not set".to_string()))?,
        };

        Ok(Instruction {
            program_id: required(self.program_id, "program_id")?,
            accounts: vec![
                AccountMeta::new(required(self.agent_account, "agent_account")?, false),
                AccountMeta::new(required(self.signer, "signer")?, true),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            ],
            data: instruction_data(discriminator, &args)?,
        })
    }
}

/// Accounts:
///   0. `[writable]` agent_account
///   1. `[signer]` signer
///
/// Unset arguments are encoded as `None` so the program leaves them unchanged.
#[derive(Debug, Default)]
pub struct UpdateAgentBuilder {
    program_id: Option<Pubkey>,
    agent_account: Option<Pubkey>,
    signer: Option<Pubkey>,
    capabilities: Option<u64>,
    metadata_uri: Option<String>,
}

impl UpdateAgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program_id(&mut self, program_id: Pubkey) -> &mut Self {
        self.program_id = Some(program_id);
        self
    }

    pub fn agent_account(&mut self, agent_account: Pubkey) -> &mut Self {
        self.agent_account = Some(agent_account);
        self
    }

    pub fn signer(&mut self, signer: Pubkey) -> &mut Self {
        self.signer = Some(signer);
        self
    }

    /// `[optional argument]`
    pub fn capabilities(&mut self, capabilities: u64) -> &mut Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// `[optional argument]`
    pub fn metadata_uri(&mut self, metadata_uri: String) -> &mut Self {
        self.metadata_uri = Some(metadata_uri);
        self
    }

    pub fn instruction(&self, discriminator: [u8; 8]) -> Result<Instruction> {
        let args = UpdateAgentArgs {
            capabilities: self.capabilities,
            metadata_uri: self.metadata_uri.clone(),
        };

        Ok(Instruction {
            program_id: required(self.program_id, "program_id")?,
            accounts: vec![
                AccountMeta::new(required(self.agent_account, "agent_account")?, false),
                AccountMeta::new_readonly(required(self.signer, "signer")?, true),
            ],
            data: instruction_data(discriminator, &args)?,
        })
    }
}
