use solana_sdk::pubkey::Pubkey;

use crate::error::{AgentError, Result};

pub const AGENT_SEED: &[u8] = b"agent";

pub fn derive_agent_pda(owner: &Pubkey, program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(&[AGENT_SEED, owner.as_ref()], program_id)
        .ok_or_else(|| AgentError::Configuration("Failed to derive agent PDA".to_string()))
}
