use borsh::{BorshDeserialize, BorshSerialize};
use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use std::io::{Error, ErrorKind};

pub const DISCRIMINATOR_LEN: usize = 8;

/// Borsh layout of the account body, after the discriminator.
#[derive(BorshSerialize, BorshDeserialize)]
struct AgentAccountData {
    owner: [u8; 32],
    capabilities: u64,
    metadata_uri: String,
    reputation: Option<u64>,
    last_updated: i64,
    bump: u8,
}

/// On-chain agent account as stored by the registry program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAccount {
    pub owner: Pubkey,
    pub capabilities: u64,
    pub metadata_uri: String,
    pub reputation: Option<u64>,
    /// Unix timestamp, seconds.
    pub last_updated: i64,
    pub bump: u8,
}

impl AgentAccount {
    /// Decodes raw account data, checking the leading discriminator.
    /// Trailing bytes (account padding) are ignored.
    pub fn decode(discriminator: &[u8; DISCRIMINATOR_LEN], data: &[u8]) -> Result<Self, Error> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(Error::new(ErrorKind::InvalidData, "account data too short"));
        }
        let (head, mut body) = data.split_at(DISCRIMINATOR_LEN);
        if head != discriminator.as_slice() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "account discriminator mismatch",
            ));
        }

        let raw = AgentAccountData::deserialize(&mut body)?;
        Ok(Self {
            owner: Pubkey::new_from_array(raw.owner),
            capabilities: raw.capabilities,
            metadata_uri: raw.metadata_uri,
            reputation: raw.reputation,
            last_updated: raw.last_updated,
            bump: raw.bump,
        })
    }

    pub fn encode(&self, discriminator: &[u8; DISCRIMINATOR_LEN]) -> Result<Vec<u8>, Error> {
        let raw = AgentAccountData {
            owner: self.owner.to_bytes(),
            capabilities: self.capabilities,
            metadata_uri: self.metadata_uri.clone(),
            reputation: self.reputation,
            last_updated: self.last_updated,
            bump: self.bump,
        };
        let mut data = discriminator.to_vec();
        raw.serialize(&mut data)?;
        Ok(data)
    }
}

/// Snapshot of an agent account at fetch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRecord {
    pub address: Pubkey,
    pub capabilities: u64,
    pub metadata_uri: String,
    pub reputation: u64,
    pub last_updated: DateTime<Utc>,
    pub bump: u8,
}

impl AgentRecord {
    pub fn from_account(address: Pubkey, account: &AgentAccount) -> Self {
        Self {
            address,
            capabilities: account.capabilities,
            metadata_uri: account.metadata_uri.clone(),
            reputation: account.reputation.unwrap_or(0),
            last_updated: account_last_updated(account),
            bump: account.bump,
        }
    }
}

/// Falls back to the Unix epoch when the stored timestamp is out of range.
pub fn account_last_updated(account: &AgentAccount) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(account.last_updated, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
