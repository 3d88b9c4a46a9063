use anyhow::Result;
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig},
    rpc_filter::{Memcmp, MemcmpEncodedBytes, RpcFilterType},
};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::types::{AccountFilter, SendOptions};

const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// RPC access bound to an optional signer.
///
/// Several adapters may share one `RpcClient`; a signer-less adapter can read
/// accounts but refuses to build transactions.
pub struct SolanaAdapter {
    client: Arc<RpcClient>,
    keypair: Option<Arc<Keypair>>,
    send_options: SendOptions,
}

impl SolanaAdapter {
    pub fn connect(rpc_url: String, commitment: CommitmentConfig) -> Arc<RpcClient> {
        Arc::new(RpcClient::new_with_commitment(rpc_url, commitment))
    }

    pub fn with_client(client: Arc<RpcClient>, keypair: Option<Arc<Keypair>>) -> Self {
        Self {
            client,
            keypair,
            send_options: SendOptions::default(),
        }
    }

    pub fn read_only(client: Arc<RpcClient>) -> Self {
        Self::with_client(client, None)
    }

    pub fn with_send_options(mut self, send_options: SendOptions) -> Self {
        self.send_options = send_options;
        self
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.client.commitment()
    }

    pub fn payer_pubkey(&self) -> Option<Pubkey> {
        self.keypair.as_ref().map(|keypair| keypair.pubkey())
    }

    pub async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64> {
        self.client
            .get_balance(pubkey)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get balance: {}", e))
    }

    pub async fn send_and_confirm_transaction(
        &self,
        instructions: &[Instruction],
    ) -> Result<String> {
        let keypair = self
            .keypair
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Read-only adapter cannot sign transactions"))?;

        let latest_blockhash = self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get latest blockhash: {}", e))?;

        let payer = keypair.pubkey();
        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&payer),
            &[&**keypair],
            latest_blockhash,
        );

        let signature = if self.send_options.skip_preflight {
            let config = RpcSendTransactionConfig {
                skip_preflight: true,
                ..Default::default()
            };
            let signature = self.client
                .send_transaction_with_config(&transaction, config)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to send transaction: {}", e))?;
            self.confirm_signature(&signature).await?;
            signature
        } else {
            self.client
                .send_and_confirm_transaction(&transaction)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to send transaction: {}", e))?
        };

        tracing::debug!(%signature, payer = %payer, "transaction confirmed");
        Ok(signature.to_string())
    }

    /// Polls the signature status until it reaches the client's commitment.
    /// A transaction that landed but failed surfaces its error.
    async fn confirm_signature(&self, signature: &Signature) -> Result<()> {
        let deadline = Instant::now() + CONFIRM_TIMEOUT;
        loop {
            let status = self.client
                .get_signature_status_with_commitment(signature, self.client.commitment())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to get signature status: {}", e))?;

            match status {
                Some(Ok(())) => return Ok(()),
                Some(Err(e)) => anyhow::bail!("Transaction {} failed: {}", signature, e),
                None if Instant::now() >= deadline => anyhow::bail!(
                    "Transaction {} was not confirmed within {}s",
                    signature,
                    CONFIRM_TIMEOUT.as_secs()
                ),
                None => tokio::time::sleep(CONFIRM_POLL_INTERVAL).await,
            }
        }
    }

    pub async fn get_program_accounts<T, F>(
        &self,
        program_id: &Pubkey,
        filters: Vec<AccountFilter>,
        deserialize_fn: F,
    ) -> Result<Vec<(Pubkey, T)>>
    where
        F: Fn(&[u8]) -> Result<T, std::io::Error> + Send + 'static,
        T: Send + 'static,
    {
        let rpc_filters = filters
            .into_iter()
            .map(|filter| {
                RpcFilterType::Memcmp(Memcmp::new(
                    filter.offset,
                    MemcmpEncodedBytes::Bytes(filter.value),
                ))
            })
            .collect();

        let config = RpcProgramAccountsConfig {
            filters: Some(rpc_filters),
            account_config: RpcAccountInfoConfig {
                commitment: Some(self.client.commitment()),
                encoding: Some(UiAccountEncoding::Base64),
                ..Default::default()
            },
            ..Default::default()
        };

        let accounts = self.client
            .get_program_accounts_with_config(program_id, config)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get program accounts: {}", e))?;

        let mut decoded_accounts = Vec::with_capacity(accounts.len());
        for (pubkey, account) in accounts {
            match deserialize_fn(&account.data) {
                Ok(data) => decoded_accounts.push((pubkey, data)),
                Err(e) => {
                    return Err(anyhow::anyhow!(
                        "Failed to deserialize account {}: {}",
                        pubkey,
                        e
                    ));
                }
            }
        }
        Ok(decoded_accounts)
    }

    pub async fn get_accounts<T, F>(
        &self,
        addresses: &[Pubkey],
        deserialize_fn: F,
    ) -> Result<Vec<(Pubkey, T)>>
    where
        F: Fn(&[u8]) -> Result<T, std::io::Error> + Send + 'static,
        T: Send + 'static,
    {
        let accounts = self.client
            .get_multiple_accounts(addresses)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get accounts: {}", e))?;

        let mut decoded_accounts = Vec::new();
        for (address, account) in addresses.iter().zip(accounts.iter()) {
            if let Some(account) = account {
                match deserialize_fn(&account.data) {
                    Ok(data) => decoded_accounts.push((*address, data)),
                    Err(e) => {
                        return Err(anyhow::anyhow!(
                            "Failed to deserialize account {}: {}",
                            address,
                            e
                        ));
                    }
                }
            }
        }
        Ok(decoded_accounts)
    }

    pub async fn get_account<T, F>(
        &self,
        address: &Pubkey,
        deserialize_fn: F,
    ) -> Result<Option<T>>
    where
        F: Fn(&[u8]) -> Result<T, std::io::Error> + Send + 'static,
        T: Send + 'static,
    {
        let accounts = self.get_accounts(&[*address], deserialize_fn).await?;
        Ok(accounts.into_iter().next().map(|(_, data)| data))
    }
}
