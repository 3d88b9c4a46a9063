use agent_sdk::AgentClientConfig;
use anyhow::{Context, Result};
use solana_sdk::signature::Keypair;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Config {
    pub client: AgentClientConfig,
    pub keypair_path: Option<PathBuf>,
    pub idl_path: Option<PathBuf>,
}

impl Config {
    pub fn load(keypair_override: Option<PathBuf>) -> Result<Self> {
        let client = AgentClientConfig::from_env().context("Failed to load client configuration")?;

        let keypair_path = keypair_override
            .or_else(|| std::env::var("WALLET_KEYPAIR_PATH").ok().map(PathBuf::from));
        let idl_path = std::env::var("AGENT_REGISTRY_IDL_PATH").ok().map(PathBuf::from);

        Ok(Config {
            client,
            keypair_path,
            idl_path,
        })
    }

    pub fn load_wallet(&self) -> Result<Arc<Keypair>> {
        let path = self.keypair_path.as_ref().context(
            "No wallet configured. Pass --keypair or set WALLET_KEYPAIR_PATH",
        )?;
        let keypair = load_keypair_from_file(path)
            .with_context(|| format!("Failed to load keypair from {}", path.display()))?;
        Ok(Arc::new(keypair))
    }
}

pub fn load_keypair_from_file(path: &Path) -> Result<Keypair> {
    let keypair_json = std::fs::read_to_string(path).context("Failed to read keypair file")?;

    let keypair_bytes: Vec<u8> =
        serde_json::from_str(&keypair_json).context("Failed to parse keypair JSON")?;

    if keypair_bytes.len() != 64 {
        anyhow::bail!(
            "Invalid keypair length: expected 64 bytes, got {}",
            keypair_bytes.len()
        );
    }

    Keypair::try_from(keypair_bytes.as_slice())
        .map_err(|e| anyhow::anyhow!("Invalid keypair bytes: {}", e))
}
