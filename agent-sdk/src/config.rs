use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::retry::RetryPolicy;

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// Connection and behaviour settings for [`crate::AgentClient`].
#[derive(Debug, Clone)]
pub struct AgentClientConfig {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    /// Overrides the program address declared in the IDL.
    pub program_id: Option<Pubkey>,
    pub retry: RetryPolicy,
    /// Transient handles built for `update_agent` skip preflight simulation.
    pub skip_preflight_on_update: bool,
}

impl Default for AgentClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: CommitmentConfig::confirmed(),
            program_id: None,
            retry: RetryPolicy::default(),
            skip_preflight_on_update: true,
        }
    }
}

impl AgentClientConfig {
    /// Reads settings from the process environment, after loading `.env` if present.
    ///
    /// Recognised variables: `RPC_URL`, `COMMITMENT`, `AGENT_REGISTRY_PROGRAM_ID`,
    /// `RETRY_MAX_ATTEMPTS`, `RETRY_BASE_DELAY_MS`, `SKIP_PREFLIGHT_ON_UPDATE`.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("no .env file loaded: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(rpc_url) = lookup("RPC_URL") {
            config.rpc_url = rpc_url;
        }

        if let Some(commitment) = lookup("COMMITMENT") {
            config.commitment = parse_commitment(&commitment)?;
        }

        if let Some(program_id) = lookup("AGENT_REGISTRY_PROGRAM_ID") {
            let program_id = Pubkey::from_str(&program_id).map_err(|_| {
                AgentError::Configuration(format!(
                    "Failed to parse AGENT_REGISTRY_PROGRAM_ID as Pubkey: {}",
                    program_id
                ))
            })?;
            config.program_id = Some(program_id);
        }

        if let Some(attempts) = lookup("RETRY_MAX_ATTEMPTS") {
            config.retry.max_attempts = parse_number("RETRY_MAX_ATTEMPTS", &attempts)?;
        }

        if let Some(delay) = lookup("RETRY_BASE_DELAY_MS") {
            config.retry.base_delay =
                Duration::from_millis(parse_number("RETRY_BASE_DELAY_MS", &delay)?);
        }

        if let Some(skip) = lookup("SKIP_PREFLIGHT_ON_UPDATE") {
            config.skip_preflight_on_update = parse_number::<bool>("SKIP_PREFLIGHT_ON_UPDATE", &skip)?;
        }

        Ok(config)
    }
}

fn parse_commitment(value: &str) -> Result<CommitmentConfig> {
    match value.trim().to_lowercase().as_str() {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => Err(AgentError::Configuration(format!(
            "Unknown commitment level: {}. Must be 'processed', 'confirmed', or 'finalized'",
            other
        ))),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        AgentError::Configuration(format!("Invalid value for {}: {}", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = AgentClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.commitment, CommitmentConfig::confirmed());
        assert!(config.program_id.is_none());
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.skip_preflight_on_update);
    }

    #[test]
    fn test_overrides_are_applied() {
        let program_id = Pubkey::new_unique();
        let program_id_str = program_id.to_string();
        let config = AgentClientConfig::from_lookup(lookup_from(&[
            ("RPC_URL", "http://127.0.0.1:8899"),
            ("COMMITMENT", "Finalized"),
            ("AGENT_REGISTRY_PROGRAM_ID", program_id_str.as_str()),
            ("RETRY_MAX_ATTEMPTS", "5"),
            ("RETRY_BASE_DELAY_MS", "250"),
            ("SKIP_PREFLIGHT_ON_UPDATE", "false"),
        ]))
        .unwrap();

        assert_eq!(config.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(config.commitment, CommitmentConfig::finalized());
        assert_eq!(config.program_id, Some(program_id));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(250));
        assert!(!config.skip_preflight_on_update);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(AgentClientConfig::from_lookup(lookup_from(&[("COMMITMENT", "max")])).is_err());
        assert!(
            AgentClientConfig::from_lookup(lookup_from(&[("AGENT_REGISTRY_PROGRAM_ID", "nope")]))
                .is_err()
        );
        assert!(
            AgentClientConfig::from_lookup(lookup_from(&[("RETRY_MAX_ATTEMPTS", "-1")])).is_err()
        );
    }
}
