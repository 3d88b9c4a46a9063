//! Agent registry program schema.
//!
//! The schema is loaded once per process. By default the IDL shipped with the
//! crate is used; [`install_idl`] replaces it, but only before anything has
//! read it.

use once_cell::sync::OnceCell;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;

use crate::error::{AgentError, Result};

const EMBEDDED_IDL: &str = include_str!("../idl/agent_registry.json");

static IDL: OnceCell<AgentRegistryIdl> = OnceCell::new();

#[derive(Debug, Deserialize)]
struct RawIdl {
    address: String,
    metadata: RawMetadata,
    instructions: Vec<RawEntry>,
    #[serde(default)]
    accounts: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    name: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    name: String,
    // Pre-0.30 Anchor IDLs omit discriminators; they are derived from the name.
    discriminator: Option<[u8; 8]>,
}

/// Resolved view of the IDL: only what the client needs to encode calls and
/// recognise accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRegistryIdl {
    pub name: String,
    pub version: String,
    pub program_id: Pubkey,
    pub register_agent: [u8; 8],
    pub update_agent: [u8; 8],
    pub agent_account: [u8; 8],
}

impl AgentRegistryIdl {
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawIdl = serde_json::from_str(json)
            .map_err(|e| AgentError::Idl(format!("Failed to parse IDL JSON: {}", e)))?;

        let program_id = Pubkey::from_str(&raw.address).map_err(|_| {
            AgentError::Idl(format!("Invalid program address in IDL: {}", raw.address))
        })?;

        Ok(Self {
            register_agent: find_discriminator(&raw.instructions, "global", "register_agent")?,
            update_agent: find_discriminator(&raw.instructions, "global", "update_agent")?,
            agent_account: find_discriminator(&raw.accounts, "account", "AgentAccount")?,
            name: raw.metadata.name,
            version: raw.metadata.version,
            program_id,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AgentError::Idl(format!(
                "Failed to read IDL file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }
}

fn find_discriminator(entries: &[RawEntry], namespace: &str, name: &str) -> Result<[u8; 8]> {
    let camel = snake_to_camel(name);
    let entry = entries
        .iter()
        .find(|entry| entry.name == name || entry.name == camel)
        .ok_or_else(|| AgentError::Idl(format!("IDL does not define `{}`", name)))?;

    Ok(entry
        .discriminator
        .unwrap_or_else(|| anchor_discriminator(namespace, name)))
}

fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Anchor's sighash: first 8 bytes of `sha256("<namespace>:<name>")`.
pub fn anchor_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash[..8]);
    discriminator
}

/// Returns the process-wide schema, loading the embedded IDL on first use.
pub fn ensure_idl() -> Result<&'static AgentRegistryIdl> {
    IDL.get_or_try_init(|| {
        tracing::debug!("loading embedded agent registry IDL");
        AgentRegistryIdl::from_json(EMBEDDED_IDL)
    })
}

/// Installs a custom schema. Fails once the schema has been initialised.
pub fn install_idl(idl: AgentRegistryIdl) -> Result<&'static AgentRegistryIdl> {
    IDL.set(idl)
        .map_err(|_| AgentError::Idl("IDL already initialized".to_string()))?;
    ensure_idl()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_idl_matches_anchor_sighash() {
        let idl = AgentRegistryIdl::from_json(EMBEDDED_IDL).unwrap();
        assert_eq!(idl.name, "agent_registry");
        assert_eq!(idl.register_agent, anchor_discriminator("global", "register_agent"));
        assert_eq!(idl.update_agent, anchor_discriminator("global", "update_agent"));
        assert_eq!(idl.agent_account, anchor_discriminator("account", "AgentAccount"));
    }

    #[test]
    fn test_legacy_idl_without_discriminators() {
        let json = r#"{
            "address": "249njxDQNBxUmUU7ctU82PWPv924PkEfzTc9kTgyHtFs",
            "metadata": { "name": "agent_registry", "version": "0.0.9" },
            "instructions": [
                { "name": "registerAgent" },
                { "name": "updateAgent" }
            ],
            "accounts": [{ "name": "AgentAccount" }]
        }"#;
        let idl = AgentRegistryIdl::from_json(json).unwrap();
        assert_eq!(idl.version, "0.0.9");
        assert_eq!(idl.register_agent, anchor_discriminator("global", "register_agent"));
        assert_eq!(idl.update_agent, anchor_discriminator("global", "update_agent"));
    }

    #[test]
    fn test_missing_instruction_is_rejected() {
        let json = r#"{
            "address": "249njxDQNBxUmUU7ctU82PWPv924PkEfzTc9kTgyHtFs",
            "metadata": { "name": "agent_registry", "version": "0.1.0" },
            "instructions": [{ "name": "register_agent" }],
            "accounts": [{ "name": "AgentAccount" }]
        }"#;
        let err = AgentRegistryIdl::from_json(json).unwrap_err();
        assert!(err.to_string().contains("update_agent"));
    }

    #[test]
    fn test_bad_address_is_rejected() {
        let json = r#"{
            "address": "not-a-key",
            "metadata": { "name": "agent_registry", "version": "0.1.0" },
            "instructions": []
        }"#;
        assert!(matches!(
            AgentRegistryIdl::from_json(json),
            Err(AgentError::Idl(_))
        ));
    }

    #[test]
    fn test_ensure_idl_is_stable() {
        let first = ensure_idl().unwrap();
        let second = ensure_idl().unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(install_idl(first.clone()).is_err());
    }
}
