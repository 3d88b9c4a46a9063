//! Error taxonomy for agent registry operations.
//!
//! Remote failures reach the SDK as free-form text (RPC client errors, Anchor
//! program logs). [`AgentError::classify`] folds that text into a closed set of
//! variants so callers can branch on the cause instead of matching strings.

use thiserror::Error;

const ACCOUNT_NOT_FOUND: &str = "account does not exist";
const INSUFFICIENT_FUNDS: &str = "insufficient funds";
const CUSTOM_PROGRAM_ERROR: &str = "custom program error";

/// Errors surfaced by [`crate::AgentClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The client is missing something it needs before it can talk to the program.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The target account (or the program itself) could not be found on chain.
    #[error("Program account not found. Verify the program is deployed and the program ID is correct.")]
    AccountNotFound,

    /// The fee payer cannot cover fees and rent.
    #[error("Insufficient SOL balance to pay for transaction fees and rent.")]
    InsufficientFunds,

    /// The program rejected the instruction; keeps the remote message verbatim.
    #[error("Program error: {0}. Check program logs for details.")]
    ProgramExecution(String),

    /// Any other failure of a single-account operation.
    #[error("{operation} failed: {message}")]
    Operation {
        operation: &'static str,
        message: String,
    },

    /// Any failure while listing agent accounts.
    #[error("Failed to fetch agents: {0}")]
    Fetch(String),

    /// The program schema could not be loaded or is incomplete.
    #[error("IDL error: {0}")]
    Idl(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    /// Map a remote failure onto the taxonomy. `operation` labels the fallback.
    ///
    /// Errors raised locally as [`AgentError`] pass through unchanged.
    pub fn classify(operation: &'static str, error: anyhow::Error) -> Self {
        match error.downcast::<AgentError>() {
            Ok(local) => local,
            Err(error) => Self::classify_message(operation, format!("{:#}", error)),
        }
    }

    fn classify_message(operation: &'static str, message: String) -> Self {
        let lowered = message.to_lowercase();
        if lowered.contains(ACCOUNT_NOT_FOUND) {
            AgentError::AccountNotFound
        } else if lowered.contains(INSUFFICIENT_FUNDS) {
            AgentError::InsufficientFunds
        } else if lowered.contains(CUSTOM_PROGRAM_ERROR) {
            AgentError::ProgramExecution(message)
        } else {
            AgentError::Operation { operation, message }
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    ///
    /// Only unclassified failures (timeouts, dropped connections, stale
    /// blockhashes) are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AgentError::Operation { .. } | AgentError::Fetch(_))
    }
}
