//! Error types for the list engine

use thiserror::Error;

/// Errors raised by relay transports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Relay request timed out after {0}s")]
    Timeout(u64),

    #[error("No relays configured")]
    NoRelays,

    #[error("Event rejected by all relays: {0}")]
    Rejected(String),

    #[error("Relay error: {0}")]
    Relay(String),
}

/// Errors raised by the external signing agent bridge.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Failed to connect to signing agent: {0}. Is the daemon running?")]
    Connect(String),

    #[error("Signing agent request timed out")]
    Timeout,

    #[error("Signing agent returned an error: {0}")]
    Remote(String),

    #[error("Malformed signing agent response: {0}")]
    Protocol(String),

    #[error("Signing agent is not supported on this platform")]
    Unsupported,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Signing and encryption failures.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("No signing identity is active")]
    NoIdentity,

    #[error("{scheme} failed: {message}")]
    SchemeFailed { scheme: &'static str, message: String },

    #[error("All encryption schemes failed: {0}")]
    Exhausted(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}

/// File and cache persistence failures.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Failed to serialize {0}")]
    Serialize(String),

    #[error("No saved file for list '{0}'")]
    NotFound(String),
}

/// Main error type for list engine operations
#[derive(Error, Debug)]
pub enum ListError {
    /// A bulk sync holds the write guard; the caller should retry
    #[error("List '{0}' is still syncing, try again shortly")]
    StillSyncing(&'static str),

    /// Relay sync is switched off for this list
    #[error("Relay sync is disabled for list '{0}'")]
    Disabled(&'static str),

    /// The new list is implausibly smaller than the last known-good list
    #[error(
        "Refusing to replace {previous} items with {attempted}; confirm to overwrite anyway"
    )]
    ConsistencyGuard { previous: usize, attempted: usize },

    /// Private items could not be decrypted, so a replacement would lose them
    #[error("Private items of list '{0}' could not be decrypted")]
    PrivateItemsUnavailable(&'static str),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Category already exists: {0}")]
    CategoryExists(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Event build error: {0}")]
    Event(String),
}

impl ListError {
    /// Whether retrying the same call later can succeed without user action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ListError::StillSyncing(_) | ListError::Transport(_))
    }

    /// Whether the error needs an explicit user confirmation to proceed.
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, ListError::ConsistencyGuard { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_still_syncing_is_retryable() {
        assert!(ListError::StillSyncing("contacts").is_retryable());
        assert!(!ListError::Disabled("contacts").is_retryable());
    }

    #[test]
    fn test_guard_needs_confirmation() {
        let err = ListError::ConsistencyGuard {
            previous: 50,
            attempted: 4,
        };
        assert!(err.needs_confirmation());
        assert!(err.to_string().contains("50"));
        assert!(err.to_string().contains("4"));
    }

    #[test]
    fn test_crypto_error_wraps_agent_error() {
        let err: CryptoError = AgentError::Timeout.into();
        assert!(matches!(err, CryptoError::Agent(AgentError::Timeout)));
    }
}
