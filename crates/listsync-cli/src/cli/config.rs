use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use listsync_core::config::{CoreConfig, GuardConfig};
use serde::{Deserialize, Serialize};

/// CLI configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Root of all per-account data (caches, list files, state)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Relays used for both reading and writing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relays: Option<Vec<String>>,

    /// Relay timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<GuardConfig>,

    /// Publish again after a sync brought in new items
    #[serde(default)]
    pub republish_on_new: bool,

    /// Credentials for nostr authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,

    /// Socket of a running signing agent; takes precedence over credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_socket: Option<PathBuf>,

    /// NIP-46 remote signer URI; takes precedence over everything else
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bunker_uri: Option<String>,

    /// nsec identifying this client to the remote signer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bunker_app_key: Option<String>,
}

/// Nostr credentials configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// nsec (unencrypted) or ncryptsec (encrypted) key
    pub key: String,

    /// Password for ncryptsec decryption (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// `<config dir>/listsync/config.json`, used when no `--config` is given.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("listsync").join("config.json"))
    }

    /// Load the explicit file, else the default file when it exists, else defaults.
    pub fn resolve(explicit: Option<&Path>, default_path: Option<&Path>) -> Result<Self> {
        match (explicit, default_path) {
            (Some(path), _) => Self::load(path),
            (None, Some(path)) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Engine configuration: defaults, then this file, then environment overrides.
    pub fn core_config(&self) -> CoreConfig {
        let mut core = CoreConfig::default();
        if let Some(dir) = &self.data_dir {
            core.data_dir = dir.clone();
        }
        if let Some(relays) = self.relays.as_ref().filter(|r| !r.is_empty()) {
            core.relays.read_relays = relays.clone();
            core.relays.write_relays = relays.clone();
        }
        if let Some(timeout) = self.timeout_secs {
            core.relays.timeout_secs = timeout;
        }
        if let Some(guard) = self.guard {
            core.guard = guard;
        }
        core.republish_on_new = self.republish_on_new;
        core.apply_env_overrides();
        core
    }
}
