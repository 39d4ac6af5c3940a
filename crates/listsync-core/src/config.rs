use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_RELAYS, GUARD_MAX_SHRINK_RATIO, GUARD_MIN_BASELINE, RELAY_TIMEOUT_SECS,
};

/// Thresholds for the "dramatic shrink" consistency guard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuardConfig {
    pub enabled: bool,
    /// Largest tolerated shrink as a fraction of the previous count (0.5 = 50%)
    pub max_shrink_ratio: f64,
    /// Previous counts below this never trigger the guard
    pub min_baseline: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_shrink_ratio: GUARD_MAX_SHRINK_RATIO,
            min_baseline: GUARD_MIN_BASELINE,
        }
    }
}

impl GuardConfig {
    /// True when going from `previous` to `attempted` items needs confirmation.
    pub fn blocks(&self, previous: usize, attempted: usize) -> bool {
        if !self.enabled || previous < self.min_baseline || attempted >= previous {
            return false;
        }
        let floor = previous as f64 * (1.0 - self.max_shrink_ratio);
        (attempted as f64) < floor
    }
}

/// Relay sets and the timeout used for every relay round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayConfig {
    pub read_relays: Vec<String>,
    pub write_relays: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let relays: Vec<String> = DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect();
        Self {
            read_relays: relays.clone(),
            write_relays: relays,
            timeout_secs: RELAY_TIMEOUT_SECS,
        }
    }
}

impl RelayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub relays: RelayConfig,
    pub guard: GuardConfig,
    /// Publish again after a sync merged new items so other clients converge
    pub republish_on_new: bool,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            relays: RelayConfig::default(),
            guard: GuardConfig::default(),
            republish_on_new: false,
        }
    }

    /// Load from a JSON file, falling back to defaults when the file is missing.
    /// Environment overrides are applied afterwards.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// `LISTSYNC_DATA_DIR` and `LISTSYNC_RELAYS` (comma separated) take precedence.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("LISTSYNC_DATA_DIR") {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(relays) = std::env::var("LISTSYNC_RELAYS") {
            let parsed = parse_relay_list(&relays);
            if !parsed.is_empty() {
                self.relays.read_relays = parsed.clone();
                self.relays.write_relays = parsed;
            }
        }
    }

    /// Directory holding everything stored for one account.
    pub fn account_dir(&self, pubkey_hex: &str) -> PathBuf {
        self.data_dir.join(pubkey_hex)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|d| d.join("listsync"))
            .unwrap_or_else(|| PathBuf::from("listsync_data"));
        Self::new(data_dir)
    }
}

fn parse_relay_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_guard_blocks_dramatic_shrink() {
        let guard = GuardConfig::default();
        assert!(guard.blocks(50, 4));
        assert!(guard.blocks(50, 24));
        assert!(!guard.blocks(50, 25));
        assert!(!guard.blocks(50, 60));
    }

    #[test]
    fn test_guard_ignores_small_lists() {
        let guard = GuardConfig::default();
        assert!(!guard.blocks(9, 0));
        assert!(guard.blocks(10, 0));
    }

    #[test]
    fn test_guard_disabled() {
        let guard = GuardConfig {
            enabled: false,
            ..GuardConfig::default()
        };
        assert!(!guard.blocks(1000, 0));
    }

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config: CoreConfig = serde_json::from_str(r#"{"dataDir": "/tmp/ls"}"#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ls"));
        assert_eq!(config.relays.timeout_secs, RELAY_TIMEOUT_SECS);
        assert!(config.guard.enabled);
        assert!(!config.republish_on_new);
    }

    #[test]
    fn test_parse_custom_guard() {
        let json = r#"{
            "dataDir": "/tmp/ls",
            "guard": { "maxShrinkRatio": 0.8, "minBaseline": 3 },
            "relays": { "readRelays": ["wss://a"], "writeRelays": ["wss://b"] }
        }"#;
        let config: CoreConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.guard.min_baseline, 3);
        assert!(config.guard.enabled);
        assert_eq!(config.relays.read_relays, vec!["wss://a".to_string()]);
        assert_eq!(config.relays.write_relays, vec!["wss://b".to_string()]);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = CoreConfig::load(&dir.path().join("nope.json")).unwrap();
        assert!(!config.relays.read_relays.is_empty());
    }

    #[test]
    fn test_parse_relay_list() {
        assert_eq!(
            parse_relay_list(" wss://a , ,wss://b"),
            vec!["wss://a".to_string(), "wss://b".to_string()]
        );
    }

    #[test]
    fn test_timeout_never_zero() {
        let relays = RelayConfig {
            timeout_secs: 0,
            ..RelayConfig::default()
        };
        assert_eq!(relays.timeout(), Duration::from_secs(1));
    }
}
