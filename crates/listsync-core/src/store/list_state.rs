//! Per-account flags and counters for every list kind, in one JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants::LIST_STATE_FILE;
use crate::error::StorageError;
use crate::store::atomic::{read_json, write_json_atomic};

/// One-time import from the legacy encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    #[default]
    Unmigrated,
    /// Claimed by a running migration; never valid across restarts
    Migrating,
    Migrated,
}

/// Result of the last relay merge, kept for UI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeTelemetry {
    pub fetched: usize,
    pub added: usize,
    pub at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListState {
    pub migration: MigrationState,
    /// Relay sync switch; local CRUD works either way
    pub enabled: bool,
    /// Item count of the last successful publish (guard baseline)
    pub last_published_count: Option<usize>,
    /// Categories present in the last successful publish (partitioned lists)
    pub last_published_categories: Vec<String>,
    pub last_merge: Option<MergeTelemetry>,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            migration: MigrationState::Unmigrated,
            enabled: true,
            last_published_count: None,
            last_published_categories: Vec::new(),
            last_merge: None,
        }
    }
}

/// `list_state.json` of one account, shared by every engine of that account.
#[derive(Debug)]
pub struct ListStateStore {
    path: PathBuf,
    states: Mutex<BTreeMap<String, ListState>>,
}

impl ListStateStore {
    /// Load the state file; a missing file means every list is fresh.
    ///
    /// A `Migrating` state read from disk belongs to a run that died mid-way,
    /// so it is reset to `Unmigrated`.
    pub fn open(account_dir: &Path) -> Result<Self, StorageError> {
        let path = account_dir.join(LIST_STATE_FILE);
        let mut states: BTreeMap<String, ListState> = read_json(&path)?.unwrap_or_default();
        for (name, state) in states.iter_mut() {
            if state.migration == MigrationState::Migrating {
                tracing::warn!("list_state: {} was left mid-migration, resetting", name);
                state.migration = MigrationState::Unmigrated;
            }
        }
        Ok(Self {
            path,
            states: Mutex::new(states),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, list: &str) -> ListState {
        self.states.lock().get(list).cloned().unwrap_or_default()
    }

    /// Apply `f` to the state of `list` and persist atomically.
    /// The in-memory state only changes when the write succeeded.
    pub fn update<R>(
        &self,
        list: &str,
        f: impl FnOnce(&mut ListState) -> R,
    ) -> Result<R, StorageError> {
        let mut states = self.states.lock();
        let mut next = states.clone();
        let result = f(next.entry(list.to_string()).or_default());
        write_json_atomic(&self.path, &next)?;
        *states = next;
        Ok(result)
    }

    /// Compare-and-set on the migration state. Returns false when the current
    /// state is not `from`.
    pub fn transition_migration(
        &self,
        list: &str,
        from: MigrationState,
        to: MigrationState,
    ) -> Result<bool, StorageError> {
        let mut states = self.states.lock();
        let current = states.get(list).map(|s| s.migration).unwrap_or_default();
        if current != from {
            return Ok(false);
        }
        let mut next = states.clone();
        next.entry(list.to_string()).or_default().migration = to;
        write_json_atomic(&self.path, &next)?;
        *states = next;
        Ok(true)
    }
}
