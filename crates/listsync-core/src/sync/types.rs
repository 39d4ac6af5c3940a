use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{CoreConfig, GuardConfig, RelayConfig};
use crate::nostr::{EventSigner, RelayTransport};
use crate::store::ListStateStore;

/// Collaborators shared by every engine of one account.
#[derive(Clone)]
pub struct EngineContext {
    pub account_dir: PathBuf,
    pub signer: Arc<dyn EventSigner>,
    pub transport: Arc<dyn RelayTransport>,
    pub relays: RelayConfig,
    pub guard: GuardConfig,
    pub republish_on_new: bool,
    pub state: Arc<ListStateStore>,
}

impl EngineContext {
    pub fn from_config(
        config: &CoreConfig,
        account_dir: PathBuf,
        signer: Arc<dyn EventSigner>,
        transport: Arc<dyn RelayTransport>,
        state: Arc<ListStateStore>,
    ) -> Self {
        Self {
            account_dir,
            signer,
            transport,
            relays: config.relays.clone(),
            guard: config.guard,
            republish_on_new: config.republish_on_new,
            state,
        }
    }
}

/// Read-only view of what the relays hold for one list.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult<T> {
    /// Public and private items, each tagged with its visibility
    pub items: Vec<T>,
    /// At least one current event was found
    pub found: bool,
    /// Every current event had `""` content: there are no private items
    pub content_was_empty: bool,
    /// Some content was present but could not be decrypted or parsed
    pub decryption_failed: bool,
    /// Live category names (partitioned lists only, root excluded)
    pub categories: Vec<String>,
    /// Item id to category name (partitioned lists only)
    pub category_assignments: HashMap<String, String>,
    /// Current events the items were read from
    pub event_count: usize,
    pub newest_created_at: Option<u64>,
    /// Browser-tier generation when the fetch started
    pub generation: u64,
    /// The relays could not be reached; treated like "nothing found"
    pub transport_failed: bool,
}

impl<T> FetchResult<T> {
    pub fn empty(generation: u64) -> Self {
        Self {
            items: Vec::new(),
            found: false,
            content_was_empty: true,
            decryption_failed: false,
            categories: Vec::new(),
            category_assignments: HashMap::new(),
            event_count: 0,
            newest_created_at: None,
            generation,
            transport_failed: false,
        }
    }

    pub fn private_count(&self) -> usize
    where
        T: crate::models::ListItem,
    {
        self.items.iter().filter(|i| i.is_private()).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    pub fetched: usize,
    pub added: usize,
    pub updated: usize,
    pub total: usize,
    pub republished: bool,
    pub decryption_failed: bool,
    /// The merge was dropped because the Browser tier changed meanwhile
    pub discarded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishOutcome {
    /// Signed events broadcast, retractions included
    pub events: usize,
    pub public_items: usize,
    pub private_items: usize,
    /// Categories announced as deleted
    pub retracted: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    Migrated { imported: usize, added: usize },
    AlreadyMigrated,
    /// Another call holds the migration claim
    InProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced { previous: usize, total: usize },
    /// Nothing on the relays; the Browser tier is untouched
    NothingFound,
}
