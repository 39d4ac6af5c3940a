//! Object-safe view of an engine, for callers that handle every list kind the
//! same way (the CLI, the poller).

use async_trait::async_trait;
use nostr_sdk::prelude::*;
use serde::Serialize;

use crate::definitions::ListDefinition;
use crate::error::ListError;
use crate::models::ListItem;
use crate::store::ListState;
use crate::sync::engine::ListSyncEngine;
use crate::sync::types::{MigrationOutcome, PublishOutcome, ReplaceOutcome, SyncOutcome};

/// Kind-independent description of one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: String,
    pub is_private: bool,
    pub added_at: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub category: String,
    /// Full item as stored
    pub detail: serde_json::Value,
}

impl ItemSummary {
    pub fn from_item<T: ListItem>(item: &T) -> Self {
        Self {
            id: item.id().to_string(),
            is_private: item.is_private(),
            added_at: item.added_at(),
            category: item.category().to_string(),
            detail: serde_json::to_value(item).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Relay state of a list without its typed items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchSummary {
    pub found: bool,
    pub items: Vec<ItemSummary>,
    pub content_was_empty: bool,
    pub decryption_failed: bool,
    pub transport_failed: bool,
    pub categories: Vec<String>,
}

#[async_trait]
pub trait ManagedList: Send + Sync {
    fn name(&self) -> &'static str;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn summaries(&self) -> Vec<ItemSummary>;
    fn list_state(&self) -> ListState;
    fn set_enabled(&self, enabled: bool) -> Result<(), ListError>;
    fn remove_id(&self, id: &str) -> Result<bool, ListError>;
    fn save_to_file(&self) -> Result<usize, ListError>;
    fn restore_from_file(&self) -> Result<usize, ListError>;

    async fn fetch_summary(&self, author: &PublicKey) -> FetchSummary;
    async fn sync(&self, author: &PublicKey) -> Result<SyncOutcome, ListError>;
    async fn publish(&self, confirmed: bool) -> Result<PublishOutcome, ListError>;
    async fn replace(&self, author: &PublicKey, confirmed: bool)
        -> Result<ReplaceOutcome, ListError>;
    async fn migrate(&self, author: &PublicKey) -> Result<MigrationOutcome, ListError>;
}

#[async_trait]
impl<D: ListDefinition> ManagedList for ListSyncEngine<D> {
    fn name(&self) -> &'static str {
        ListSyncEngine::name(self)
    }

    fn len(&self) -> usize {
        ListSyncEngine::len(self)
    }

    fn summaries(&self) -> Vec<ItemSummary> {
        self.get_all().iter().map(ItemSummary::from_item).collect()
    }

    fn list_state(&self) -> ListState {
        self.state()
    }

    fn set_enabled(&self, enabled: bool) -> Result<(), ListError> {
        ListSyncEngine::set_enabled(self, enabled)
    }

    fn remove_id(&self, id: &str) -> Result<bool, ListError> {
        self.remove(id)
    }

    fn save_to_file(&self) -> Result<usize, ListError> {
        ListSyncEngine::save_to_file(self)
    }

    fn restore_from_file(&self) -> Result<usize, ListError> {
        ListSyncEngine::restore_from_file(self)
    }

    async fn fetch_summary(&self, author: &PublicKey) -> FetchSummary {
        let fetched = self.fetch_from_relays(author).await;
        FetchSummary {
            found: fetched.found,
            items: fetched.items.iter().map(ItemSummary::from_item).collect(),
            content_was_empty: fetched.content_was_empty,
            decryption_failed: fetched.decryption_failed,
            transport_failed: fetched.transport_failed,
            categories: fetched.categories,
        }
    }

    async fn sync(&self, author: &PublicKey) -> Result<SyncOutcome, ListError> {
        self.sync_from_relays(author).await
    }

    async fn publish(&self, confirmed: bool) -> Result<PublishOutcome, ListError> {
        if confirmed {
            self.publish_confirmed().await
        } else {
            ListSyncEngine::publish(self).await
        }
    }

    async fn replace(
        &self,
        author: &PublicKey,
        confirmed: bool,
    ) -> Result<ReplaceOutcome, ListError> {
        self.replace_from_relays(author, confirmed).await
    }

    async fn migrate(&self, author: &PublicKey) -> Result<MigrationOutcome, ListError> {
        ListSyncEngine::migrate(self, author).await
    }
}
