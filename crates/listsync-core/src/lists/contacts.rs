use std::sync::Arc;

use nostr_sdk::prelude::*;

use super::normalize_pubkey;
use crate::definitions::ContactDefinition;
use crate::error::ListError;
use crate::models::{ContactItem, ListItem};
use crate::sync::{EngineContext, ListSyncEngine};

/// The user's follow list (NIP-02), with optional private follows.
pub struct FollowList {
    engine: Arc<ListSyncEngine<ContactDefinition>>,
}

impl FollowList {
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            engine: Arc::new(ListSyncEngine::new(ContactDefinition, ctx)),
        }
    }

    pub fn engine(&self) -> &Arc<ListSyncEngine<ContactDefinition>> {
        &self.engine
    }

    /// Follow an npub or hex pubkey. Returns `false` if already followed.
    pub fn follow(&self, pubkey: &str, private: bool) -> Result<bool, ListError> {
        let hex = normalize_pubkey(pubkey)?;
        self.engine.add(ContactItem::new(hex, private))
    }

    /// Follow with a prepared item (relay hint, petname). The id is normalized.
    pub fn follow_with(&self, mut item: ContactItem) -> Result<bool, ListError> {
        item.id = normalize_pubkey(&item.id)?;
        self.engine.add(item)
    }

    pub fn unfollow(&self, pubkey: &str) -> Result<bool, ListError> {
        let hex = normalize_pubkey(pubkey)?;
        self.engine.remove(&hex)
    }

    pub fn is_following(&self, pubkey: &str) -> bool {
        normalize_pubkey(pubkey)
            .map(|hex| self.engine.contains(&hex))
            .unwrap_or(false)
    }

    pub fn set_petname(&self, pubkey: &str, petname: Option<String>) -> Result<bool, ListError> {
        let hex = normalize_pubkey(pubkey)?;
        self.engine
            .mutate(|items, _| match items.iter_mut().find(|i| i.id == hex) {
                Some(item) => {
                    let petname = petname.filter(|p| !p.is_empty());
                    if item.petname != petname {
                        item.petname = petname;
                        item.touch();
                    }
                    Ok(true)
                }
                None => Ok(false),
            })
    }

    /// Followed accounts as parsed keys; unparsable ids are skipped.
    pub fn pubkeys(&self) -> Vec<PublicKey> {
        self.engine
            .get_all()
            .iter()
            .filter_map(|item| PublicKey::from_hex(&item.id).ok())
            .collect()
    }
}
