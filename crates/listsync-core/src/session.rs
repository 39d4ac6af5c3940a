//! One signed-in account: every list engine wired to the same signer,
//! transport and persisted state.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use nostr_sdk::prelude::*;

use crate::config::CoreConfig;
use crate::error::ListError;
use crate::lists::{BookmarkList, FollowList, MuteList, TribeList};
use crate::nostr::{EventSigner, RelayTransport};
use crate::store::ListStateStore;
use crate::sync::{EngineContext, ManagedList, MigrationOutcome};
use crate::tlog;

/// The list kinds a session manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Contacts,
    Mutes,
    Bookmarks,
    Tribes,
}

impl ListKind {
    pub const ALL: [ListKind; 4] = [
        ListKind::Contacts,
        ListKind::Mutes,
        ListKind::Bookmarks,
        ListKind::Tribes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Contacts => "contacts",
            ListKind::Mutes => "mutes",
            ListKind::Bookmarks => "bookmarks",
            ListKind::Tribes => "tribes",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = ListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contacts" | "follows" => Ok(ListKind::Contacts),
            "mutes" => Ok(ListKind::Mutes),
            "bookmarks" => Ok(ListKind::Bookmarks),
            "tribes" => Ok(ListKind::Tribes),
            other => Err(ListError::InvalidItem(format!("unknown list: {}", other))),
        }
    }
}

pub struct ListSession {
    author: PublicKey,
    ctx: EngineContext,
    pub follows: FollowList,
    pub mutes: MuteList,
    pub bookmarks: BookmarkList,
    pub tribes: TribeList,
}

impl ListSession {
    /// Build every list for the signer's account. Caches and persisted state
    /// live under `config.account_dir(<pubkey hex>)`.
    pub async fn open(
        config: &CoreConfig,
        signer: Arc<dyn EventSigner>,
        transport: Arc<dyn RelayTransport>,
    ) -> Result<Self, ListError> {
        let author = signer.public_key().await?;
        let account_dir = config.account_dir(&author.to_hex());
        let state = Arc::new(ListStateStore::open(&account_dir)?);
        let ctx = EngineContext::from_config(config, account_dir, signer, transport, state);
        tlog!("SESSION", "opened session for {}", author.to_hex());
        Ok(Self::with_context(author, ctx))
    }

    pub fn with_context(author: PublicKey, ctx: EngineContext) -> Self {
        Self {
            author,
            follows: FollowList::new(ctx.clone()),
            mutes: MuteList::new(ctx.clone()),
            bookmarks: BookmarkList::new(ctx.clone()),
            tribes: TribeList::new(ctx.clone()),
            ctx,
        }
    }

    pub fn author(&self) -> &PublicKey {
        &self.author
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Kind-independent handle on one list's engine.
    pub fn managed(&self, kind: ListKind) -> Arc<dyn ManagedList> {
        match kind {
            ListKind::Contacts => self.follows.engine().clone() as Arc<dyn ManagedList>,
            ListKind::Mutes => self.mutes.engine().clone() as Arc<dyn ManagedList>,
            ListKind::Bookmarks => self.bookmarks.engine().clone() as Arc<dyn ManagedList>,
            ListKind::Tribes => self.tribes.engine().clone() as Arc<dyn ManagedList>,
        }
    }

    /// Run the one-time legacy import for every list. Per-list failures are
    /// logged and do not stop the others.
    pub async fn migrate_all(&self) -> Vec<(ListKind, Result<MigrationOutcome, ListError>)> {
        let mut results = Vec::with_capacity(ListKind::ALL.len());
        for kind in ListKind::ALL {
            let list = self.managed(kind);
            if !list.list_state().enabled {
                continue;
            }
            let result = list.migrate(&self.author).await;
            if let Err(e) = &result {
                tracing::warn!("{}: migration failed: {}", kind, e);
            }
            results.push((kind, result));
        }
        results
    }
}
