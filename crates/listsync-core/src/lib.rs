//! Three-tier synchronization of Nostr user lists (follows, mutes, bookmarks,
//! tribes) between in-memory state, local files and relays.

pub mod config;
pub mod constants;
pub mod definitions;
pub mod error;
pub mod lists;
pub mod logging;
pub mod models;
pub mod nostr;
pub mod secure_storage;
pub mod session;
pub mod slug;
pub mod store;
pub mod sync;

pub use config::{CoreConfig, GuardConfig, RelayConfig};
pub use error::{CryptoError, ListError, StorageError, TransportError};
pub use lists::{BookmarkList, FollowList, MuteList, NoteRef, TribeList};
pub use session::{ListKind, ListSession};
pub use sync::{EngineContext, FetchResult, ListSyncEngine, ManagedList, SyncPoller};
