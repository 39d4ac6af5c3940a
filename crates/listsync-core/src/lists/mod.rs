//! Domain wrappers around one engine per list kind.

pub mod bookmarks;
pub mod contacts;
pub mod mutes;
pub mod tribes;

pub use bookmarks::BookmarkList;
pub use contacts::FollowList;
pub use mutes::{MuteIndex, MuteList, NoteRef};
pub use tribes::{CategoryDiff, TribeList};

use nostr_sdk::prelude::*;

use crate::error::ListError;

/// Accept npub or hex and return lowercase hex.
pub fn normalize_pubkey(input: &str) -> Result<String, ListError> {
    PublicKey::parse(input.trim())
        .map(|pk| pk.to_hex())
        .map_err(|e| ListError::InvalidItem(format!("{}: {}", input, e)))
}

/// Accept note1/nevent or hex and return lowercase hex.
pub fn normalize_event_id(input: &str) -> Result<String, ListError> {
    EventId::parse(input.trim())
        .map(|id| id.to_hex())
        .map_err(|e| ListError::InvalidItem(format!("{}: {}", input, e)))
}
