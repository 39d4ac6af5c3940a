use serde::{Deserialize, Serialize};

use super::item::{impl_list_item_basics, now_secs, ListItem};

/// A followed account (NIP-02 `p` tag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactItem {
    /// Hex pubkey of the followed account
    pub id: String,
    #[serde(default)]
    pub is_private: bool,
    pub added_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub petname: Option<String>,
}

impl ContactItem {
    pub fn new(pubkey_hex: impl Into<String>, is_private: bool) -> Self {
        Self {
            id: pubkey_hex.into(),
            is_private,
            added_at: now_secs(),
            relay_hint: None,
            petname: None,
        }
    }

    pub fn with_relay_hint(mut self, relay: impl Into<String>) -> Self {
        self.relay_hint = Some(relay.into());
        self
    }

    pub fn with_petname(mut self, petname: impl Into<String>) -> Self {
        self.petname = Some(petname.into());
        self
    }
}

impl ListItem for ContactItem {
    impl_list_item_basics!();
}
