use serde::{Deserialize, Serialize};

use super::item::{impl_list_item_basics, now_secs, ListItem};

/// Display name of the root category in events and files.
pub const ROOT_CATEGORY_TITLE: &str = "root";

/// Membership of one account in a tribe category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TribeMember {
    /// Hex pubkey of the member
    pub id: String,
    #[serde(default)]
    pub is_private: bool,
    pub added_at: u64,
    /// Category name; empty means root/uncategorized
    #[serde(default)]
    pub category: String,
}

impl TribeMember {
    pub fn new(pubkey_hex: impl Into<String>, category: impl Into<String>, is_private: bool) -> Self {
        Self {
            id: pubkey_hex.into(),
            is_private,
            added_at: now_secs(),
            category: category.into(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.category.is_empty()
    }
}

impl ListItem for TribeMember {
    impl_list_item_basics!();

    fn category(&self) -> &str {
        &self.category
    }

    fn set_category(&mut self, category: &str) {
        self.category = category.to_string();
    }
}
