use serde::{Deserialize, Serialize};

use super::item::{impl_list_item_basics, now_secs, ListItem};

/// Kind of thing a bookmark points at, mapped to its NIP-51 tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkTagType {
    /// Note id (`e`)
    Event,
    /// Replaceable article coordinate `kind:pubkey:d` (`a`)
    Article,
    /// Hashtag (`t`)
    Hashtag,
    /// Web URL (`r`)
    Url,
}

impl BookmarkTagType {
    pub fn tag_name(self) -> &'static str {
        match self {
            BookmarkTagType::Event => "e",
            BookmarkTagType::Article => "a",
            BookmarkTagType::Hashtag => "t",
            BookmarkTagType::Url => "r",
        }
    }

    pub fn from_tag_name(name: &str) -> Option<Self> {
        match name {
            "e" => Some(BookmarkTagType::Event),
            "a" => Some(BookmarkTagType::Article),
            "t" => Some(BookmarkTagType::Hashtag),
            "r" => Some(BookmarkTagType::Url),
            _ => None,
        }
    }

    /// Best guess for a free-form bookmark target typed by a user.
    pub fn detect(target: &str) -> Self {
        if target.starts_with("http://") || target.starts_with("https://") {
            BookmarkTagType::Url
        } else if target.starts_with('#') {
            BookmarkTagType::Hashtag
        } else if target.splitn(3, ':').count() == 3 {
            BookmarkTagType::Article
        } else {
            BookmarkTagType::Event
        }
    }
}

/// One bookmarked note, article, hashtag or URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkItem {
    pub id: String,
    #[serde(default)]
    pub is_private: bool,
    pub added_at: u64,
    pub tag_type: BookmarkTagType,
}

impl BookmarkItem {
    pub fn new(target: impl Into<String>, tag_type: BookmarkTagType, is_private: bool) -> Self {
        let mut id = target.into();
        if tag_type == BookmarkTagType::Hashtag {
            id = id.trim_start_matches('#').to_lowercase();
        }
        Self {
            id,
            is_private,
            added_at: now_secs(),
            tag_type,
        }
    }

    /// Bookmark with the tag type guessed from the target string.
    pub fn detect(target: &str, is_private: bool) -> Self {
        Self::new(target, BookmarkTagType::detect(target), is_private)
    }
}

impl ListItem for BookmarkItem {
    impl_list_item_basics!();
}
