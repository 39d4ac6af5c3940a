use nostr_sdk::prelude::*;

use super::{LegacyFormat, ListDefinition};
use crate::constants::{kinds, LEGACY_BOOKMARK_IDENTIFIER};
use crate::models::tag_utils::{tag_name, tag_value};
use crate::models::{BookmarkItem, BookmarkTagType, RawTag};

/// NIP-51 bookmark list (kind 10003).
///
/// Imports the older kind-30001 `d=bookmark` categorized list on first run.
#[derive(Debug, Default, Clone, Copy)]
pub struct BookmarkDefinition;

impl ListDefinition for BookmarkDefinition {
    type Item = BookmarkItem;

    fn name(&self) -> &'static str {
        "bookmarks"
    }

    fn kind(&self) -> Kind {
        Kind::from(kinds::BOOKMARK_LIST)
    }

    fn item_to_tag(&self, item: &BookmarkItem) -> RawTag {
        vec![item.tag_type.tag_name().to_string(), item.id.clone()]
    }

    fn tag_to_item(&self, tag: &[String], added_at: u64) -> Option<BookmarkItem> {
        let tag_type = BookmarkTagType::from_tag_name(tag_name(tag)?)?;
        let id = tag_value(tag, 1)?;
        Some(BookmarkItem {
            id: id.to_string(),
            is_private: false,
            added_at,
            tag_type,
        })
    }

    fn legacy(&self) -> Option<LegacyFormat> {
        Some(LegacyFormat {
            kind: kinds::LEGACY_BOOKMARKS,
            identifier: Some(LEGACY_BOOKMARK_IDENTIFIER),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> RawTag {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_roundtrip_every_tag_type() {
        let def = BookmarkDefinition;
        for (id, tag_type) in [
            ("e".repeat(64), BookmarkTagType::Event),
            (format!("30023:{}:post", "f".repeat(64)), BookmarkTagType::Article),
            ("rust".to_string(), BookmarkTagType::Hashtag),
            ("https://example.com".to_string(), BookmarkTagType::Url),
        ] {
            let item = BookmarkItem {
                id,
                is_private: false,
                added_at: 100,
                tag_type,
            };
            let tag = def.item_to_tag(&item);
            let decoded = def.tag_to_item(&tag, 100).unwrap();
            assert_eq!(decoded, item);
            assert_eq!(def.item_to_tag(&decoded), tag);
        }
    }

    #[test]
    fn test_legacy_tags_skip_identifier() {
        let def = BookmarkDefinition;
        let tags = vec![
            row(&["d", "bookmark"]),
            row(&["e", &"1".repeat(64)]),
            row(&["r", "https://nostr.com"]),
        ];
        let items = def.legacy_tags_to_items(&tags, 5);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].tag_type, BookmarkTagType::Url);
    }

    #[test]
    fn test_legacy_format() {
        let legacy = BookmarkDefinition.legacy().unwrap();
        assert_eq!(legacy.kind, 30001);
        assert_eq!(legacy.identifier, Some("bookmark"));
    }
}
