use nostr_sdk::prelude::*;

use super::{LegacyFormat, ListDefinition};
use crate::constants::{kinds, TRIBE_IDENTIFIER_PREFIX};
use crate::models::tag_utils::{tag_name, tag_value};
use crate::models::{RawTag, TribeMember};

/// Tribes: categorized contact groups, one NIP-51 follow set (kind 30000) per
/// category. The category travels in the event's `d` tag, not in member tags.
///
/// The first run imports the kind-3 contact list into the root category.
#[derive(Debug, Default, Clone, Copy)]
pub struct TribeDefinition;

impl ListDefinition for TribeDefinition {
    type Item = TribeMember;

    fn name(&self) -> &'static str {
        "tribes"
    }

    fn kind(&self) -> Kind {
        Kind::from(kinds::FOLLOW_SET)
    }

    fn is_partitioned(&self) -> bool {
        true
    }

    fn item_to_tag(&self, item: &TribeMember) -> RawTag {
        vec!["p".to_string(), item.id.clone()]
    }

    fn tag_to_item(&self, tag: &[String], added_at: u64) -> Option<TribeMember> {
        if tag_name(tag) != Some("p") {
            return None;
        }
        let id = tag_value(tag, 1)?;
        Some(TribeMember {
            id: id.to_string(),
            is_private: false,
            added_at,
            category: String::new(),
        })
    }

    fn legacy(&self) -> Option<LegacyFormat> {
        Some(LegacyFormat {
            kind: kinds::CONTACT_LIST,
            identifier: None,
        })
    }

    fn category_identifier(&self, category: &str) -> String {
        format!("{}{}", TRIBE_IDENTIFIER_PREFIX, category)
    }

    fn category_from_identifier(&self, identifier: &str) -> Option<String> {
        identifier
            .strip_prefix(TRIBE_IDENTIFIER_PREFIX)
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_member() {
        let def = TribeDefinition;
        let item = TribeMember {
            id: "9".repeat(64),
            is_private: false,
            added_at: 3,
            category: String::new(),
        };
        let tag = def.item_to_tag(&item);
        assert_eq!(def.tag_to_item(&tag, 3).unwrap(), item);
    }

    #[test]
    fn test_identifier_roundtrip() {
        let def = TribeDefinition;
        assert_eq!(def.category_identifier(""), "tribe:");
        assert_eq!(def.category_identifier("Friends"), "tribe:Friends");
        assert_eq!(def.category_from_identifier("tribe:"), Some(String::new()));
        assert_eq!(
            def.category_from_identifier("tribe:Friends"),
            Some("Friends".to_string())
        );
        assert_eq!(def.category_from_identifier("mute"), None);
    }

    #[test]
    fn test_is_partitioned() {
        assert!(TribeDefinition.is_partitioned());
    }
}
