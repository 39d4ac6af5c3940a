use nostr_sdk::prelude::*;

use super::ListDefinition;
use crate::constants::kinds;
use crate::models::tag_utils::{positional_tag, tag_name, tag_value};
use crate::models::{ContactItem, RawTag};

/// NIP-02 contact list: `["p", <pubkey>, <relay>?, <petname>?]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContactDefinition;

impl ListDefinition for ContactDefinition {
    type Item = ContactItem;

    fn name(&self) -> &'static str {
        "contacts"
    }

    fn kind(&self) -> Kind {
        Kind::from(kinds::CONTACT_LIST)
    }

    fn item_to_tag(&self, item: &ContactItem) -> RawTag {
        positional_tag(
            "p",
            &item.id,
            &[item.relay_hint.as_deref(), item.petname.as_deref()],
        )
    }

    fn tag_to_item(&self, tag: &[String], added_at: u64) -> Option<ContactItem> {
        if tag_name(tag) != Some("p") {
            return None;
        }
        let id = tag_value(tag, 1)?;
        Some(ContactItem {
            id: id.to_string(),
            is_private: false,
            added_at,
            relay_hint: tag_value(tag, 2).map(str::to_string),
            petname: tag_value(tag, 3).map(str::to_string),
        })
    }
}
