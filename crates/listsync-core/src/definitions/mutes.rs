use nostr_sdk::prelude::*;

use super::ListDefinition;
use crate::constants::kinds;
use crate::models::tag_utils::{tag_name, tag_value};
use crate::models::{MuteItem, MuteTarget, RawTag};

/// NIP-51 mute list (kind 10000): `p` users, `e` threads, `t` hashtags, `word` words.
#[derive(Debug, Default, Clone, Copy)]
pub struct MuteDefinition;

impl ListDefinition for MuteDefinition {
    type Item = MuteItem;

    fn name(&self) -> &'static str {
        "mutes"
    }

    fn kind(&self) -> Kind {
        Kind::from(kinds::MUTE_LIST)
    }

    fn item_to_tag(&self, item: &MuteItem) -> RawTag {
        vec![item.target.tag_name().to_string(), item.value().to_string()]
    }

    fn tag_to_item(&self, tag: &[String], added_at: u64) -> Option<MuteItem> {
        let target = MuteTarget::from_tag_name(tag_name(tag)?)?;
        let value = tag_value(tag, 1)?;
        Some(MuteItem::from_tag_value(value, target, added_at))
    }
}
