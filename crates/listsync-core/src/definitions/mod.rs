//! Declarative descriptors, one per list kind.
//!
//! A definition knows the event kind and how a single item maps to and from a
//! tag row. It never touches the network or the filesystem.

pub mod bookmarks;
pub mod contacts;
pub mod mutes;
pub mod tribes;

pub use bookmarks::BookmarkDefinition;
pub use contacts::ContactDefinition;
pub use mutes::MuteDefinition;
pub use tribes::TribeDefinition;

use nostr_sdk::prelude::*;

use crate::models::{ListItem, RawTag};

/// Where a list lived before the current encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyFormat {
    pub kind: u16,
    /// `d` tag of the legacy event, for parameterized replaceable kinds
    pub identifier: Option<&'static str>,
}

pub trait ListDefinition: Send + Sync + 'static {
    type Item: ListItem;

    /// Stable short name used for file paths and persisted state keys.
    fn name(&self) -> &'static str;

    fn kind(&self) -> Kind;

    /// Whether private items travel encrypted in the event content.
    /// When false, private items stay local and are never published.
    fn encrypts_private(&self) -> bool {
        true
    }

    /// Whether the list publishes one event per category.
    fn is_partitioned(&self) -> bool {
        false
    }

    fn item_id<'a>(&self, item: &'a Self::Item) -> &'a str {
        item.id()
    }

    fn item_to_tag(&self, item: &Self::Item) -> RawTag;

    /// Decode one tag row. Rows that belong to other concerns (`d`, `title`,
    /// relay metadata) return `None`.
    fn tag_to_item(&self, tag: &[String], added_at: u64) -> Option<Self::Item>;

    fn tags_to_items(&self, tags: &[RawTag], added_at: u64) -> Vec<Self::Item> {
        tags.iter()
            .filter_map(|tag| self.tag_to_item(tag, added_at))
            .collect()
    }

    fn items_to_tags(&self, items: &[Self::Item]) -> Vec<RawTag> {
        items.iter().map(|item| self.item_to_tag(item)).collect()
    }

    /// Encoding to import from on first run, if the list had one.
    fn legacy(&self) -> Option<LegacyFormat> {
        None
    }

    fn legacy_tags_to_items(&self, tags: &[RawTag], added_at: u64) -> Vec<Self::Item> {
        self.tags_to_items(tags, added_at)
    }

    /// `d` tag of the event carrying `category` (partitioned lists only).
    fn category_identifier(&self, category: &str) -> String {
        category.to_string()
    }

    /// Inverse of [`ListDefinition::category_identifier`]; `None` for foreign `d` tags.
    fn category_from_identifier(&self, identifier: &str) -> Option<String> {
        Some(identifier.to_string())
    }
}
