//! Mute list with the cascading "is this note downstream of something muted" check.
//!
//! Lookups go through [`MuteIndex`], rebuilt from the Browser tier whenever the
//! engine generation moved and patched in place by mute/unmute.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use nostr_sdk::prelude::*;
use parking_lot::{Mutex, RwLock};

use super::{normalize_event_id, normalize_pubkey};
use crate::definitions::MuteDefinition;
use crate::error::ListError;
use crate::models::tag_utils::{event_tags, tag_name, tag_value};
use crate::models::{MuteItem, MuteTarget};
use crate::sync::{EngineContext, ListSyncEngine};

/// Longest parent chain followed before giving up
const MAX_ANCESTOR_DEPTH: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MuteIndex {
    pub users: HashSet<String>,
    pub threads: HashSet<String>,
    pub words: HashSet<String>,
    pub hashtags: HashSet<String>,
    generation: u64,
}

impl MuteIndex {
    pub fn build(items: &[MuteItem], generation: u64) -> Self {
        let mut index = Self {
            generation,
            ..Self::default()
        };
        for item in items {
            index.insert(item);
        }
        index
    }

    fn set_for(&mut self, target: MuteTarget) -> &mut HashSet<String> {
        match target {
            MuteTarget::User => &mut self.users,
            MuteTarget::Thread => &mut self.threads,
            MuteTarget::Word => &mut self.words,
            MuteTarget::Hashtag => &mut self.hashtags,
        }
    }

    fn key(item: &MuteItem) -> String {
        match item.target {
            MuteTarget::Word | MuteTarget::Hashtag => item.value().to_lowercase(),
            MuteTarget::User | MuteTarget::Thread => item.value().to_string(),
        }
    }

    pub fn insert(&mut self, item: &MuteItem) {
        self.set_for(item.target).insert(Self::key(item));
    }

    pub fn remove(&mut self, item: &MuteItem) {
        let key = Self::key(item);
        self.set_for(item.target).remove(&key);
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.threads.is_empty()
            && self.words.is_empty()
            && self.hashtags.is_empty()
    }
}

/// The parts of a note that matter for muting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteRef {
    pub id: String,
    pub author: Option<String>,
    pub parent: Option<String>,
    pub root: Option<String>,
}

impl NoteRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Read root/parent from NIP-10 `e` tags: marked tags first, positional
    /// (first = root, last = parent) for old unmarked notes.
    pub fn from_event(event: &Event) -> Self {
        let tags = event_tags(event);
        let e_tags: Vec<&Vec<String>> = tags.iter().filter(|t| tag_name(t) == Some("e")).collect();

        let marked = |marker: &str| {
            e_tags
                .iter()
                .find(|t| tag_value(t, 3) == Some(marker))
                .and_then(|t| tag_value(t, 1))
                .map(str::to_string)
        };
        let mut root = marked("root");
        let mut parent = marked("reply");

        let any_marked = e_tags
            .iter()
            .any(|t| matches!(tag_value(t, 3), Some("root") | Some("reply")));
        if !any_marked && !e_tags.is_empty() {
            root = e_tags.first().and_then(|t| tag_value(t, 1)).map(str::to_string);
            parent = e_tags.last().and_then(|t| tag_value(t, 1)).map(str::to_string);
        }
        // A direct reply to the root only carries the root marker
        if parent.is_none() {
            parent = root.clone();
        }

        Self {
            id: event.id.to_hex(),
            author: Some(event.pubkey.to_hex()),
            parent,
            root,
        }
    }
}

pub struct MuteList {
    engine: Arc<ListSyncEngine<MuteDefinition>>,
    index: RwLock<MuteIndex>,
    /// note id -> parent id, learned from notes seen by the consumer
    reply_parents: Mutex<HashMap<String, String>>,
}

impl MuteList {
    pub fn new(ctx: EngineContext) -> Self {
        let engine = Arc::new(ListSyncEngine::new(MuteDefinition, ctx));
        let index = MuteIndex::build(&engine.get_all(), engine.generation());
        Self {
            engine,
            index: RwLock::new(index),
            reply_parents: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &Arc<ListSyncEngine<MuteDefinition>> {
        &self.engine
    }

    /// Rebuild when a bulk operation (sync, restore, migrate) moved the
    /// generation past the one the index was built from.
    fn fresh_index(&self) -> parking_lot::RwLockReadGuard<'_, MuteIndex> {
        let generation = self.engine.generation();
        {
            let index = self.index.read();
            if index.generation == generation {
                return index;
            }
        }
        let rebuilt = MuteIndex::build(&self.engine.get_all(), generation);
        *self.index.write() = rebuilt;
        self.index.read()
    }

    /// Apply a single-item change to the index in place. Only valid when the
    /// index was current right before the mutation and nothing else committed
    /// since; otherwise it stays behind and [`Self::fresh_index`] rebuilds it.
    fn patch_index(&self, before: u64, patch: impl FnOnce(&mut MuteIndex)) {
        let mut index = self.index.write();
        let after = self.engine.generation();
        if index.generation == before && after == before + 1 {
            patch(&mut index);
            index.generation = after;
        }
    }

    fn add_and_index(&self, item: MuteItem) -> Result<bool, ListError> {
        let indexed = item.clone();
        let before = self.engine.generation();
        let added = self.engine.add(item)?;
        if added {
            self.patch_index(before, |index| index.insert(&indexed));
        }
        Ok(added)
    }

    pub fn mute_user(&self, pubkey: &str, private: bool) -> Result<bool, ListError> {
        let hex = normalize_pubkey(pubkey)?;
        self.add_and_index(MuteItem::user(hex, private))
    }

    pub fn mute_thread(&self, event_id: &str, private: bool) -> Result<bool, ListError> {
        let hex = normalize_event_id(event_id)?;
        self.add_and_index(MuteItem::thread(hex, private))
    }

    pub fn mute_word(&self, word: &str, private: bool) -> Result<bool, ListError> {
        let item = MuteItem::new(word.trim(), MuteTarget::Word, private);
        if item.value().is_empty() {
            return Err(ListError::InvalidItem("empty mute word".to_string()));
        }
        self.add_and_index(item)
    }

    pub fn mute_hashtag(&self, hashtag: &str, private: bool) -> Result<bool, ListError> {
        let item = MuteItem::new(hashtag.trim(), MuteTarget::Hashtag, private);
        if item.value().is_empty() {
            return Err(ListError::InvalidItem("empty hashtag".to_string()));
        }
        self.add_and_index(item)
    }

    /// Remove a mute entry by its stored id.
    pub fn unmute(&self, id: &str) -> Result<bool, ListError> {
        let Some(existing) = self.engine.get(id) else {
            return Ok(false);
        };
        let before = self.engine.generation();
        let removed = self.engine.remove(id)?;
        if removed {
            self.patch_index(before, |index| index.remove(&existing));
        }
        Ok(removed)
    }

    pub fn unmute_word(&self, word: &str) -> Result<bool, ListError> {
        let item = MuteItem::new(word.trim(), MuteTarget::Word, false);
        self.unmute(&item.id)
    }

    pub fn unmute_hashtag(&self, hashtag: &str) -> Result<bool, ListError> {
        let item = MuteItem::new(hashtag.trim(), MuteTarget::Hashtag, false);
        self.unmute(&item.id)
    }

    /// Remember that `note_id` replies to `parent_id`, so deeper replies can be
    /// traced back to a muted ancestor.
    pub fn observe_reply(&self, note_id: &str, parent_id: &str) {
        if note_id != parent_id {
            self.reply_parents
                .lock()
                .insert(note_id.to_string(), parent_id.to_string());
        }
    }

    pub fn observe_event(&self, event: &Event) -> NoteRef {
        let note = NoteRef::from_event(event);
        if let Some(parent) = &note.parent {
            self.observe_reply(&note.id, parent);
        }
        note
    }

    pub fn is_user_muted(&self, pubkey_hex: &str) -> bool {
        self.fresh_index().users.contains(pubkey_hex)
    }

    /// True when the note, its parent, its root, its author, or any observed
    /// ancestor is muted.
    pub fn is_note_muted(&self, note: &NoteRef) -> bool {
        let index = self.fresh_index();
        if index.threads.is_empty() && index.users.is_empty() {
            return false;
        }
        if let Some(author) = &note.author {
            if index.users.contains(author) {
                return true;
            }
        }
        for id in [Some(&note.id), note.parent.as_ref(), note.root.as_ref()]
            .into_iter()
            .flatten()
        {
            if index.threads.contains(id) {
                return true;
            }
        }

        let parents = self.reply_parents.lock();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut cursor = note.parent.as_deref().or_else(|| parents.get(&note.id).map(String::as_str));
        let mut depth = 0;
        while let Some(current) = cursor {
            if depth >= MAX_ANCESTOR_DEPTH || !visited.insert(current) {
                break;
            }
            if index.threads.contains(current) {
                return true;
            }
            cursor = parents.get(current).map(String::as_str);
            depth += 1;
        }
        false
    }

    /// Whether `content` contains a muted word or hashtag.
    pub fn is_text_muted(&self, content: &str) -> bool {
        let index = self.fresh_index();
        if index.words.is_empty() && index.hashtags.is_empty() {
            return false;
        }
        let lowered = content.to_lowercase();

        for token in lowered.split(|c: char| c.is_whitespace()) {
            if let Some(tag) = token.strip_prefix('#') {
                let tag: String = tag.chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
                if index.hashtags.contains(&tag) {
                    return true;
                }
            }
        }

        let words: HashSet<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        index.words.iter().any(|muted| {
            if muted.contains(|c: char| !c.is_alphanumeric()) {
                lowered.contains(muted.as_str())
            } else {
                words.contains(muted.as_str())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_with_tags(keys: &Keys, tags: Vec<Tag>) -> Event {
        EventBuilder::text_note("reply")
            .tags(tags)
            .sign_with_keys(keys)
            .unwrap()
    }

    #[test]
    fn test_note_ref_marked_tags() {
        let keys = Keys::generate();
        let root = "a".repeat(64);
        let parent = "b".repeat(64);
        let event = note_with_tags(
            &keys,
            vec![
                Tag::parse(["e", root.as_str(), "", "root"]).unwrap(),
                Tag::parse(["e", parent.as_str(), "", "reply"]).unwrap(),
            ],
        );
        let note = NoteRef::from_event(&event);
        assert_eq!(note.root.as_deref(), Some(root.as_str()));
        assert_eq!(note.parent.as_deref(), Some(parent.as_str()));
        assert_eq!(note.author, Some(keys.public_key().to_hex()));
    }

    #[test]
    fn test_note_ref_positional_tags() {
        let keys = Keys::generate();
        let root = "c".repeat(64);
        let parent = "d".repeat(64);
        let event = note_with_tags(
            &keys,
            vec![
                Tag::parse(["e", root.as_str()]).unwrap(),
                Tag::parse(["e", parent.as_str()]).unwrap(),
            ],
        );
        let note = NoteRef::from_event(&event);
        assert_eq!(note.root.as_deref(), Some(root.as_str()));
        assert_eq!(note.parent.as_deref(), Some(parent.as_str()));
    }

    #[test]
    fn test_direct_reply_to_root() {
        let keys = Keys::generate();
        let root = "e".repeat(64);
        let event = note_with_tags(&keys, vec![Tag::parse(["e", root.as_str(), "", "root"]).unwrap()]);
        let note = NoteRef::from_event(&event);
        assert_eq!(note.parent.as_deref(), Some(root.as_str()));
    }

    #[test]
    fn test_index_build_and_remove() {
        let items = vec![
            MuteItem::user("a".repeat(64), false),
            MuteItem::new("#Spam", MuteTarget::Hashtag, true),
        ];
        let mut index = MuteIndex::build(&items, 3);
        assert!(index.users.contains(&"a".repeat(64)));
        assert!(index.hashtags.contains("spam"));
        index.remove(&items[0]);
        assert!(index.users.is_empty());
        assert!(!index.is_empty());
    }
}
