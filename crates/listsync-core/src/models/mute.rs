use serde::{Deserialize, Serialize};

use super::item::{impl_list_item_basics, now_secs, ListItem};

/// What a mute entry hides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuteTarget {
    /// An account (`p` tag)
    User,
    /// A thread or single note (`e` tag); replies below it are hidden too
    Thread,
    /// A lowercase word (`word` tag)
    Word,
    /// A hashtag without `#` (`t` tag)
    Hashtag,
}

impl MuteTarget {
    pub fn tag_name(self) -> &'static str {
        match self {
            MuteTarget::User => "p",
            MuteTarget::Thread => "e",
            MuteTarget::Word => "word",
            MuteTarget::Hashtag => "t",
        }
    }

    /// Prefix that keeps text mutes apart from each other in the stored id.
    /// Users and threads are keyed by their bare hex id.
    fn id_prefix(self) -> &'static str {
        match self {
            MuteTarget::User | MuteTarget::Thread => "",
            MuteTarget::Word => "word:",
            MuteTarget::Hashtag => "t:",
        }
    }

    pub fn from_tag_name(name: &str) -> Option<Self> {
        match name {
            "p" => Some(MuteTarget::User),
            "e" => Some(MuteTarget::Thread),
            "word" => Some(MuteTarget::Word),
            "t" => Some(MuteTarget::Hashtag),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuteItem {
    pub id: String,
    #[serde(default)]
    pub is_private: bool,
    pub added_at: u64,
    pub target: MuteTarget,
}

impl MuteItem {
    /// Words and hashtags are lowercased and stripped of a leading `#`.
    pub fn new(value: impl Into<String>, target: MuteTarget, is_private: bool) -> Self {
        let value = value.into();
        let value = match target {
            MuteTarget::Word | MuteTarget::Hashtag => value.trim_start_matches('#').to_lowercase(),
            MuteTarget::User | MuteTarget::Thread => value,
        };
        Self {
            id: Self::stored_id(target, &value),
            is_private,
            added_at: now_secs(),
            target,
        }
    }

    /// Build an item from a tag value as-is.
    pub fn from_tag_value(value: &str, target: MuteTarget, added_at: u64) -> Self {
        Self {
            id: Self::stored_id(target, value),
            is_private: false,
            added_at,
            target,
        }
    }

    /// Unique id of `value` muted as `target`.
    pub fn stored_id(target: MuteTarget, value: &str) -> String {
        format!("{}{}", target.id_prefix(), value)
    }

    /// The muted pubkey, event id, word or hashtag, as it goes on the wire.
    pub fn value(&self) -> &str {
        self.id
            .strip_prefix(self.target.id_prefix())
            .unwrap_or(&self.id)
    }

    pub fn user(pubkey_hex: impl Into<String>, is_private: bool) -> Self {
        Self::new(pubkey_hex, MuteTarget::User, is_private)
    }

    pub fn thread(event_id_hex: impl Into<String>, is_private: bool) -> Self {
        Self::new(event_id_hex, MuteTarget::Thread, is_private)
    }
}

impl ListItem for MuteItem {
    impl_list_item_basics!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_and_hashtag_ids_are_normalized() {
        let hashtag = MuteItem::new("#Bitcoin", MuteTarget::Hashtag, false);
        assert_eq!(hashtag.value(), "bitcoin");
        assert_eq!(hashtag.id, "t:bitcoin");
        let word = MuteItem::new("SPAM", MuteTarget::Word, true);
        assert_eq!(word.value(), "spam");
        assert_eq!(word.id, "word:spam");
        let user = MuteItem::user("ABC", false);
        assert_eq!(user.id, "ABC");
        assert_eq!(user.value(), "ABC");
    }

    #[test]
    fn test_same_text_as_word_and_hashtag_are_distinct() {
        let word = MuteItem::new("nostr", MuteTarget::Word, false);
        let hashtag = MuteItem::new("#nostr", MuteTarget::Hashtag, false);
        assert_ne!(word.id, hashtag.id);
        assert_eq!(word.value(), hashtag.value());
    }

    #[test]
    fn test_target_tag_names_roundtrip() {
        for target in [
            MuteTarget::User,
            MuteTarget::Thread,
            MuteTarget::Word,
            MuteTarget::Hashtag,
        ] {
            assert_eq!(MuteTarget::from_tag_name(target.tag_name()), Some(target));
        }
        assert_eq!(MuteTarget::from_tag_name("x"), None);
    }
}
