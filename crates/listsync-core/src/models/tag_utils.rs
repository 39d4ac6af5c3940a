//! Tag helpers shared by the list codecs.
//!
//! Tags are handled as plain `Vec<String>` rows (`["p", "<hex>", "<relay>"]`) so the
//! list definitions stay pure and serializable; conversion to `nostr::Tag` only
//! happens at the event boundary.

use nostr_sdk::prelude::*;

/// A raw tag row.
pub type RawTag = Vec<String>;

/// Tag name (first slot), if any.
pub fn tag_name(tag: &[String]) -> Option<&str> {
    tag.first().map(String::as_str)
}

/// Non-empty value at `index`.
pub fn tag_value(tag: &[String], index: usize) -> Option<&str> {
    tag.get(index).map(String::as_str).filter(|v| !v.is_empty())
}

/// Extract the first value of the first tag named `tag_name`.
pub fn extract_tag_str<'a>(tags: &'a [RawTag], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|t| tag_name(t) == Some(name))
        .and_then(|t| t.get(1).map(String::as_str))
}

/// Extract all values for a given tag name (tags that repeat, e.g. "p", "t").
pub fn extract_all_tag_values(tags: &[RawTag], name: &str) -> Vec<String> {
    tags.iter()
        .filter(|t| tag_name(t) == Some(name))
        .filter_map(|t| tag_value(t, 1).map(str::to_string))
        .collect()
}

/// Check whether any tag carries the given name (regardless of value).
pub fn has_tag(tags: &[RawTag], name: &str) -> bool {
    tags.iter().any(|t| tag_name(t) == Some(name))
}

/// Build a positional tag row, dropping trailing absent slots.
///
/// Interior absent slots become `""` because tag grammar is positional
/// (`["p", pk, "", "alice"]`); trailing ones are omitted so older readers never
/// see an empty relay hint or petname.
pub fn positional_tag(name: &str, value: &str, optional: &[Option<&str>]) -> RawTag {
    let last_present = optional.iter().rposition(|slot| slot.is_some());
    let mut tag = vec![name.to_string(), value.to_string()];
    if let Some(last) = last_present {
        for slot in &optional[..=last] {
            tag.push(slot.unwrap_or_default().to_string());
        }
    }
    tag
}

/// Raw tag rows of a signed event.
pub fn event_tags(event: &Event) -> Vec<RawTag> {
    event.tags.iter().map(|t| t.as_slice().to_vec()).collect()
}

/// Convert raw rows back into `nostr::Tag`s, skipping rows that do not parse.
pub fn to_nostr_tags(rows: &[RawTag]) -> Vec<Tag> {
    rows.iter().filter_map(|row| Tag::parse(row).ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> RawTag {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_extract_tag_str() {
        let tags = vec![row(&["title", "My Title"]), row(&["d", "tribe:x"])];
        assert_eq!(extract_tag_str(&tags, "title"), Some("My Title"));
        assert_eq!(extract_tag_str(&tags, "nonexistent"), None);
    }

    #[test]
    fn test_extract_all_tag_values() {
        let tags = vec![
            row(&["t", "rust"]),
            row(&["t", "nostr"]),
            row(&["p", "abc"]),
            row(&["t", ""]),
        ];
        let hashtags = extract_all_tag_values(&tags, "t");
        assert_eq!(hashtags, vec!["rust".to_string(), "nostr".to_string()]);
    }

    #[test]
    fn test_has_tag() {
        let tags = vec![row(&["deleted"])];
        assert!(has_tag(&tags, "deleted"));
        assert!(!has_tag(&tags, "nonexistent"));
    }

    #[test]
    fn test_positional_tag_drops_trailing_absent_slots() {
        assert_eq!(positional_tag("p", "pk", &[None, None]), row(&["p", "pk"]));
        assert_eq!(
            positional_tag("p", "pk", &[Some("wss://r"), None]),
            row(&["p", "pk", "wss://r"])
        );
        assert_eq!(
            positional_tag("p", "pk", &[None, Some("alice")]),
            row(&["p", "pk", "", "alice"])
        );
    }

    #[test]
    fn test_event_tags_roundtrip() {
        let keys = Keys::generate();
        let rows = vec![row(&["t", "rust"]), row(&["r", "https://example.com"])];
        let event = EventBuilder::new(Kind::Custom(10003), "")
            .tags(to_nostr_tags(&rows))
            .sign_with_keys(&keys)
            .unwrap();
        assert_eq!(event_tags(&event), rows);
    }
}
