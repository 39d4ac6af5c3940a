//! NIP-51 event encoding: public items as tags, private items as an encrypted
//! JSON array of tag rows in the content.

use nostr_sdk::prelude::*;

use crate::definitions::ListDefinition;
use crate::error::ListError;
use crate::models::tag_utils::{event_tags, to_nostr_tags};
use crate::models::{ListItem, RawTag};
use crate::nostr::EventSigner;
use crate::tlog;

pub(crate) struct DecodedEvent<T> {
    pub items: Vec<T>,
    pub content_was_empty: bool,
    pub decryption_failed: bool,
}

/// Which tag decoder to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Encoding {
    Current,
    Legacy,
}

/// Decode one event. Private content is only decrypted when the event author is
/// the signer's own key; private content of any other author is reported as a
/// decryption failure.
pub(crate) async fn decode_event<D: ListDefinition>(
    definition: &D,
    signer: &dyn EventSigner,
    own_key: Option<&PublicKey>,
    event: &Event,
    encoding: Encoding,
) -> DecodedEvent<D::Item> {
    let added_at = event.created_at.as_u64();
    let tags = event_tags(event);
    let mut items = match encoding {
        Encoding::Current => definition.tags_to_items(&tags, added_at),
        Encoding::Legacy => definition.legacy_tags_to_items(&tags, added_at),
    };
    for item in items.iter_mut() {
        item.set_private(false);
    }

    let content = event.content.trim();
    if content.is_empty() {
        return DecodedEvent {
            items,
            content_was_empty: true,
            decryption_failed: false,
        };
    }
    // Kind-3 content written by other clients is a relay map, not ciphertext
    if content.starts_with('{') {
        return DecodedEvent {
            items,
            content_was_empty: false,
            decryption_failed: false,
        };
    }

    let mut decryption_failed = false;
    match own_key {
        Some(own) if *own == event.pubkey && definition.encrypts_private() => {
            match decrypt_private_tags(signer, content, own).await {
                Ok(rows) => {
                    let mut private = match encoding {
                        Encoding::Current => definition.tags_to_items(&rows, added_at),
                        Encoding::Legacy => definition.legacy_tags_to_items(&rows, added_at),
                    };
                    for item in private.iter_mut() {
                        item.set_private(true);
                    }
                    items.extend(private);
                }
                Err(e) => {
                    tlog!("SYNC", "{}: private content unreadable: {}", definition.name(), e);
                    decryption_failed = true;
                }
            }
        }
        _ => decryption_failed = true,
    }

    DecodedEvent {
        items,
        content_was_empty: false,
        decryption_failed,
    }
}

async fn decrypt_private_tags(
    signer: &dyn EventSigner,
    content: &str,
    own: &PublicKey,
) -> Result<Vec<RawTag>, ListError> {
    let plaintext = signer.decrypt(content, own).await?;
    serde_json::from_str(&plaintext)
        .map_err(|e| ListError::Event(format!("private content is not a tag array: {}", e)))
}

/// Build (but do not sign) one list event.
///
/// `header` rows (`d`, `title`) come first. Content is `""` when there are no
/// private items, so a stale encrypted payload on the relays gets overwritten.
pub(crate) async fn build_list_event<D: ListDefinition>(
    definition: &D,
    signer: &dyn EventSigner,
    author: &PublicKey,
    header: Vec<RawTag>,
    items: &[D::Item],
) -> Result<UnsignedEvent, ListError> {
    let mut rows = header;
    let mut private_rows: Vec<RawTag> = Vec::new();
    for item in items {
        if item.is_private() {
            if definition.encrypts_private() {
                private_rows.push(definition.item_to_tag(item));
            }
        } else {
            rows.push(definition.item_to_tag(item));
        }
    }

    let content = if private_rows.is_empty() {
        String::new()
    } else {
        let json = serde_json::to_string(&private_rows)
            .map_err(|e| ListError::Event(e.to_string()))?;
        signer.encrypt(&json, author).await?
    };

    Ok(EventBuilder::new(definition.kind(), content)
        .tags(to_nostr_tags(&rows))
        .build(*author))
}

/// Number of items an event built from `items` would carry.
pub(crate) fn publishable_count<D: ListDefinition>(definition: &D, items: &[D::Item]) -> usize {
    if definition.encrypts_private() {
        items.len()
    } else {
        items.iter().filter(|i| !i.is_private()).count()
    }
}
