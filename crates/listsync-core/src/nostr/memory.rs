//! In-memory relay for tests and offline use.
//!
//! Keeps the newest event per replaceable coordinate like a real relay, honours
//! kind-5 deletions by coordinate, and can be told to fail or stall.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use nostr_sdk::prelude::*;
use parking_lot::Mutex;

use crate::constants::kinds;
use crate::error::TransportError;
use crate::models::tag_utils::{event_tags, extract_all_tag_values, extract_tag_str};
use crate::nostr::transport::RelayTransport;

#[derive(Default)]
pub struct MemoryTransport {
    events: Mutex<Vec<Event>>,
    published: Mutex<Vec<Event>>,
    fail_fetch: AtomicBool,
    fail_publish: AtomicBool,
    fetch_delay_ms: AtomicUsize,
    fetch_calls: AtomicUsize,
}

fn is_replaceable(kind: u16) -> bool {
    kind == 0 || kind == kinds::CONTACT_LIST || (10_000..20_000).contains(&kind)
}

fn is_addressable(kind: u16) -> bool {
    (30_000..40_000).contains(&kind)
}

fn identifier(event: &Event) -> String {
    extract_tag_str(&event_tags(event), "d")
        .unwrap_or_default()
        .to_string()
}

/// `kind:pubkey:d` for addressable events, `kind:pubkey` for replaceable ones.
fn coordinate_key(event: &Event) -> Option<String> {
    let kind = event.kind.as_u16();
    if is_addressable(kind) {
        Some(format!("{}:{}:{}", kind, event.pubkey.to_hex(), identifier(event)))
    } else if is_replaceable(kind) {
        Some(format!("{}:{}", kind, event.pubkey.to_hex()))
    } else {
        None
    }
}

fn matches(filter: &Filter, event: &Event) -> bool {
    if let Some(ids) = &filter.ids {
        if !ids.contains(&event.id) {
            return false;
        }
    }
    if let Some(authors) = &filter.authors {
        if !authors.contains(&event.pubkey) {
            return false;
        }
    }
    if let Some(kinds) = &filter.kinds {
        if !kinds.contains(&event.kind) {
            return false;
        }
    }
    if let Some(since) = filter.since {
        if event.created_at < since {
            return false;
        }
    }
    if let Some(until) = filter.until {
        if event.created_at > until {
            return false;
        }
    }
    let tags = event_tags(event);
    for (letter, wanted) in filter.generic_tags.iter() {
        let name = letter.as_char().to_string();
        let values = extract_all_tag_values(&tags, &name);
        if !values.iter().any(|v| wanted.contains(v)) {
            return false;
        }
    }
    true
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an event as if another client had published it.
    pub fn seed(&self, event: Event) {
        self.store(event);
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Delay every fetch; combined with a short timeout this simulates a stalled relay.
    pub fn set_fetch_delay(&self, delay: Duration) {
        self.fetch_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// Every event accepted through [`RelayTransport::publish`], in order.
    pub fn published(&self) -> Vec<Event> {
        self.published.lock().clone()
    }

    pub fn publish_count(&self) -> usize {
        self.published.lock().len()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Events currently held, after replacement and deletion.
    pub fn stored(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    fn store(&self, event: Event) {
        let mut events = self.events.lock();

        if event.kind.as_u16() == kinds::DELETION {
            let coordinates = extract_all_tag_values(&event_tags(&event), "a");
            events.retain(|existing| {
                let doomed = existing.pubkey == event.pubkey
                    && existing.created_at <= event.created_at
                    && coordinate_key(existing)
                        .map(|key| coordinates.contains(&key))
                        .unwrap_or(false);
                !doomed
            });
        }

        if let Some(key) = coordinate_key(&event) {
            let newer_exists = events.iter().any(|existing| {
                coordinate_key(existing).as_deref() == Some(key.as_str())
                    && existing.created_at > event.created_at
            });
            if newer_exists {
                return;
            }
            events.retain(|existing| coordinate_key(existing).as_deref() != Some(key.as_str()));
        }
        events.push(event);
    }
}

#[async_trait]
impl RelayTransport for MemoryTransport {
    async fn fetch(
        &self,
        relays: &[String],
        filters: Vec<Filter>,
        timeout: Duration,
    ) -> Result<Vec<Event>, TransportError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if relays.is_empty() {
            return Err(TransportError::NoRelays);
        }

        let delay = Duration::from_millis(self.fetch_delay_ms.load(Ordering::SeqCst) as u64);
        if !delay.is_zero() {
            if delay >= timeout {
                tokio::time::sleep(timeout).await;
                return Err(TransportError::Timeout(timeout.as_secs()));
            }
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(TransportError::Relay("simulated fetch failure".to_string()));
        }

        let events = self.events.lock();
        let mut out: Vec<Event> = Vec::new();
        for filter in &filters {
            let mut hits: Vec<Event> = events
                .iter()
                .filter(|e| matches(filter, e))
                .filter(|e| !out.iter().any(|o| o.id == e.id))
                .cloned()
                .collect();
            hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            if let Some(limit) = filter.limit {
                hits.truncate(limit);
            }
            out.extend(hits);
        }
        Ok(out)
    }

    async fn publish(
        &self,
        relays: &[String],
        event: &Event,
        _timeout: Duration,
    ) -> Result<(), TransportError> {
        if relays.is_empty() {
            return Err(TransportError::NoRelays);
        }
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected("simulated publish failure".to_string()));
        }
        self.published.lock().push(event.clone());
        self.store(event.clone());
        Ok(())
    }
}
