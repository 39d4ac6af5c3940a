//! Relay transport seam.
//!
//! The engine only needs two calls from the network: fetch events matching
//! filters, and publish one signed event. Both carry an explicit timeout.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use nostr_sdk::prelude::*;
use parking_lot::Mutex;

use crate::error::TransportError;
use crate::tlog;

#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn fetch(
        &self,
        relays: &[String],
        filters: Vec<Filter>,
        timeout: Duration,
    ) -> Result<Vec<Event>, TransportError>;

    /// Succeeds when at least one relay accepted the event.
    async fn publish(
        &self,
        relays: &[String],
        event: &Event,
        timeout: Duration,
    ) -> Result<(), TransportError>;
}

/// [`RelayTransport`] backed by a shared `nostr_sdk::Client`.
///
/// Relays are added on first use; the pool never removes them.
pub struct RelayPool {
    client: Client,
    known: Mutex<HashSet<String>>,
}

impl Default for RelayPool {
    fn default() -> Self {
        Self::new(Client::default())
    }
}

impl RelayPool {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            known: Mutex::new(HashSet::new()),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn ensure_relays(&self, relays: &[String]) -> Result<(), TransportError> {
        if relays.is_empty() {
            return Err(TransportError::NoRelays);
        }
        let missing: Vec<String> = {
            let known = self.known.lock();
            relays
                .iter()
                .filter(|r| !known.contains(*r))
                .cloned()
                .collect()
        };
        if missing.is_empty() {
            return Ok(());
        }
        for url in &missing {
            if let Err(e) = self.client.add_relay(url.as_str()).await {
                tlog!("RELAY", "add_relay {} failed: {}", url, e);
                continue;
            }
            self.known.lock().insert(url.clone());
        }
        self.client.connect().await;
        Ok(())
    }

    pub async fn disconnect(&self) {
        self.client.disconnect().await;
        self.known.lock().clear();
    }
}

#[async_trait]
impl RelayTransport for RelayPool {
    async fn fetch(
        &self,
        relays: &[String],
        filters: Vec<Filter>,
        timeout: Duration,
    ) -> Result<Vec<Event>, TransportError> {
        self.ensure_relays(relays).await?;

        let mut events = Vec::new();
        for filter in filters {
            // Client-side timeout on top of the relay EOSE timeout
            let fetched = tokio::time::timeout(
                timeout + Duration::from_secs(1),
                self.client.fetch_events_from(relays, filter, timeout),
            )
            .await
            .map_err(|_| TransportError::Timeout(timeout.as_secs()))?
            .map_err(|e| TransportError::Relay(e.to_string()))?;
            events.extend(fetched);
        }
        tlog!("RELAY", "fetched {} events from {} relays", events.len(), relays.len());
        Ok(events)
    }

    async fn publish(
        &self,
        relays: &[String],
        event: &Event,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        self.ensure_relays(relays).await?;

        let output = tokio::time::timeout(timeout, self.client.send_event_to(relays, event))
            .await
            .map_err(|_| TransportError::Timeout(timeout.as_secs()))?
            .map_err(|e| TransportError::Relay(e.to_string()))?;

        if output.success.is_empty() {
            let reasons: Vec<String> = output
                .failed
                .iter()
                .map(|(url, reason)| format!("{}: {}", url, reason))
                .collect();
            return Err(TransportError::Rejected(reasons.join("; ")));
        }
        tlog!(
            "RELAY",
            "published kind {} to {}/{} relays",
            event.kind.as_u16(),
            output.success.len(),
            relays.len()
        );
        Ok(())
    }
}
