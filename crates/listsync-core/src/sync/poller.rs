//! Periodic background sync for consumers that want live-ish lists.
//!
//! Interval starts at `initial`, doubles after every cycle that found nothing
//! new (or failed), and resets once a cycle merges something.

use std::sync::Arc;
use std::time::Duration;

use nostr_sdk::prelude::*;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::constants::{POLL_INITIAL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::sync::managed::ManagedList;
use crate::tlog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(POLL_INITIAL_INTERVAL_SECS),
            max: Duration::from_secs(POLL_MAX_INTERVAL_SECS),
        }
    }
}

impl PollerConfig {
    pub fn next_interval(&self, current: Duration, found_new: bool) -> Duration {
        if found_new {
            self.initial
        } else {
            (current * 2).min(self.max)
        }
    }
}

struct Running {
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct SyncPoller {
    list: Arc<dyn ManagedList>,
    author: PublicKey,
    config: PollerConfig,
    running: Mutex<Option<Running>>,
}

impl SyncPoller {
    pub fn new(list: Arc<dyn ManagedList>, author: PublicKey, config: PollerConfig) -> Self {
        Self {
            list,
            author,
            config,
            running: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .map(|r| !r.handle.is_finished())
            .unwrap_or(false)
    }

    /// Spawn the loop on the current runtime. Returns `false` if it was
    /// already running.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock();
        if let Some(existing) = running.as_ref() {
            if !existing.handle.is_finished() {
                return false;
            }
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(run_poll_loop(
            self.list.clone(),
            self.author,
            self.config,
            cancel_rx,
        ));
        *running = Some(Running { cancel_tx, handle });
        tlog!("POLL", "{}: poller started", self.list.name());
        true
    }

    /// Signal the loop to exit and wait for it. No-op when not running.
    pub async fn stop(&self) {
        let running = self.running.lock().take();
        if let Some(running) = running {
            let _ = running.cancel_tx.send(true);
            let _ = running.handle.await;
            tlog!("POLL", "{}: poller stopped", self.list.name());
        }
    }
}

impl Drop for SyncPoller {
    fn drop(&mut self) {
        if let Some(running) = self.running.lock().take() {
            let _ = running.cancel_tx.send(true);
            running.handle.abort();
        }
    }
}

async fn run_poll_loop(
    list: Arc<dyn ManagedList>,
    author: PublicKey,
    config: PollerConfig,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let mut interval = config.initial;
    loop {
        if *cancel_rx.borrow() {
            break;
        }

        let found_new = match list.sync(&author).await {
            Ok(outcome) => {
                tlog!("POLL", "{}: cycle added {}", list.name(), outcome.added);
                outcome.added > 0
            }
            Err(e) => {
                tlog!("POLL", "{}: cycle failed: {}", list.name(), e);
                false
            }
        };
        interval = config.next_interval(interval, found_new);
        tlog!("POLL", "{}: next cycle in {:?}", list.name(), interval);

        tokio::select! {
            changed = cancel_rx.changed() => {
                // A dropped sender also ends the loop
                if changed.is_err() || *cancel_rx.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
