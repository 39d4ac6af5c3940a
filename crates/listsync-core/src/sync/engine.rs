//! The list synchronization engine.
//!
//! One engine per list kind. The Browser tier (in-memory items, mirrored to the
//! browser cache) is authoritative; the File and Relay tiers only change on
//! explicit save/publish, and only feed back on explicit restore/sync.
//!
//! Writes to the Browser tier are serialized by the `syncing` flag: a bulk
//! relay operation takes it for its whole duration and single-item mutations
//! are rejected with [`ListError::StillSyncing`] while it is held.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use nostr_sdk::prelude::*;
use parking_lot::Mutex;

use crate::constants::{kinds, DELETED_TAG};
use crate::definitions::ListDefinition;
use crate::error::{ListError, TransportError};
use crate::logging::short;
use crate::models::tag_utils::{event_tags, extract_tag_str, has_tag};
use crate::models::{ListItem, RawTag, ROOT_CATEGORY_TITLE};
use crate::store::browser_cache::{self, BrowserSnapshot};
use crate::store::{FileBackend, ListState, MergeTelemetry, MigrationState};
use crate::sync::codec::{self, build_list_event, decode_event, Encoding};
use crate::sync::merge::{dedup_newest, merge_items};
use crate::sync::types::{
    EngineContext, FetchResult, MigrationOutcome, PublishOutcome, ReplaceOutcome, SyncOutcome,
};
use crate::tlog;

struct BrowserState<T> {
    items: Vec<T>,
    categories: Vec<String>,
    /// Bumped on every change; stale fetch results compare against it
    generation: u64,
}

/// Releases the syncing flag when dropped, including when the owning future
/// is abandoned mid-await.
struct SyncGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct ListSyncEngine<D: ListDefinition> {
    definition: D,
    ctx: EngineContext,
    files: FileBackend,
    cache_path: PathBuf,
    inner: Mutex<BrowserState<D::Item>>,
    syncing: AtomicBool,
}

impl<D: ListDefinition> ListSyncEngine<D> {
    /// Create the engine and load the Browser tier from its cache.
    pub fn new(definition: D, ctx: EngineContext) -> Self {
        let name = definition.name();
        let cache_path = browser_cache::cache_path(&ctx.account_dir, name);
        let snapshot: BrowserSnapshot<D::Item> = browser_cache::load_cache(&cache_path);
        let files = FileBackend::new(&ctx.account_dir, name, definition.is_partitioned());
        tracing::debug!("{}: loaded {} cached items", name, snapshot.items.len());

        Self {
            definition,
            ctx,
            files,
            cache_path,
            inner: Mutex::new(BrowserState {
                items: snapshot.items,
                categories: snapshot.categories,
                generation: 0,
            }),
            syncing: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &'static str {
        self.definition.name()
    }

    pub fn definition(&self) -> &D {
        &self.definition
    }

    pub fn file_backend(&self) -> &FileBackend {
        &self.files
    }

    // ===== Browser tier reads =====

    pub fn get_all(&self) -> Vec<D::Item> {
        self.inner.lock().items.clone()
    }

    pub fn get(&self, id: &str) -> Option<D::Item> {
        self.inner.lock().items.iter().find(|i| i.id() == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().items.iter().any(|i| i.id() == id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Known non-root categories, including ones without members.
    pub fn categories(&self) -> Vec<String> {
        self.inner.lock().categories.clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    // ===== Persisted flags =====

    pub fn state(&self) -> ListState {
        self.ctx.state.get(self.name())
    }

    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), ListError> {
        self.ctx.state.update(self.name(), |s| s.enabled = enabled)?;
        tlog!("SYNC", "{}: relay sync {}", self.name(), if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    fn ensure_enabled(&self) -> Result<(), ListError> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(ListError::Disabled(self.name()))
        }
    }

    fn ensure_not_syncing(&self) -> Result<(), ListError> {
        if self.is_syncing() {
            Err(ListError::StillSyncing(self.name()))
        } else {
            Ok(())
        }
    }

    fn try_begin_sync(&self) -> Result<SyncGuard<'_>, ListError> {
        self.syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| SyncGuard {
                flag: &self.syncing,
            })
            .map_err(|_| ListError::StillSyncing(self.name()))
    }

    // ===== Browser tier writes =====

    /// Add an item. Returns `false` when an item with the same id exists.
    pub fn add(&self, item: D::Item) -> Result<bool, ListError> {
        if item.id().trim().is_empty() {
            return Err(ListError::InvalidItem("empty id".to_string()));
        }
        self.mutate(|items, _| {
            if items.iter().any(|i| i.id() == item.id()) {
                return Ok(false);
            }
            items.push(item);
            Ok(true)
        })
    }

    /// Remove by id. Returns `false` when nothing matched.
    pub fn remove(&self, id: &str) -> Result<bool, ListError> {
        self.mutate(|items, _| {
            let before = items.len();
            items.retain(|i| i.id() != id);
            Ok(items.len() != before)
        })
    }

    /// Move an existing item between the public and private side.
    pub fn set_private(&self, id: &str, private: bool) -> Result<bool, ListError> {
        self.mutate(|items, _| match items.iter_mut().find(|i| i.id() == id) {
            Some(item) => {
                if item.is_private() != private {
                    item.set_private(private);
                    item.touch();
                }
                Ok(true)
            }
            None => Ok(false),
        })
    }

    /// Run `f` on a copy of the Browser tier and commit it if `f` succeeds.
    /// Rejected while a bulk sync holds the guard.
    pub(crate) fn mutate<R>(
        &self,
        f: impl FnOnce(&mut Vec<D::Item>, &mut Vec<String>) -> Result<R, ListError>,
    ) -> Result<R, ListError> {
        self.ensure_not_syncing()?;
        self.apply(f)
    }

    /// Commit without the guard check; callers either hold the guard or came
    /// through [`Self::mutate`].
    fn apply<R>(
        &self,
        f: impl FnOnce(&mut Vec<D::Item>, &mut Vec<String>) -> Result<R, ListError>,
    ) -> Result<R, ListError> {
        let mut state = self.inner.lock();
        let mut items = state.items.clone();
        let mut categories = state.categories.clone();
        let result = f(&mut items, &mut categories)?;
        if items != state.items || categories != state.categories {
            browser_cache::save_cache(&self.cache_path, &items, &categories)?;
            state.items = items;
            state.categories = categories;
            state.generation += 1;
        }
        Ok(result)
    }

    fn snapshot(&self) -> (Vec<D::Item>, Vec<String>) {
        let state = self.inner.lock();
        (state.items.clone(), state.categories.clone())
    }

    // ===== Relay tier =====

    async fn fetch_events(&self, filters: Vec<Filter>) -> Result<Vec<Event>, TransportError> {
        let timeout = self.ctx.relays.timeout();
        let fetch = self
            .ctx
            .transport
            .fetch(&self.ctx.relays.read_relays, filters, timeout);
        match tokio::time::timeout(timeout + Duration::from_secs(1), fetch).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout.as_secs())),
        }
    }

    async fn broadcast(&self, event: &Event) -> Result<(), TransportError> {
        let timeout = self.ctx.relays.timeout();
        let publish = self
            .ctx
            .transport
            .publish(&self.ctx.relays.write_relays, event, timeout);
        match tokio::time::timeout(timeout + Duration::from_secs(1), publish).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout.as_secs())),
        }
    }

    /// Fetch the current relay state of this list for `author`.
    ///
    /// Read-only: the Browser tier is not touched. Relay failures produce an
    /// empty result with `transport_failed` set instead of an error.
    pub async fn fetch_from_relays(&self, author: &PublicKey) -> FetchResult<D::Item> {
        let generation = self.generation();
        let filter = Filter::new().author(*author).kind(self.definition.kind());

        let events = match self.fetch_events(vec![filter]).await {
            Ok(events) => events,
            Err(e) => {
                tlog!("SYNC", "{}: fetch for {} failed: {}", self.name(), short(&author.to_hex()), e);
                tracing::warn!("{}: relay fetch failed: {}", self.name(), e);
                let mut result = FetchResult::empty(generation);
                result.transport_failed = true;
                return result;
            }
        };
        let events: Vec<Event> = events
            .into_iter()
            .filter(|e| e.pubkey == *author && e.kind == self.definition.kind())
            .collect();

        let own_key = self.ctx.signer.public_key().await.ok();
        let result = if self.definition.is_partitioned() {
            self.decode_partitioned(events, own_key.as_ref(), generation)
                .await
        } else {
            self.decode_flat(events, own_key.as_ref(), generation).await
        };

        tlog!(
            "SYNC",
            "{}: fetched {} items ({} private), empty_content={} decrypt_failed={}",
            self.name(),
            result.items.len(),
            result.private_count(),
            result.content_was_empty,
            result.decryption_failed
        );
        result
    }

    async fn decode_flat(
        &self,
        events: Vec<Event>,
        own_key: Option<&PublicKey>,
        generation: u64,
    ) -> FetchResult<D::Item> {
        let Some(newest) = events.into_iter().max_by_key(|e| e.created_at) else {
            return FetchResult::empty(generation);
        };
        let decoded = decode_event(
            &self.definition,
            self.ctx.signer.as_ref(),
            own_key,
            &newest,
            Encoding::Current,
        )
        .await;

        let mut result = FetchResult::empty(generation);
        result.found = true;
        result.event_count = 1;
        result.newest_created_at = Some(newest.created_at.as_u64());
        result.items = dedup_newest(decoded.items);
        result.content_was_empty = decoded.content_was_empty;
        result.decryption_failed = decoded.decryption_failed;
        result
    }

    async fn decode_partitioned(
        &self,
        events: Vec<Event>,
        own_key: Option<&PublicKey>,
        generation: u64,
    ) -> FetchResult<D::Item> {
        // Newest event per category; foreign `d` tags are ignored
        let mut newest: BTreeMap<String, Event> = BTreeMap::new();
        for event in events {
            let tags = event_tags(&event);
            let Some(category) = extract_tag_str(&tags, "d")
                .and_then(|d| self.definition.category_from_identifier(d))
            else {
                continue;
            };
            let replace = newest
                .get(&category)
                .map(|existing| event.created_at > existing.created_at)
                .unwrap_or(true);
            if replace {
                newest.insert(category, event);
            }
        }

        let mut result = FetchResult::empty(generation);
        let mut items: Vec<D::Item> = Vec::new();
        for (category, event) in newest {
            result.found = true;
            result.event_count += 1;
            let created_at = event.created_at.as_u64();
            if result.newest_created_at.map_or(true, |n| created_at > n) {
                result.newest_created_at = Some(created_at);
            }
            if has_tag(&event_tags(&event), DELETED_TAG) {
                tlog!("SYNC", "{}: category '{}' is retracted on relays", self.name(), category);
                continue;
            }
            let decoded = decode_event(
                &self.definition,
                self.ctx.signer.as_ref(),
                own_key,
                &event,
                Encoding::Current,
            )
            .await;
            result.content_was_empty &= decoded.content_was_empty;
            result.decryption_failed |= decoded.decryption_failed;
            if !category.is_empty() {
                result.categories.push(category.clone());
            }
            for mut item in decoded.items {
                item.set_category(&category);
                items.push(item);
            }
        }

        result.items = dedup_newest(items);
        result.category_assignments = result
            .items
            .iter()
            .map(|i| (i.id().to_string(), i.category().to_string()))
            .collect::<HashMap<_, _>>();
        result
    }

    /// Fetch and union into the Browser tier.
    ///
    /// Holds the syncing guard for the whole call. Returns `added`/`total`
    /// counts; relay failures degrade to a no-op merge.
    pub async fn sync_from_relays(&self, author: &PublicKey) -> Result<SyncOutcome, ListError> {
        self.ensure_enabled()?;
        let _guard = self.try_begin_sync()?;

        let fetched = self.fetch_from_relays(author).await;
        let mut outcome = self.merge_into_browser(&fetched)?;

        let own_key = self.ctx.signer.public_key().await.ok();
        let is_own = own_key.as_ref() == Some(author);
        if fetched.found {
            let baseline = codec::publishable_count(&self.definition, &fetched.items);
            let telemetry = MergeTelemetry {
                fetched: fetched.items.len(),
                added: outcome.added,
                at: crate::models::now_secs(),
            };
            self.ctx.state.update(self.name(), |s| {
                s.last_merge = Some(telemetry);
                // What the relays hold now is the last known-good list
                if is_own && !fetched.decryption_failed {
                    s.last_published_count = Some(baseline);
                }
            })?;
        }

        tlog!(
            "SYNC",
            "{}: sync added={} updated={} total={}",
            self.name(),
            outcome.added,
            outcome.updated,
            outcome.total
        );

        if outcome.added > 0 && self.ctx.republish_on_new && is_own {
            self.publish_inner(false).await?;
            outcome.republished = true;
        }
        Ok(outcome)
    }

    /// Merge a result obtained earlier from [`Self::fetch_from_relays`].
    ///
    /// The merge is dropped (`discarded = true`) when the Browser tier changed
    /// after the fetch started.
    pub fn merge_fetched(&self, fetched: &FetchResult<D::Item>) -> Result<SyncOutcome, ListError> {
        let _guard = self.try_begin_sync()?;
        self.merge_into_browser(fetched)
    }

    fn merge_into_browser(&self, fetched: &FetchResult<D::Item>) -> Result<SyncOutcome, ListError> {
        let mut state = self.inner.lock();
        if state.generation != fetched.generation {
            tlog!(
                "SYNC",
                "{}: discarding fetch from generation {} (now {})",
                self.name(),
                fetched.generation,
                state.generation
            );
            return Ok(SyncOutcome {
                fetched: fetched.items.len(),
                total: state.items.len(),
                discarded: true,
                decryption_failed: fetched.decryption_failed,
                ..SyncOutcome::default()
            });
        }

        let merged = merge_items(&state.items, &fetched.items);
        let mut categories = state.categories.clone();
        for category in &fetched.categories {
            if !categories.contains(category) {
                categories.push(category.clone());
            }
        }

        if merged.added > 0 || merged.updated > 0 || categories != state.categories {
            browser_cache::save_cache(&self.cache_path, &merged.items, &categories)?;
            state.items = merged.items;
            state.categories = categories;
            state.generation += 1;
        }

        Ok(SyncOutcome {
            fetched: fetched.items.len(),
            added: merged.added,
            updated: merged.updated,
            total: state.items.len(),
            republished: false,
            decryption_failed: fetched.decryption_failed,
            discarded: false,
        })
    }

    /// Overwrite the Browser tier with the relay state.
    ///
    /// Refuses when private content could not be decrypted, and is subject to
    /// the consistency guard unless `confirmed`. When the relay event carries no
    /// private content, local private items are kept.
    pub async fn replace_from_relays(
        &self,
        author: &PublicKey,
        confirmed: bool,
    ) -> Result<ReplaceOutcome, ListError> {
        self.ensure_enabled()?;
        let _guard = self.try_begin_sync()?;

        let fetched = self.fetch_from_relays(author).await;
        if !fetched.found {
            return Ok(ReplaceOutcome::NothingFound);
        }
        if fetched.decryption_failed {
            return Err(ListError::PrivateItemsUnavailable(self.name()));
        }

        let (previous, total, baseline) = {
            let mut state = self.inner.lock();
            if state.generation != fetched.generation {
                return Err(ListError::StillSyncing(self.name()));
            }

            let mut next = fetched.items.clone();
            if fetched.content_was_empty && self.definition.encrypts_private() {
                for item in state.items.iter().filter(|i| i.is_private()) {
                    if !next.iter().any(|n| n.id() == item.id()) {
                        next.push(item.clone());
                    }
                }
            }

            let previous = state.items.len();
            if !confirmed && self.ctx.guard.blocks(previous, next.len()) {
                tlog!(
                    "SYNC",
                    "{}: guard blocked replace {} -> {}",
                    self.name(),
                    previous,
                    next.len()
                );
                return Err(ListError::ConsistencyGuard {
                    previous,
                    attempted: next.len(),
                });
            }

            let categories = if self.definition.is_partitioned() {
                fetched.categories.clone()
            } else {
                state.categories.clone()
            };
            browser_cache::save_cache(&self.cache_path, &next, &categories)?;
            let baseline = codec::publishable_count(&self.definition, &next);
            state.items = next;
            state.categories = categories;
            state.generation += 1;
            (previous, state.items.len(), baseline)
        };

        let live = fetched.categories.clone();
        self.ctx.state.update(self.name(), |s| {
            s.last_published_count = Some(baseline);
            s.last_published_categories = live;
        })?;
        tlog!("SYNC", "{}: replaced {} items with {}", self.name(), previous, total);
        Ok(ReplaceOutcome::Replaced { previous, total })
    }

    /// Serialize the Browser tier into signed list event(s) and broadcast them.
    pub async fn publish(&self) -> Result<PublishOutcome, ListError> {
        self.publish_inner(false).await
    }

    /// Publish even when the consistency guard would block.
    pub async fn publish_confirmed(&self) -> Result<PublishOutcome, ListError> {
        self.publish_inner(true).await
    }

    async fn publish_inner(&self, confirmed: bool) -> Result<PublishOutcome, ListError> {
        self.ensure_enabled()?;
        let (items, categories) = self.snapshot();
        let count = codec::publishable_count(&self.definition, &items);

        let state = self.state();
        if let Some(previous) = state.last_published_count {
            if !confirmed && self.ctx.guard.blocks(previous, count) {
                tlog!("PUBLISH", "{}: guard blocked {} -> {}", self.name(), previous, count);
                return Err(ListError::ConsistencyGuard {
                    previous,
                    attempted: count,
                });
            }
        }

        let signer = self.ctx.signer.as_ref();
        let author = signer.public_key().await?;

        let mut outcome = PublishOutcome {
            public_items: items.iter().filter(|i| !i.is_private()).count(),
            private_items: count - items.iter().filter(|i| !i.is_private()).count(),
            ..PublishOutcome::default()
        };

        let (unsigned, live_categories) = if self.definition.is_partitioned() {
            let (events, live, retracted) = self
                .build_partitioned(&author, &items, &categories, &state.last_published_categories)
                .await?;
            outcome.retracted = retracted;
            (events, live)
        } else {
            let event = build_list_event(&self.definition, signer, &author, Vec::new(), &items).await?;
            (vec![event], Vec::new())
        };

        // Sign everything before broadcasting anything
        let mut signed = Vec::with_capacity(unsigned.len());
        for event in unsigned {
            signed.push(signer.sign(event).await?);
        }

        for event in &signed {
            self.broadcast(event).await?;
        }
        outcome.events = signed.len();

        self.ctx.state.update(self.name(), |s| {
            s.last_published_count = Some(count);
            s.last_published_categories = live_categories;
        })?;

        tlog!(
            "PUBLISH",
            "{}: published {} events ({} public, {} private, {} retracted)",
            self.name(),
            outcome.events,
            outcome.public_items,
            outcome.private_items,
            outcome.retracted.len()
        );
        Ok(outcome)
    }

    /// One event per category (root included), a retraction for every category
    /// published last time but gone now, and one deletion request covering them.
    async fn build_partitioned(
        &self,
        author: &PublicKey,
        items: &[D::Item],
        categories: &[String],
        previously_published: &[String],
    ) -> Result<(Vec<UnsignedEvent>, Vec<String>, Vec<String>), ListError> {
        let signer = self.ctx.signer.as_ref();

        let mut groups: BTreeMap<String, Vec<D::Item>> = BTreeMap::new();
        groups.insert(String::new(), Vec::new());
        for category in categories {
            groups.entry(category.clone()).or_default();
        }
        for item in items {
            groups
                .entry(item.category().to_string())
                .or_default()
                .push(item.clone());
        }

        let mut events = Vec::with_capacity(groups.len());
        for (category, members) in &groups {
            let header = self.category_header(category);
            events.push(build_list_event(&self.definition, signer, author, header, members).await?);
        }

        let retracted: Vec<String> = previously_published
            .iter()
            .filter(|c| !c.is_empty() && !groups.contains_key(*c))
            .cloned()
            .collect();

        if !retracted.is_empty() {
            // NIP-09 `a` deletions cover every version up to the request's
            // created_at; the retraction marker must be newer to survive it.
            let deleted_at = Timestamp::now();
            let retracted_at = Timestamp::from(deleted_at.as_u64() + 1);
            let mut deletion_rows: Vec<RawTag> = Vec::new();
            for category in &retracted {
                let mut header = self.category_header(category);
                header.push(vec![DELETED_TAG.to_string()]);
                events.push(
                    EventBuilder::new(self.definition.kind(), "")
                        .tags(crate::models::tag_utils::to_nostr_tags(&header))
                        .custom_created_at(retracted_at)
                        .build(*author),
                );
                deletion_rows.push(vec![
                    "a".to_string(),
                    format!(
                        "{}:{}:{}",
                        self.definition.kind().as_u16(),
                        author.to_hex(),
                        self.definition.category_identifier(category)
                    ),
                ]);
            }
            deletion_rows.push(vec![
                "k".to_string(),
                self.definition.kind().as_u16().to_string(),
            ]);
            events.push(
                EventBuilder::new(Kind::from(kinds::DELETION), "")
                    .tags(crate::models::tag_utils::to_nostr_tags(&deletion_rows))
                    .custom_created_at(deleted_at)
                    .build(*author),
            );
        }

        let live: Vec<String> = groups.keys().filter(|c| !c.is_empty()).cloned().collect();
        Ok((events, live, retracted))
    }

    fn category_header(&self, category: &str) -> Vec<RawTag> {
        let title = if category.is_empty() {
            ROOT_CATEGORY_TITLE
        } else {
            category
        };
        vec![
            vec!["d".to_string(), self.definition.category_identifier(category)],
            vec!["title".to_string(), title.to_string()],
        ]
    }

    // ===== File tier =====

    /// Write the Browser tier to the File tier. Returns the item count.
    pub fn save_to_file(&self) -> Result<usize, ListError> {
        let (items, categories) = self.snapshot();
        Ok(self.files.save(&items, &categories)?)
    }

    /// Replace the Browser tier with the File tier. Returns the item count.
    pub fn restore_from_file(&self) -> Result<usize, ListError> {
        let snapshot = self.files.restore::<D::Item>()?;
        let items = dedup_newest(snapshot.items);
        let count = items.len();
        let categories = snapshot.categories;
        self.mutate(move |current, current_categories| {
            *current = items;
            *current_categories = categories;
            Ok(())
        })?;
        tlog!("FILE", "{}: restored {} items into the browser tier", self.name(), count);
        Ok(count)
    }

    // ===== Migration =====

    /// One-time import from the legacy encoding (the current one for kinds
    /// that never had another), then a File-tier save.
    ///
    /// `Unmigrated -> Migrating -> Migrated`; a failure returns to `Unmigrated`
    /// so the next call retries.
    pub async fn migrate(&self, author: &PublicKey) -> Result<MigrationOutcome, ListError> {
        self.ensure_enabled()?;
        let name = self.name();

        let claimed = self.ctx.state.transition_migration(
            name,
            MigrationState::Unmigrated,
            MigrationState::Migrating,
        )?;
        if !claimed {
            return Ok(match self.state().migration {
                MigrationState::Migrated => MigrationOutcome::AlreadyMigrated,
                _ => MigrationOutcome::InProgress,
            });
        }

        match self.run_migration(author).await {
            Ok((imported, added)) => {
                self.ctx.state.transition_migration(
                    name,
                    MigrationState::Migrating,
                    MigrationState::Migrated,
                )?;
                tlog!("MIGRATE", "{}: imported {} legacy items ({} new)", name, imported, added);
                Ok(MigrationOutcome::Migrated { imported, added })
            }
            Err(e) => {
                tlog!("MIGRATE", "{}: migration failed: {}", name, e);
                if let Err(revert) = self.ctx.state.transition_migration(
                    name,
                    MigrationState::Migrating,
                    MigrationState::Unmigrated,
                ) {
                    tracing::error!("{}: could not reset migration state: {}", name, revert);
                }
                Err(e)
            }
        }
    }

    async fn run_migration(&self, author: &PublicKey) -> Result<(usize, usize), ListError> {
        // Kinds without a legacy encoding import their current event instead
        let (kind, identifier, encoding) = match self.definition.legacy() {
            Some(legacy) => (legacy.kind, legacy.identifier, Encoding::Legacy),
            None => (self.definition.kind().as_u16(), None, Encoding::Current),
        };
        let _guard = self.try_begin_sync()?;

        let mut filter = Filter::new().author(*author).kind(Kind::from(kind));
        if let Some(identifier) = identifier {
            filter = filter.identifier(identifier);
        }
        let events = self.fetch_events(vec![filter]).await?;
        let newest = events
            .into_iter()
            .filter(|e| e.pubkey == *author && e.kind.as_u16() == kind)
            .max_by_key(|e| e.created_at);

        let imported = match newest {
            Some(event) => {
                let own_key = self.ctx.signer.public_key().await.ok();
                let decoded = decode_event(
                    &self.definition,
                    self.ctx.signer.as_ref(),
                    own_key.as_ref(),
                    &event,
                    encoding,
                )
                .await;
                if decoded.decryption_failed {
                    tlog!("MIGRATE", "{}: private items unreadable", self.name());
                }
                dedup_newest(decoded.items)
            }
            None => Vec::new(),
        };
        let imported_count = imported.len();

        let added = self.apply(|items, _| {
            let merged = merge_items(items, &imported);
            *items = merged.items;
            Ok(merged.added)
        })?;

        let (items, categories) = self.snapshot();
        self.files.save(&items, &categories)?;
        Ok((imported_count, added))
    }
}
