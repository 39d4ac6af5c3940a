mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{contact_event, random_pubkey, Harness, RefusingSigner};
use listsync_core::definitions::{BookmarkDefinition, ContactDefinition, MuteDefinition};
use listsync_core::error::{CryptoError, ListError, StorageError};
use listsync_core::models::{BookmarkItem, BookmarkTagType, ContactItem, ListItem};
use listsync_core::store::MigrationState;
use listsync_core::sync::{ListSyncEngine, MigrationOutcome, ReplaceOutcome};
use nostr_sdk::prelude::*;

fn contacts(h: &Harness) -> ListSyncEngine<ContactDefinition> {
    ListSyncEngine::new(ContactDefinition, h.context())
}

fn add_contacts(engine: &ListSyncEngine<ContactDefinition>, pubkeys: &[String]) {
    for pk in pubkeys {
        assert!(engine.add(ContactItem::new(pk.clone(), false)).unwrap());
    }
}

#[tokio::test]
async fn test_publish_then_fetch_roundtrip() {
    let h = Harness::new();
    let engine = contacts(&h);
    let pk = random_pubkey();
    engine.add(ContactItem::new(pk.clone(), false)).unwrap();

    let outcome = engine.publish().await.unwrap();
    assert_eq!(outcome.events, 1);
    assert_eq!(outcome.public_items, 1);
    assert_eq!(outcome.private_items, 0);

    let published = h.transport.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].kind, Kind::ContactList);
    assert_eq!(published[0].content, "");
    assert_eq!(published[0].pubkey, h.author());

    let fetched = engine.fetch_from_relays(&h.author()).await;
    assert!(fetched.found);
    assert!(fetched.content_was_empty);
    assert!(!fetched.decryption_failed);
    assert_eq!(fetched.items.len(), 1);
    assert_eq!(fetched.items[0].id, pk);
    assert!(!fetched.items[0].is_private);
}

#[tokio::test]
async fn test_opaque_id_survives_publish() {
    let h = Harness::new();
    let engine = contacts(&h);
    engine.add(ContactItem::new("abc", false)).unwrap();
    engine.publish().await.unwrap();

    let event = &h.transport.published()[0];
    assert_eq!(event.content, "");
    let fetched = engine.fetch_from_relays(&h.author()).await;
    assert_eq!(fetched.event_count, 1);
    assert_eq!(fetched.newest_created_at, Some(event.created_at.as_u64()));
    assert_eq!(fetched.items.len(), 1);
    assert_eq!(fetched.items[0].id, "abc");
    assert!(!fetched.items[0].is_private);
}

#[tokio::test]
async fn test_private_items_roundtrip_encrypted() {
    let h = Harness::new();
    let engine = contacts(&h);
    let public = random_pubkey();
    let private = random_pubkey();
    engine.add(ContactItem::new(public.clone(), false)).unwrap();
    engine.add(ContactItem::new(private.clone(), true)).unwrap();

    let outcome = engine.publish().await.unwrap();
    assert_eq!(outcome.public_items, 1);
    assert_eq!(outcome.private_items, 1);

    let event = &h.transport.published()[0];
    assert!(!event.content.is_empty());
    assert!(!event.content.contains(&private));

    let fetched = engine.fetch_from_relays(&h.author()).await;
    assert!(!fetched.content_was_empty);
    assert!(!fetched.decryption_failed);
    assert_eq!(fetched.private_count(), 1);
    let item = fetched.items.iter().find(|i| i.id == private).unwrap();
    assert!(item.is_private());
}

#[tokio::test]
async fn test_sync_unions_local_and_remote() {
    let h = Harness::new();
    let engine = contacts(&h);
    let local: Vec<String> = (0..20).map(|_| random_pubkey()).collect();
    add_contacts(&engine, &local);

    let mut remote: Vec<String> = local[..15].to_vec();
    remote.extend((0..3).map(|_| random_pubkey()));
    h.transport
        .seed(contact_event(&h.keys, &remote, "", Timestamp::now().as_u64()));

    let outcome = engine.sync_from_relays(&h.author()).await.unwrap();
    assert_eq!(outcome.fetched, 18);
    assert_eq!(outcome.added, 3);
    assert_eq!(outcome.total, 23);
    assert!(!outcome.discarded);
    assert_eq!(engine.len(), 23);
    for pk in local.iter().chain(remote.iter()) {
        assert!(engine.contains(pk));
    }

    let state = engine.state();
    assert_eq!(state.last_published_count, Some(18));
    assert_eq!(state.last_merge.map(|m| m.added), Some(3));
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let h = Harness::new();
    let engine = contacts(&h);
    let remote: Vec<String> = (0..4).map(|_| random_pubkey()).collect();
    h.transport.seed(contact_event(&h.keys, &remote, "", 1_700_000_000));

    let first = engine.sync_from_relays(&h.author()).await.unwrap();
    assert_eq!(first.added, 4);
    let generation = engine.generation();

    let second = engine.sync_from_relays(&h.author()).await.unwrap();
    assert_eq!(second.added, 0);
    assert_eq!(second.total, 4);
    assert_eq!(engine.generation(), generation);
}

#[tokio::test]
async fn test_publish_guard_blocks_dramatic_shrink() {
    let h = Harness::new();
    let engine = contacts(&h);
    let pubkeys: Vec<String> = (0..50).map(|_| random_pubkey()).collect();
    add_contacts(&engine, &pubkeys);
    engine.publish().await.unwrap();
    assert_eq!(engine.state().last_published_count, Some(50));

    for pk in &pubkeys[4..] {
        engine.remove(pk).unwrap();
    }
    let err = engine.publish().await.unwrap_err();
    assert!(matches!(
        err,
        ListError::ConsistencyGuard {
            previous: 50,
            attempted: 4
        }
    ));
    assert!(err.needs_confirmation());
    assert_eq!(h.transport.publish_count(), 1);
    assert_eq!(engine.len(), 4);

    let outcome = engine.publish_confirmed().await.unwrap();
    assert_eq!(outcome.public_items, 4);
    assert_eq!(h.transport.publish_count(), 2);
    assert_eq!(engine.state().last_published_count, Some(4));
}

#[tokio::test]
async fn test_replace_guard_leaves_browser_tier_untouched() {
    let h = Harness::new();
    let engine = contacts(&h);
    let local: Vec<String> = (0..50).map(|_| random_pubkey()).collect();
    add_contacts(&engine, &local);
    let remote: Vec<String> = local[..4].to_vec();
    h.transport.seed(contact_event(&h.keys, &remote, "", 1_700_000_000));

    let err = engine
        .replace_from_relays(&h.author(), false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ListError::ConsistencyGuard {
            previous: 50,
            attempted: 4
        }
    ));
    assert_eq!(engine.len(), 50);

    let outcome = engine.replace_from_relays(&h.author(), true).await.unwrap();
    assert_eq!(
        outcome,
        ReplaceOutcome::Replaced {
            previous: 50,
            total: 4
        }
    );
    assert_eq!(engine.len(), 4);
    assert!(!engine.is_syncing());
}

#[tokio::test]
async fn test_replace_with_nothing_on_relays() {
    let h = Harness::new();
    let engine = contacts(&h);
    add_contacts(&engine, &[random_pubkey()]);
    let outcome = engine.replace_from_relays(&h.author(), false).await.unwrap();
    assert_eq!(outcome, ReplaceOutcome::NothingFound);
    assert_eq!(engine.len(), 1);
}

#[tokio::test]
async fn test_replace_keeps_local_private_items_when_content_empty() {
    let h = Harness::new();
    let engine = contacts(&h);
    let private = random_pubkey();
    engine.add(ContactItem::new(private.clone(), true)).unwrap();
    let remote = vec![random_pubkey()];
    h.transport.seed(contact_event(&h.keys, &remote, "", 1_700_000_000));

    engine.replace_from_relays(&h.author(), false).await.unwrap();
    assert_eq!(engine.len(), 2);
    assert!(engine.get(&private).unwrap().is_private());
}

#[tokio::test]
async fn test_visibility_change_survives_later_sync() {
    let h = Harness::new();
    let engine = contacts(&h);
    let edited = random_pubkey();
    let untouched = random_pubkey();
    for pk in [&edited, &untouched] {
        let mut item = ContactItem::new(pk.clone(), false);
        item.added_at = 1_600_000_000;
        engine.add(item).unwrap();
    }
    // Relay copy is newer than both local adds
    h.transport.seed(contact_event(
        &h.keys,
        &[edited.clone(), untouched.clone()],
        "",
        1_700_000_000,
    ));

    assert!(engine.set_private(&edited, true).unwrap());
    let outcome = engine.sync_from_relays(&h.author()).await.unwrap();

    assert_eq!(outcome.updated, 1);
    assert!(engine.get(&edited).unwrap().is_private());
    assert_eq!(engine.get(&untouched).unwrap().added_at, 1_700_000_000);
}

#[tokio::test]
async fn test_set_private_to_same_side_is_a_no_op() {
    let h = Harness::new();
    let engine = contacts(&h);
    let pk = random_pubkey();
    let mut item = ContactItem::new(pk.clone(), true);
    item.added_at = 1_600_000_000;
    engine.add(item).unwrap();
    let generation = engine.generation();

    assert!(engine.set_private(&pk, true).unwrap());
    assert_eq!(engine.generation(), generation);
    assert_eq!(engine.get(&pk).unwrap().added_at, 1_600_000_000);
}

#[tokio::test]
async fn test_signing_failure_publishes_nothing() {
    let h = Harness::new();
    let engine = ListSyncEngine::new(
        ContactDefinition,
        h.context_with_signer(Arc::new(RefusingSigner {
            keys: h.keys.clone(),
        })),
    );
    engine.add(ContactItem::new(random_pubkey(), false)).unwrap();

    let err = engine.publish().await.unwrap_err();
    assert!(matches!(err, ListError::Crypto(CryptoError::Signing(_))));
    assert_eq!(h.transport.publish_count(), 0);
    assert_eq!(engine.state().last_published_count, None);
}

#[tokio::test]
async fn test_publish_failure_is_reported() {
    let h = Harness::new();
    let engine = contacts(&h);
    engine.add(ContactItem::new(random_pubkey(), false)).unwrap();
    h.transport.set_fail_publish(true);

    let err = engine.publish().await.unwrap_err();
    assert!(matches!(err, ListError::Transport(_)));
    assert!(err.is_retryable());
    assert_eq!(engine.state().last_published_count, None);
}

#[tokio::test]
async fn test_empty_content_is_not_a_decryption_failure() {
    let h = Harness::new();
    let engine = contacts(&h);
    h.transport
        .seed(contact_event(&h.keys, &[random_pubkey()], "", 1_700_000_000));

    let fetched = engine.fetch_from_relays(&h.author()).await;
    assert!(fetched.content_was_empty);
    assert!(!fetched.decryption_failed);
}

#[tokio::test]
async fn test_foreign_private_items_are_a_decryption_failure() {
    let h = Harness::new();
    let engine = contacts(&h);
    let other = Keys::generate();
    let ciphertext = nip44::encrypt(
        other.secret_key(),
        &other.public_key(),
        r#"[["p","00"]]"#,
        nip44::Version::V2,
    )
    .unwrap();
    h.transport
        .seed(contact_event(&other, &[random_pubkey()], &ciphertext, 1_700_000_000));

    let fetched = engine.fetch_from_relays(&other.public_key()).await;
    assert!(fetched.found);
    assert!(!fetched.content_was_empty);
    assert!(fetched.decryption_failed);
    assert_eq!(fetched.items.len(), 1);

    let outcome = engine.sync_from_relays(&other.public_key()).await.unwrap();
    assert!(outcome.decryption_failed);
    assert_eq!(engine.state().last_published_count, None);
}

#[tokio::test]
async fn test_relay_map_content_is_ignored() {
    let h = Harness::new();
    let engine = contacts(&h);
    let content = r#"{"wss://relay.example":{"read":true,"write":true}}"#;
    h.transport
        .seed(contact_event(&h.keys, &[random_pubkey()], content, 1_700_000_000));

    let fetched = engine.fetch_from_relays(&h.author()).await;
    assert!(!fetched.decryption_failed);
    assert_eq!(fetched.items.len(), 1);
}

#[tokio::test]
async fn test_fetch_failure_degrades_to_empty_result() {
    let h = Harness::new();
    let engine = contacts(&h);
    add_contacts(&engine, &[random_pubkey()]);
    h.transport.set_fail_fetch(true);

    let fetched = engine.fetch_from_relays(&h.author()).await;
    assert!(fetched.transport_failed);
    assert!(!fetched.found);

    let outcome = engine.sync_from_relays(&h.author()).await.unwrap();
    assert_eq!(outcome.added, 0);
    assert_eq!(outcome.total, 1);
}

#[tokio::test]
async fn test_stalled_relay_times_out() {
    let h = Harness::new();
    let engine = contacts(&h);
    h.transport.set_fetch_delay(Duration::from_secs(5));

    let fetched = engine.fetch_from_relays(&h.author()).await;
    assert!(fetched.transport_failed);
}

#[tokio::test]
async fn test_add_and_remove_are_idempotent() {
    let h = Harness::new();
    let engine = contacts(&h);
    let pk = random_pubkey();

    assert!(engine.add(ContactItem::new(pk.clone(), false)).unwrap());
    let generation = engine.generation();
    assert!(!engine.add(ContactItem::new(pk.clone(), true)).unwrap());
    assert_eq!(engine.generation(), generation);
    assert!(!engine.get(&pk).unwrap().is_private());

    assert!(engine.remove(&pk).unwrap());
    assert!(!engine.remove(&pk).unwrap());
    assert!(engine.is_empty());

    let err = engine.add(ContactItem::new("  ", false)).unwrap_err();
    assert!(matches!(err, ListError::InvalidItem(_)));
}

#[tokio::test]
async fn test_browser_tier_survives_restart() {
    let h = Harness::new();
    let pk = random_pubkey();
    {
        let engine = contacts(&h);
        engine.add(ContactItem::new(pk.clone(), true)).unwrap();
    }
    let engine = contacts(&h);
    assert_eq!(engine.len(), 1);
    assert!(engine.get(&pk).unwrap().is_private());
}

#[tokio::test]
async fn test_mutation_rejected_while_syncing() {
    let h = Harness::new();
    let engine = Arc::new(contacts(&h));
    h.transport
        .seed(contact_event(&h.keys, &[random_pubkey()], "", 1_700_000_000));
    h.transport.set_fetch_delay(Duration::from_millis(300));

    let author = h.author();
    let syncing = engine.clone();
    let task = tokio::spawn(async move { syncing.sync_from_relays(&author).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(engine.is_syncing());
    let err = engine
        .add(ContactItem::new(random_pubkey(), false))
        .unwrap_err();
    assert!(matches!(err, ListError::StillSyncing("contacts")));
    assert!(err.is_retryable());
    let second = engine.sync_from_relays(&author).await.unwrap_err();
    assert!(matches!(second, ListError::StillSyncing(_)));

    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome.added, 1);
    assert!(!engine.is_syncing());
    assert!(engine.add(ContactItem::new(random_pubkey(), false)).unwrap());
}

#[tokio::test]
async fn test_stale_fetch_is_discarded() {
    let h = Harness::new();
    let engine = contacts(&h);
    let remote = random_pubkey();
    h.transport
        .seed(contact_event(&h.keys, &[remote.clone()], "", 1_700_000_000));

    let fetched = engine.fetch_from_relays(&h.author()).await;
    engine.add(ContactItem::new(random_pubkey(), false)).unwrap();

    let outcome = engine.merge_fetched(&fetched).unwrap();
    assert!(outcome.discarded);
    assert_eq!(outcome.added, 0);
    assert!(!engine.contains(&remote));

    let fresh = engine.fetch_from_relays(&h.author()).await;
    let outcome = engine.merge_fetched(&fresh).unwrap();
    assert!(!outcome.discarded);
    assert!(engine.contains(&remote));
}

#[tokio::test]
async fn test_republish_on_new_items() {
    let h = Harness::new();
    let mut ctx = h.context();
    ctx.republish_on_new = true;
    let engine = ListSyncEngine::new(ContactDefinition, ctx);
    add_contacts(&engine, &[random_pubkey()]);
    h.transport
        .seed(contact_event(&h.keys, &[random_pubkey()], "", 1_700_000_000));

    let outcome = engine.sync_from_relays(&h.author()).await.unwrap();
    assert!(outcome.republished);
    assert_eq!(h.transport.publish_count(), 1);
    assert_eq!(h.transport.published()[0].tags.len(), 2);
}

#[tokio::test]
async fn test_disabled_list_skips_relay_operations() {
    let h = Harness::new();
    let engine = contacts(&h);
    engine.set_enabled(false).unwrap();
    assert!(engine.add(ContactItem::new(random_pubkey(), false)).unwrap());

    assert!(matches!(
        engine.publish().await.unwrap_err(),
        ListError::Disabled("contacts")
    ));
    assert!(matches!(
        engine.sync_from_relays(&h.author()).await.unwrap_err(),
        ListError::Disabled(_)
    ));
    assert_eq!(h.transport.publish_count(), 0);
    assert_eq!(h.transport.fetch_count(), 0);

    engine.set_enabled(true).unwrap();
    engine.publish().await.unwrap();
    assert_eq!(h.transport.publish_count(), 1);
}

#[tokio::test]
async fn test_file_save_and_restore() {
    let h = Harness::new();
    let engine = contacts(&h);
    let public = random_pubkey();
    let private = random_pubkey();
    engine.add(ContactItem::new(public.clone(), false)).unwrap();
    engine.add(ContactItem::new(private.clone(), true)).unwrap();

    assert_eq!(engine.save_to_file().unwrap(), 2);
    engine.remove(&public).unwrap();
    engine.add(ContactItem::new(random_pubkey(), false)).unwrap();

    assert_eq!(engine.restore_from_file().unwrap(), 2);
    assert_eq!(engine.len(), 2);
    assert!(engine.contains(&public));
    assert!(engine.get(&private).unwrap().is_private());
}

#[tokio::test]
async fn test_restore_without_saved_file() {
    let h = Harness::new();
    let engine = contacts(&h);
    let err = engine.restore_from_file().unwrap_err();
    assert!(matches!(err, ListError::Storage(StorageError::NotFound(_))));
}

fn legacy_bookmarks(keys: &Keys, event_id: &str) -> Event {
    EventBuilder::new(Kind::from(30001), "")
        .tags(vec![
            Tag::identifier("bookmark"),
            Tag::parse(["e", event_id]).unwrap(),
            Tag::parse(["t", "rust"]).unwrap(),
        ])
        .sign_with_keys(keys)
        .unwrap()
}

#[tokio::test]
async fn test_migration_runs_once() {
    let h = Harness::new();
    let engine = ListSyncEngine::new(BookmarkDefinition, h.context());
    let note = "ab".repeat(32);
    h.transport.seed(legacy_bookmarks(&h.keys, &note));

    let outcome = engine.migrate(&h.author()).await.unwrap();
    assert_eq!(
        outcome,
        MigrationOutcome::Migrated {
            imported: 2,
            added: 2
        }
    );
    assert!(engine.contains(&note));
    assert_eq!(engine.get("rust").unwrap().tag_type, BookmarkTagType::Hashtag);
    assert!(engine.file_backend().exists());
    assert_eq!(engine.state().migration, MigrationState::Migrated);

    let fetches = h.transport.fetch_count();
    let again = engine.migrate(&h.author()).await.unwrap();
    assert_eq!(again, MigrationOutcome::AlreadyMigrated);
    assert_eq!(h.transport.fetch_count(), fetches);
}

#[tokio::test]
async fn test_migration_merges_with_existing_items() {
    let h = Harness::new();
    let engine = ListSyncEngine::new(BookmarkDefinition, h.context());
    engine
        .add(BookmarkItem::new("#Rust", BookmarkTagType::Hashtag, false))
        .unwrap();
    h.transport.seed(legacy_bookmarks(&h.keys, &"cd".repeat(32)));

    let outcome = engine.migrate(&h.author()).await.unwrap();
    assert_eq!(
        outcome,
        MigrationOutcome::Migrated {
            imported: 2,
            added: 1
        }
    );
    assert_eq!(engine.len(), 2);
}

#[tokio::test]
async fn test_failed_migration_can_be_retried() {
    let h = Harness::new();
    let engine = ListSyncEngine::new(BookmarkDefinition, h.context());
    h.transport.seed(legacy_bookmarks(&h.keys, &"ef".repeat(32)));
    h.transport.set_fail_fetch(true);

    let err = engine.migrate(&h.author()).await.unwrap_err();
    assert!(matches!(err, ListError::Transport(_)));
    assert_eq!(engine.state().migration, MigrationState::Unmigrated);
    assert!(engine.is_empty());
    assert!(!engine.is_syncing());

    h.transport.set_fail_fetch(false);
    let outcome = engine.migrate(&h.author()).await.unwrap();
    assert!(matches!(outcome, MigrationOutcome::Migrated { added: 2, .. }));
}

#[tokio::test]
async fn test_migration_without_legacy_format_imports_current_list() {
    let h = Harness::new();
    let engine = contacts(&h);
    let local = random_pubkey();
    add_contacts(&engine, &[local.clone()]);
    let remote: Vec<String> = (0..3).map(|_| random_pubkey()).collect();
    h.transport
        .seed(contact_event(&h.keys, &remote, "", 1_700_000_000));

    let outcome = engine.migrate(&h.author()).await.unwrap();
    assert_eq!(
        outcome,
        MigrationOutcome::Migrated {
            imported: 3,
            added: 3
        }
    );
    assert_eq!(h.transport.fetch_count(), 1);
    assert_eq!(engine.len(), 4);
    assert!(engine.contains(&local));
    assert!(engine.file_backend().exists());
    assert_eq!(engine.state().migration, MigrationState::Migrated);
    assert_eq!(engine.restore_from_file().unwrap(), 4);
}

#[tokio::test]
async fn test_migration_with_nothing_on_relays_still_writes_files() {
    let h = Harness::new();
    let engine = ListSyncEngine::new(MuteDefinition, h.context());

    let outcome = engine.migrate(&h.author()).await.unwrap();
    assert_eq!(
        outcome,
        MigrationOutcome::Migrated {
            imported: 0,
            added: 0
        }
    );
    assert_eq!(h.transport.fetch_count(), 1);
    assert!(engine.file_backend().exists());
}
