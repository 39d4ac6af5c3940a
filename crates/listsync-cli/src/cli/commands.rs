use anyhow::{anyhow, Result};
use listsync_core::lists::{normalize_event_id, normalize_pubkey};
use listsync_core::session::{ListKind, ListSession};
use listsync_core::sync::{
    MigrationOutcome, PollerConfig, PublishOutcome, ReplaceOutcome, SyncOutcome, SyncPoller,
};
use listsync_core::NoteRef;
use serde_json::{json, Value};

/// What a muted entry refers to, as chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteAs {
    User,
    Thread,
    Word,
    Hashtag,
}

/// Commands that run against an open session
#[derive(Debug, Clone)]
pub enum CliCommand {
    List {
        list: ListKind,
    },
    Add {
        list: ListKind,
        target: String,
        private: bool,
        category: Option<String>,
        mute_as: MuteAs,
    },
    Remove {
        list: ListKind,
        target: String,
    },
    Fetch {
        list: ListKind,
    },
    Sync {
        lists: Vec<ListKind>,
    },
    Publish {
        list: ListKind,
        confirm: bool,
    },
    Replace {
        list: ListKind,
        confirm: bool,
    },
    Save {
        list: ListKind,
    },
    Restore {
        list: ListKind,
    },
    Migrate {
        lists: Vec<ListKind>,
    },
    SetEnabled {
        list: ListKind,
        enabled: bool,
    },
    State {
        list: ListKind,
    },
    Categories,
    CreateCategory {
        name: String,
    },
    RenameCategory {
        from: String,
        to: String,
    },
    DeleteCategory {
        name: String,
    },
    MuteCheck {
        note_id: String,
        author: Option<String>,
        parent: Option<String>,
        root: Option<String>,
        text: Option<String>,
    },
    Watch {
        list: ListKind,
    },
}

fn sync_json(outcome: &SyncOutcome) -> Value {
    json!({
        "fetched": outcome.fetched,
        "added": outcome.added,
        "updated": outcome.updated,
        "total": outcome.total,
        "republished": outcome.republished,
        "decryptionFailed": outcome.decryption_failed,
        "discarded": outcome.discarded,
    })
}

fn publish_json(outcome: &PublishOutcome) -> Value {
    json!({
        "events": outcome.events,
        "publicItems": outcome.public_items,
        "privateItems": outcome.private_items,
        "retracted": outcome.retracted,
    })
}

fn replace_json(outcome: &ReplaceOutcome) -> Value {
    match outcome {
        ReplaceOutcome::Replaced { previous, total } => {
            json!({ "replaced": true, "previous": previous, "total": total })
        }
        ReplaceOutcome::NothingFound => json!({ "replaced": false, "reason": "nothing on relays" }),
    }
}

fn migration_json(outcome: &MigrationOutcome) -> Value {
    match outcome {
        MigrationOutcome::Migrated { imported, added } => {
            json!({ "status": "migrated", "imported": imported, "added": added })
        }
        MigrationOutcome::AlreadyMigrated => json!({ "status": "already_migrated" }),
        MigrationOutcome::InProgress => json!({ "status": "in_progress" }),
    }
}

fn add(
    session: &ListSession,
    list: ListKind,
    target: &str,
    private: bool,
    category: Option<&str>,
    mute_as: MuteAs,
) -> Result<bool> {
    let added = match list {
        ListKind::Contacts => session.follows.follow(target, private)?,
        ListKind::Bookmarks => session.bookmarks.bookmark(target, private)?,
        ListKind::Tribes => session
            .tribes
            .assign(target, category.unwrap_or_default(), private)?,
        ListKind::Mutes => match mute_as {
            MuteAs::User => session.mutes.mute_user(target, private)?,
            MuteAs::Thread => session.mutes.mute_thread(target, private)?,
            MuteAs::Word => session.mutes.mute_word(target, private)?,
            MuteAs::Hashtag => session.mutes.mute_hashtag(target, private)?,
        },
    };
    Ok(added)
}

fn remove(session: &ListSession, list: ListKind, target: &str) -> Result<bool> {
    let removed = match list {
        ListKind::Contacts => session.follows.unfollow(target)?,
        ListKind::Bookmarks => session.bookmarks.unbookmark(target)?,
        ListKind::Tribes => session.tribes.remove_member(target)?,
        ListKind::Mutes => {
            // Stored ids: hex for users and threads, prefixed for words and hashtags
            let mut removed = session.mutes.unmute(target.trim())?;
            if !removed {
                if let Ok(hex) = normalize_pubkey(target).or_else(|_| normalize_event_id(target)) {
                    removed = session.mutes.unmute(&hex)?;
                }
            }
            if !removed {
                removed = session.mutes.unmute_word(target)?;
            }
            if !removed {
                removed = session.mutes.unmute_hashtag(target)?;
            }
            removed
        }
    };
    Ok(removed)
}

/// Run one command and return its JSON result.
pub async fn execute(session: &ListSession, command: CliCommand) -> Result<Value> {
    let author = *session.author();

    match command {
        CliCommand::List { list } => {
            let managed = session.managed(list);
            Ok(json!({
                "list": list.as_str(),
                "count": managed.len(),
                "items": managed.summaries(),
            }))
        }
        CliCommand::Add {
            list,
            target,
            private,
            category,
            mute_as,
        } => {
            let added = add(session, list, &target, private, category.as_deref(), mute_as)?;
            Ok(json!({ "list": list.as_str(), "added": added }))
        }
        CliCommand::Remove { list, target } => {
            let removed = remove(session, list, &target)?;
            Ok(json!({ "list": list.as_str(), "removed": removed }))
        }
        CliCommand::Fetch { list } => {
            let summary = session.managed(list).fetch_summary(&author).await;
            Ok(json!({ "list": list.as_str(), "relay": summary }))
        }
        CliCommand::Sync { lists } => {
            let mut results = serde_json::Map::new();
            for list in lists {
                let value = match session.managed(list).sync(&author).await {
                    Ok(outcome) => sync_json(&outcome),
                    Err(e) => json!({ "error": e.to_string(), "retryable": e.is_retryable() }),
                };
                results.insert(list.as_str().to_string(), value);
            }
            Ok(Value::Object(results))
        }
        CliCommand::Publish { list, confirm } => {
            let outcome = session.managed(list).publish(confirm).await?;
            Ok(json!({ "list": list.as_str(), "published": publish_json(&outcome) }))
        }
        CliCommand::Replace { list, confirm } => {
            let outcome = session.managed(list).replace(&author, confirm).await?;
            Ok(json!({ "list": list.as_str(), "replace": replace_json(&outcome) }))
        }
        CliCommand::Save { list } => {
            let count = session.managed(list).save_to_file()?;
            Ok(json!({ "list": list.as_str(), "saved": count }))
        }
        CliCommand::Restore { list } => {
            let count = session.managed(list).restore_from_file()?;
            Ok(json!({ "list": list.as_str(), "restored": count }))
        }
        CliCommand::Migrate { lists } => {
            let mut results = serde_json::Map::new();
            for list in lists {
                let value = match session.managed(list).migrate(&author).await {
                    Ok(outcome) => migration_json(&outcome),
                    Err(e) => json!({ "error": e.to_string() }),
                };
                results.insert(list.as_str().to_string(), value);
            }
            Ok(Value::Object(results))
        }
        CliCommand::SetEnabled { list, enabled } => {
            session.managed(list).set_enabled(enabled)?;
            Ok(json!({ "list": list.as_str(), "enabled": enabled }))
        }
        CliCommand::State { list } => {
            let managed = session.managed(list);
            Ok(json!({ "list": list.as_str(), "state": managed.list_state() }))
        }
        CliCommand::Categories => {
            let fetched = session.tribes.engine().fetch_from_relays(&author).await;
            let diff = session.tribes.category_diff(&fetched);
            Ok(json!({
                "local": session.tribes.categories(),
                "relay": fetched.categories,
                "newRemote": diff.new_remote,
                "deletedElsewhere": diff.deleted_elsewhere,
                "unpublished": diff.unpublished,
                "relayUnavailable": fetched.transport_failed,
            }))
        }
        CliCommand::CreateCategory { name } => {
            let name = session.tribes.create_category(&name)?;
            Ok(json!({ "created": name }))
        }
        CliCommand::RenameCategory { from, to } => {
            let moved = session.tribes.rename_category(&from, &to)?;
            Ok(json!({ "renamed": from, "to": to, "movedMembers": moved }))
        }
        CliCommand::DeleteCategory { name } => {
            let moved = session.tribes.delete_category(&name)?;
            Ok(json!({ "deleted": name, "movedToRoot": moved }))
        }
        CliCommand::MuteCheck {
            note_id,
            author: note_author,
            parent,
            root,
            text,
        } => {
            let mut note = NoteRef::new(normalize_event_id(&note_id).unwrap_or(note_id));
            if let Some(author) = note_author {
                note = note.with_author(normalize_pubkey(&author)?);
            }
            if let Some(parent) = parent {
                let parent = normalize_event_id(&parent).unwrap_or(parent);
                session.mutes.observe_reply(&note.id, &parent);
                note = note.with_parent(parent);
            }
            if let Some(root) = root {
                note = note.with_root(normalize_event_id(&root).unwrap_or(root));
            }
            let note_muted = session.mutes.is_note_muted(&note);
            let text_muted = text
                .as_deref()
                .map(|t| session.mutes.is_text_muted(t))
                .unwrap_or(false);
            Ok(json!({
                "noteId": note.id,
                "muted": note_muted || text_muted,
                "noteMuted": note_muted,
                "textMuted": text_muted,
            }))
        }
        CliCommand::Watch { list } => {
            let poller = SyncPoller::new(session.managed(list), author, PollerConfig::default());
            if !poller.start() {
                return Err(anyhow!("poller for {} is already running", list));
            }
            eprintln!("Watching {} for relay changes, Ctrl-C to stop", list);
            tokio::signal::ctrl_c().await?;
            poller.stop().await;
            Ok(json!({ "list": list.as_str(), "watching": false }))
        }
    }
}
