//! Tribes: contacts grouped into named categories, one follow set per category.
//!
//! Categories live in the Browser tier next to the members so empty ones
//! survive. Renaming or deleting a category only changes the Browser tier; the
//! next publish retracts the old category event on the relays.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::normalize_pubkey;
use crate::definitions::TribeDefinition;
use crate::error::ListError;
use crate::models::{ListItem, TribeMember};
use crate::slug::{validate_category_name, CategoryNameValidation};
use crate::sync::{EngineContext, FetchResult, ListSyncEngine};

/// How the relay categories differ from the local ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDiff {
    /// Live on relays, unknown locally
    pub new_remote: Vec<String>,
    /// Published by us before, no longer live on relays
    pub deleted_elsewhere: Vec<String>,
    /// Local only and never published
    pub unpublished: Vec<String>,
}

pub struct TribeList {
    engine: Arc<ListSyncEngine<TribeDefinition>>,
}

fn category_name(input: &str) -> Result<String, ListError> {
    match validate_category_name(input) {
        CategoryNameValidation::Valid(name) => Ok(name),
        CategoryNameValidation::Empty => Err(ListError::InvalidItem(
            "category name must not be empty".to_string(),
        )),
        CategoryNameValidation::ControlCharacter => Err(ListError::InvalidItem(format!(
            "category name contains control characters: {:?}",
            input
        ))),
    }
}

impl TribeList {
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            engine: Arc::new(ListSyncEngine::new(TribeDefinition, ctx)),
        }
    }

    pub fn engine(&self) -> &Arc<ListSyncEngine<TribeDefinition>> {
        &self.engine
    }

    pub fn categories(&self) -> Vec<String> {
        self.engine.categories()
    }

    pub fn create_category(&self, name: &str) -> Result<String, ListError> {
        let name = category_name(name)?;
        self.engine.mutate(|_, categories| {
            if categories.contains(&name) {
                return Err(ListError::CategoryExists(name.clone()));
            }
            categories.push(name.clone());
            Ok(name.clone())
        })
    }

    /// Rename a category and move its members along.
    pub fn rename_category(&self, old: &str, new: &str) -> Result<usize, ListError> {
        let new = category_name(new)?;
        self.engine.mutate(|items, categories| {
            let Some(pos) = categories.iter().position(|c| c == old) else {
                return Err(ListError::UnknownCategory(old.to_string()));
            };
            if categories.contains(&new) {
                return Err(ListError::CategoryExists(new.clone()));
            }
            categories[pos] = new.clone();
            let mut moved = 0;
            for member in items.iter_mut().filter(|m| m.category == old) {
                member.category = new.clone();
                member.touch();
                moved += 1;
            }
            Ok(moved)
        })
    }

    /// Delete a category; its members move to the root category.
    pub fn delete_category(&self, name: &str) -> Result<usize, ListError> {
        self.engine.mutate(|items, categories| {
            let before = categories.len();
            categories.retain(|c| c != name);
            if categories.len() == before {
                return Err(ListError::UnknownCategory(name.to_string()));
            }
            let mut moved = 0;
            for member in items.iter_mut().filter(|m| m.category == name) {
                member.category.clear();
                member.touch();
                moved += 1;
            }
            Ok(moved)
        })
    }

    /// Put `pubkey` into `category` (`""` for root), adding it if new.
    /// Returns `true` when the member was added rather than moved.
    pub fn assign(&self, pubkey: &str, category: &str, private: bool) -> Result<bool, ListError> {
        let hex = normalize_pubkey(pubkey)?;
        self.engine.mutate(|items, categories| {
            if !category.is_empty() && !categories.iter().any(|c| c == category) {
                return Err(ListError::UnknownCategory(category.to_string()));
            }
            match items.iter_mut().find(|m| m.id == hex) {
                Some(member) => {
                    if member.category != category || member.is_private != private {
                        member.category = category.to_string();
                        member.is_private = private;
                        member.touch();
                    }
                    Ok(false)
                }
                None => {
                    items.push(TribeMember::new(hex.clone(), category, private));
                    Ok(true)
                }
            }
        })
    }

    pub fn remove_member(&self, pubkey: &str) -> Result<bool, ListError> {
        let hex = normalize_pubkey(pubkey)?;
        self.engine.remove(&hex)
    }

    pub fn members_of(&self, category: &str) -> Vec<TribeMember> {
        self.engine
            .get_all()
            .into_iter()
            .filter(|m| m.category == category)
            .collect()
    }

    pub fn category_of(&self, pubkey: &str) -> Option<String> {
        let hex = normalize_pubkey(pubkey).ok()?;
        self.engine.get(&hex).map(|m| m.category)
    }

    /// Compare a relay fetch with the local categories.
    pub fn category_diff(&self, fetched: &FetchResult<TribeMember>) -> CategoryDiff {
        let local: BTreeSet<String> = self.engine.categories().into_iter().collect();
        let remote: BTreeSet<String> = fetched.categories.iter().cloned().collect();
        let published: BTreeSet<String> = self
            .engine
            .state()
            .last_published_categories
            .into_iter()
            .collect();

        CategoryDiff {
            new_remote: remote.difference(&local).cloned().collect(),
            deleted_elsewhere: published
                .iter()
                .filter(|c| local.contains(*c) && !remote.contains(*c))
                .cloned()
                .collect(),
            unpublished: local
                .iter()
                .filter(|c| !published.contains(*c) && !remote.contains(*c))
                .cloned()
                .collect(),
        }
    }
}
