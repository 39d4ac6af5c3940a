//! File tier: explicit, user-triggered export and import of one list.
//!
//! Layout under `<account>/lists/<list>/`:
//! - flat lists: `public.json` and `private.json`
//! - partitioned lists: `<category-stem>.public.json` and `<category-stem>.private.json`
//!   per category, `root.*` for the uncategorized members
//!
//! Private items are kept in their own document so the public one can be shared
//! or backed up without leaking them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::FILE_FORMAT_VERSION;
use crate::error::StorageError;
use crate::models::{now_secs, ListItem};
use crate::slug::category_file_stem;
use crate::store::atomic::{read_json, remove_if_exists, write_json_atomic};
use crate::tlog;

const PUBLIC_SUFFIX: &str = "public.json";
const PRIVATE_SUFFIX: &str = "private.json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocument<T> {
    pub version: u32,
    pub saved_at: u64,
    pub list: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub items: Vec<T>,
}

/// Items and categories read back from the File tier.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSnapshot<T> {
    pub items: Vec<T>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    list: &'static str,
    partitioned: bool,
}

impl FileBackend {
    pub fn new(account_dir: &Path, list: &'static str, partitioned: bool) -> Self {
        Self {
            dir: account_dir.join("lists").join(list),
            list,
            partitioned,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether anything has ever been saved for this list.
    pub fn exists(&self) -> bool {
        !self.document_paths().is_empty()
    }

    /// Write every document and drop documents of categories that no longer exist.
    /// Returns the number of items written.
    pub fn save<T: ListItem>(&self, items: &[T], categories: &[String]) -> Result<usize, StorageError> {
        let saved_at = now_secs();
        let mut written: BTreeSet<PathBuf> = BTreeSet::new();

        if self.partitioned {
            let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
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
            for (category, members) in &groups {
                let stem = category_file_stem(category);
                written.extend(self.write_pair(&stem, Some(category), members, saved_at)?);
            }
        } else {
            written.extend(self.write_pair("", None, items, saved_at)?);
        }

        for stale in self.document_paths() {
            if !written.contains(&stale) {
                tlog!("FILE", "removing stale document {}", stale.display());
                remove_if_exists(&stale)?;
            }
        }

        tlog!("FILE", "saved {} {} items to {}", items.len(), self.list, self.dir.display());
        Ok(items.len())
    }

    /// Read every document back. Errors with `NotFound` when nothing was saved.
    pub fn restore<T: ListItem>(&self) -> Result<FileSnapshot<T>, StorageError> {
        let paths = self.document_paths();
        if paths.is_empty() {
            return Err(StorageError::NotFound(self.list.to_string()));
        }

        let mut items: Vec<T> = Vec::new();
        let mut categories: BTreeSet<String> = BTreeSet::new();
        for path in paths {
            let Some(doc) = read_json::<ListDocument<T>>(&path)? else {
                continue;
            };
            let is_private = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(PRIVATE_SUFFIX))
                .unwrap_or(false);
            let category = doc.category.unwrap_or_default();
            if self.partitioned && !category.is_empty() {
                categories.insert(category.clone());
            }
            for mut item in doc.items {
                item.set_private(is_private);
                if self.partitioned {
                    item.set_category(&category);
                }
                items.push(item);
            }
        }

        tlog!("FILE", "restored {} {} items", items.len(), self.list);
        Ok(FileSnapshot {
            items,
            categories: categories.into_iter().collect(),
        })
    }

    fn write_pair<T: ListItem>(
        &self,
        stem: &str,
        category: Option<&String>,
        items: &[T],
        saved_at: u64,
    ) -> Result<[PathBuf; 2], StorageError> {
        let (private, public): (Vec<T>, Vec<T>) =
            items.iter().cloned().partition(|item| item.is_private());

        let public_path = self.document_path(stem, PUBLIC_SUFFIX);
        let private_path = self.document_path(stem, PRIVATE_SUFFIX);
        for (path, items) in [(&public_path, public), (&private_path, private)] {
            let doc = ListDocument {
                version: FILE_FORMAT_VERSION,
                saved_at,
                list: self.list.to_string(),
                category: category.cloned(),
                items,
            };
            write_json_atomic(path, &doc)?;
        }
        Ok([public_path, private_path])
    }

    fn document_path(&self, stem: &str, suffix: &str) -> PathBuf {
        if stem.is_empty() {
            self.dir.join(suffix)
        } else {
            self.dir.join(format!("{}.{}", stem, suffix))
        }
    }

    fn document_paths(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.ends_with(PUBLIC_SUFFIX) || n.ends_with(PRIVATE_SUFFIX))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactItem, TribeMember};
    use tempfile::tempdir;

    #[test]
    fn test_flat_list_splits_visibility() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path(), "contacts", false);
        let items = vec![
            ContactItem::new("a".repeat(64), false),
            ContactItem::new("b".repeat(64), true),
        ];
        backend.save(&items, &[]).unwrap();

        let public = std::fs::read_to_string(backend.dir().join("public.json")).unwrap();
        let private = std::fs::read_to_string(backend.dir().join("private.json")).unwrap();
        assert!(public.contains(&"a".repeat(64)));
        assert!(!public.contains(&"b".repeat(64)));
        assert!(private.contains(&"b".repeat(64)));

        let snapshot: FileSnapshot<ContactItem> = backend.restore().unwrap();
        assert_eq!(snapshot.items.len(), 2);
        assert!(snapshot.items.iter().any(|i| i.id == "b".repeat(64) && i.is_private));
    }

    #[test]
    fn test_restore_without_save_is_not_found() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path(), "mutes", false);
        assert!(!backend.exists());
        let err = backend.restore::<ContactItem>().unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_partitioned_keeps_empty_categories_and_drops_stale() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path(), "tribes", true);
        let members = vec![
            TribeMember::new("a".repeat(64), "", false),
            TribeMember::new("b".repeat(64), "Work", true),
        ];
        backend
            .save(&members, &["Work".to_string(), "Family".to_string()])
            .unwrap();

        let snapshot: FileSnapshot<TribeMember> = backend.restore().unwrap();
        assert_eq!(snapshot.categories, vec!["Family".to_string(), "Work".to_string()]);
        let work = snapshot.items.iter().find(|m| m.id == "b".repeat(64)).unwrap();
        assert_eq!(work.category, "Work");
        assert!(work.is_private);

        // Family removed locally: its files disappear on the next save
        backend.save(&members, &["Work".to_string()]).unwrap();
        let snapshot: FileSnapshot<TribeMember> = backend.restore().unwrap();
        assert_eq!(snapshot.categories, vec!["Work".to_string()]);
    }
}
