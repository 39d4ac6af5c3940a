//! Persistence of the Browser tier between process runs.
//!
//! Every Browser-tier write is mirrored to `<account>/cache/<list>.json` so the
//! authoritative set survives a restart. This is not the File tier: the cache is
//! written implicitly and never exported; the File tier is explicit save/restore.
//!
//! The cache is discarded (and the list starts empty) when the schema version
//! changes or the file is corrupt.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::models::{now_secs, ListItem};
use crate::store::atomic::{read_json, write_json_atomic};

/// Bump when the cached item shape changes incompatibly.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEnvelope<T> {
    schema_version: u32,
    saved_at: u64,
    #[serde(default)]
    categories: Vec<String>,
    items: Vec<T>,
}

/// What the Browser tier holds for one list.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserSnapshot<T> {
    pub items: Vec<T>,
    /// Known categories, including empty ones (partitioned lists only)
    pub categories: Vec<String>,
}

impl<T> Default for BrowserSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            categories: Vec::new(),
        }
    }
}

pub fn cache_path(account_dir: &Path, list_name: &str) -> PathBuf {
    account_dir.join("cache").join(format!("{}.json", list_name))
}

pub fn save_cache<T: ListItem>(
    path: &Path,
    items: &[T],
    categories: &[String],
) -> Result<(), StorageError> {
    let envelope = CacheEnvelope {
        schema_version: CACHE_SCHEMA_VERSION,
        saved_at: now_secs(),
        categories: categories.to_vec(),
        items: items.to_vec(),
    };
    write_json_atomic(path, &envelope)
}

/// Load the cached Browser tier; any failure yields an empty snapshot.
pub fn load_cache<T: ListItem>(path: &Path) -> BrowserSnapshot<T> {
    let envelope: CacheEnvelope<T> = match read_json(path) {
        Ok(Some(envelope)) => envelope,
        Ok(None) => return BrowserSnapshot::default(),
        Err(e) => {
            tracing::warn!("browser_cache: {} unreadable, starting empty: {}", path.display(), e);
            return BrowserSnapshot::default();
        }
    };

    if envelope.schema_version != CACHE_SCHEMA_VERSION {
        tracing::info!(
            "browser_cache: schema version mismatch (cached={} current={}), discarding",
            envelope.schema_version,
            CACHE_SCHEMA_VERSION
        );
        return BrowserSnapshot::default();
    }

    BrowserSnapshot {
        items: envelope.items,
        categories: envelope.categories,
    }
}
