use std::sync::Arc;

use crate::definitions::BookmarkDefinition;
use crate::error::ListError;
use crate::models::{BookmarkItem, BookmarkTagType};
use crate::sync::{EngineContext, ListSyncEngine};

/// Bookmarked notes, articles, hashtags and URLs (NIP-51 kind 10003).
pub struct BookmarkList {
    engine: Arc<ListSyncEngine<BookmarkDefinition>>,
}

impl BookmarkList {
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            engine: Arc::new(ListSyncEngine::new(BookmarkDefinition, ctx)),
        }
    }

    pub fn engine(&self) -> &Arc<ListSyncEngine<BookmarkDefinition>> {
        &self.engine
    }

    /// Bookmark anything; the tag type is detected from the target's shape.
    pub fn bookmark(&self, target: &str, private: bool) -> Result<bool, ListError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(ListError::InvalidItem("empty bookmark target".to_string()));
        }
        self.engine.add(BookmarkItem::detect(target, private))
    }

    pub fn bookmark_typed(
        &self,
        target: &str,
        tag_type: BookmarkTagType,
        private: bool,
    ) -> Result<bool, ListError> {
        self.engine
            .add(BookmarkItem::new(target.trim(), tag_type, private))
    }

    pub fn unbookmark(&self, target: &str) -> Result<bool, ListError> {
        let id = BookmarkItem::detect(target.trim(), false).id;
        self.engine.remove(&id)
    }

    pub fn is_bookmarked(&self, target: &str) -> bool {
        let id = BookmarkItem::detect(target.trim(), false).id;
        self.engine.contains(&id)
    }

    pub fn of_type(&self, tag_type: BookmarkTagType) -> Vec<BookmarkItem> {
        self.engine
            .get_all()
            .into_iter()
            .filter(|b| b.tag_type == tag_type)
            .collect()
    }
}
