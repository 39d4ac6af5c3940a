use serde::de::DeserializeOwned;
use serde::Serialize;

/// Get current Unix timestamp in seconds
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Which side of a list event an item lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Cleartext tag of the signed event
    Public,
    /// Inside the encrypted content
    Private,
}

impl Visibility {
    pub fn from_private(is_private: bool) -> Self {
        if is_private {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    pub fn is_private(self) -> bool {
        self == Visibility::Private
    }
}

/// Common shape of every list entry.
///
/// `id` is unique within one list kind; `added_at` drives newest-wins merging.
pub trait ListItem:
    Clone + std::fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    fn id(&self) -> &str;
    fn is_private(&self) -> bool;
    fn set_private(&mut self, private: bool);
    fn added_at(&self) -> u64;
    fn set_added_at(&mut self, added_at: u64);

    /// Stamp an in-place edit so it outranks the relay copy it was made on.
    /// Never moves the timestamp backwards.
    fn touch(&mut self) {
        let stamped = now_secs().max(self.added_at());
        self.set_added_at(stamped);
    }

    /// Category of category-partitioned lists; `""` is the root.
    fn category(&self) -> &str {
        ""
    }

    fn set_category(&mut self, _category: &str) {}

    fn visibility(&self) -> Visibility {
        Visibility::from_private(self.is_private())
    }
}

/// Implements the id/visibility/timestamp accessors for a struct with
/// `id`, `is_private` and `added_at` fields.
macro_rules! impl_list_item_basics {
    () => {
        fn id(&self) -> &str {
            &self.id
        }

        fn is_private(&self) -> bool {
            self.is_private
        }

        fn set_private(&mut self, private: bool) {
            self.is_private = private;
        }

        fn added_at(&self) -> u64 {
            self.added_at
        }

        fn set_added_at(&mut self, added_at: u64) {
            self.added_at = added_at;
        }
    };
}

pub(crate) use impl_list_item_basics;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactItem;

    #[test]
    fn test_touch_moves_forward_only() {
        let mut old = ContactItem::new("a".repeat(64), false);
        old.added_at = 1_600_000_000;
        old.touch();
        assert!(old.added_at >= now_secs() - 1);

        let far = now_secs() + 3_600;
        let mut future = ContactItem::new("b".repeat(64), false);
        future.added_at = far;
        future.touch();
        assert_eq!(future.added_at, far);
    }
}
