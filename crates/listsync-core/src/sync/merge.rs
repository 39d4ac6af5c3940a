//! Union-by-id merge used by every relay-to-Browser transition.

use std::collections::HashMap;

use crate::models::ListItem;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome<T> {
    pub items: Vec<T>,
    /// Remote ids that were not present locally
    pub added: usize,
    /// Local items replaced by a strictly newer remote copy
    pub updated: usize,
}

/// Merge `remote` into `local`.
///
/// Never drops a local item. For an id present on both sides the copy with the
/// larger `added_at` wins; on a tie the local copy stays. Local order is kept,
/// new ids are appended in remote order.
pub fn merge_items<T: ListItem>(local: &[T], remote: &[T]) -> MergeOutcome<T> {
    let mut items: Vec<T> = local.to_vec();
    let mut index: HashMap<String, usize> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (item.id().to_string(), i))
        .collect();

    let mut added = 0;
    let mut updated = 0;
    for incoming in remote {
        match index.get(incoming.id()) {
            Some(&pos) => {
                if incoming.added_at() > items[pos].added_at() {
                    if items[pos] != *incoming {
                        updated += 1;
                    }
                    items[pos] = incoming.clone();
                }
            }
            None => {
                index.insert(incoming.id().to_string(), items.len());
                items.push(incoming.clone());
                added += 1;
            }
        }
    }

    MergeOutcome {
        items,
        added,
        updated,
    }
}

/// Collapse duplicate ids within one batch, keeping the newest copy. On a tie
/// the first occurrence wins.
pub fn dedup_newest<T: ListItem>(batch: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(batch.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for item in batch {
        match index.get(item.id()) {
            Some(&pos) => {
                if item.added_at() > out[pos].added_at() {
                    out[pos] = item;
                }
            }
            None => {
                index.insert(item.id().to_string(), out.len());
                out.push(item);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactItem;

    fn contact(id: &str, added_at: u64, is_private: bool) -> ContactItem {
        ContactItem {
            id: id.to_string(),
            is_private,
            added_at,
            relay_hint: None,
            petname: None,
        }
    }

    #[test]
    fn test_merge_is_superset_of_local() {
        let local = vec![contact("a", 10, false), contact("b", 10, false)];
        let remote = vec![contact("c", 5, false)];
        let out = merge_items(&local, &remote);
        assert_eq!(out.added, 1);
        assert_eq!(out.items.len(), 3);
        for item in &local {
            assert!(out.items.iter().any(|i| i.id == item.id));
        }
    }

    #[test]
    fn test_newest_wins_and_tie_keeps_local() {
        let local = vec![contact("a", 10, false), contact("b", 10, false)];
        let remote = vec![contact("a", 20, true), contact("b", 10, true)];
        let out = merge_items(&local, &remote);
        assert_eq!(out.added, 0);
        assert_eq!(out.updated, 1);
        assert!(out.items[0].is_private);
        assert!(!out.items[1].is_private);
    }

    #[test]
    fn test_older_remote_never_overwrites() {
        let local = vec![contact("a", 50, false)];
        let remote = vec![contact("a", 1, true)];
        let out = merge_items(&local, &remote);
        assert_eq!(out.items, local);
    }

    #[test]
    fn test_empty_remote_is_identity() {
        let local = vec![contact("a", 1, false)];
        let out = merge_items::<ContactItem>(&local, &[]);
        assert_eq!(out.items, local);
        assert_eq!(out.added, 0);
    }

    #[test]
    fn test_dedup_newest() {
        let batch = vec![contact("a", 1, false), contact("a", 3, true), contact("b", 2, false)];
        let out = dedup_newest(batch);
        assert_eq!(out.len(), 2);
        assert!(out[0].is_private);
    }
}
