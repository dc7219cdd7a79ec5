//! Identity-key diff between a freshly fetched page and the stored snapshot

use std::collections::HashSet;

use super::item::Item;

/// Collect the identity keys of the stored latest snapshot
pub fn known_identity_keys(stored: &[Item]) -> HashSet<String> {
    stored.iter().map(|item| item.identity_key.clone()).collect()
}

/// Items whose identity key is not in `known_keys`, in their original order.
///
/// Items without a product link all share the empty key, so once one of them
/// is stored every later link-less item counts as already seen.
pub fn unseen_items(fetched: &[Item], known_keys: &HashSet<String>) -> Vec<Item> {
    fetched
        .iter()
        .filter(|item| !known_keys.contains(&item.identity_key))
        .cloned()
        .collect()
}
