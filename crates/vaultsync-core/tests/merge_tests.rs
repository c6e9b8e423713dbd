//! Ledger and managed-key merge laws

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use proptest::collection::{btree_map, btree_set, vec};
use proptest::prelude::*;
use vaultsync_core::{ManagedKeys, merge_managed_keys, parse_ledger, serialize_ledger, strip_managed_keys};
use vaultsync_model::SecretDocument;

fn key() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,6}"
}

fn document() -> impl Strategy<Value = SecretDocument> {
    btree_map(key(), "[a-z0-9]{0,4}", 0..8)
}

proptest! {
    #[test]
    fn ledger_round_trips_as_a_set(keys in vec(key(), 1..12)) {
        let serialized = serialize_ledger(&keys);
        let parsed = parse_ledger(Some(serialized.as_str()));
        let expected: BTreeSet<String> = keys.iter().cloned().collect();
        prop_assert_eq!(parsed, expected);
    }

    #[test]
    fn ledger_serialization_ignores_input_order(mut keys in vec(key(), 1..12)) {
        let forward = serialize_ledger(&keys);
        keys.reverse();
        prop_assert_eq!(forward, serialize_ledger(&keys));
    }

    #[test]
    fn merge_never_keeps_stale_and_always_keeps_new(
        old in document(),
        ledger in btree_set(key(), 0..8),
        new in document(),
    ) {
        let result = merge_managed_keys(&old, &ledger, &new);

        for key in &ledger {
            if !new.contains_key(key) {
                prop_assert!(!result.data.contains_key(key));
            }
        }
        for (key, value) in &new {
            prop_assert_eq!(result.data.get(key), Some(value));
        }
        for (key, value) in &old {
            if !ledger.contains(key) && !new.contains_key(key) {
                prop_assert_eq!(result.data.get(key), Some(value));
            }
        }
        let new_keys: ManagedKeys = new.keys().cloned().collect();
        prop_assert_eq!(&result.ledger, &new_keys);
        prop_assert!(result.ledger.iter().all(|k| result.data.contains_key(k)));
    }

    #[test]
    fn merge_with_empty_ledger_never_removes(old in document(), new in document()) {
        let result = merge_managed_keys(&old, &ManagedKeys::new(), &new);
        prop_assert!(old.keys().all(|k| result.data.contains_key(k)));
        prop_assert!(result.stale_keys.is_empty());
    }
}

#[test]
fn orphan_strip_keeps_external_keys() {
    let old: SecretDocument = [("x", "1"), ("y", "2")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let ledger: ManagedKeys = ["x".to_string()].into_iter().collect();

    let (remaining, removed) = strip_managed_keys(&old, &ledger);

    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining["y"], "2");
    assert_eq!(removed, vec!["x".to_string()]);
}
