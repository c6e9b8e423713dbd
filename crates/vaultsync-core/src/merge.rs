//! Managed-key merge
//!
//! Combines a freshly synced document with the data already on a sink object
//! that other tools may also write to:
//!
//! ```text
//! D_final = (D_old - L_old) ∪ D_new
//! L_final = keys(D_new)
//! ```
//!
//! Keys the sync owned but no longer produces are dropped. Keys it never
//! owned survive unless the new document writes the same key.

use vaultsync_model::SecretDocument;

use crate::ledger::ManagedKeys;

/// Outcome of merging a synced document into existing sink data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Data to write
    pub data: SecretDocument,
    /// Ledger to write
    pub ledger: ManagedKeys,
    /// Previously owned keys removed because the sync stopped producing them
    pub stale_keys: Vec<String>,
    /// Externally owned keys replaced by a synced key of the same name
    pub claimed_keys: Vec<String>,
}

/// Merge `synced` into `existing`, honouring the previous ledger.
///
/// An empty `ledger` means nothing on the object was ours yet, so no existing
/// key is removed.
pub fn merge_managed_keys(
    existing: &SecretDocument,
    ledger: &ManagedKeys,
    synced: &SecretDocument,
) -> MergeResult {
    let mut data = SecretDocument::new();
    let mut stale_keys = Vec::new();
    let mut claimed_keys = Vec::new();

    for (key, value) in existing {
        if ledger.contains(key) {
            if !synced.contains_key(key) {
                stale_keys.push(key.clone());
            }
            continue;
        }
        if synced.contains_key(key) {
            claimed_keys.push(key.clone());
            continue;
        }
        data.insert(key.clone(), value.clone());
    }

    for (key, value) in synced {
        data.insert(key.clone(), value.clone());
    }

    MergeResult {
        data,
        ledger: synced.keys().cloned().collect(),
        stale_keys,
        claimed_keys,
    }
}

/// Remove every ledger key from `existing`, keeping external keys.
///
/// Returns the remaining data and the keys actually removed.
pub fn strip_managed_keys(
    existing: &SecretDocument,
    ledger: &ManagedKeys,
) -> (SecretDocument, Vec<String>) {
    let mut removed = Vec::new();
    let remaining = existing
        .iter()
        .filter(|(key, _)| {
            if ledger.contains(*key) {
                removed.push((*key).clone());
                false
            } else {
                true
            }
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    (remaining, removed)
}
