//! Reconciliation engine
//!
//! Applies a [`SyncPlan`] to the sink. For every target:
//!
//! 1. check the namespace exists (once per namespace per cycle)
//! 2. read the existing object
//! 3. create it, skip it when its content signature is unchanged, or merge
//!    and update it
//!
//! Failures are folded into the target's [`TargetResult`]; one target never
//! stops the others.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use vaultsync_model::names::{
    CREATED_BY_LABEL, CREATED_BY_VALUE, DEFAULT_SYSTEM_NAME, LAST_SYNCED_ANNOTATION,
    MANAGED_ANNOTATIONS_ANNOTATION, MANAGED_BY_LABEL, MANAGED_KEYS_ANNOTATION,
    SIGNATURE_ANNOTATION, SYSTEM_ANNOTATIONS, SYSTEM_LABELS,
};
use vaultsync_model::SinkSecret;

use super::report::{NamespaceStats, StatsAccumulator, SyncOutcome, TargetResult};
use crate::backend::{AuditSink, SecretSink};
use crate::ledger::{ledger_of, parse_ledger, serialize_ledger};
use crate::merge::merge_managed_keys;
use crate::projection::{SyncPlan, TargetPlan};
use crate::signature::{compute_signature, stored_signature};
use crate::{Error, Result};

/// Default bound on concurrently reconciled targets
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Options for one reconcile pass
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// If true, compute outcomes without writing to the sink.
    /// Log lines are prefixed with "[dry-run] Would ..."
    pub dry_run: bool,
    /// Maximum targets reconciled at once
    pub concurrency: usize,
    /// Value of the managed-by label on objects this system creates
    pub system_name: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            concurrency: DEFAULT_CONCURRENCY,
            system_name: DEFAULT_SYSTEM_NAME.to_string(),
        }
    }
}

/// What one reconcile pass did
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// Results in target order
    pub results: Vec<TargetResult>,
    pub totals: NamespaceStats,
    pub namespaces: BTreeMap<String, NamespaceStats>,
    /// Targets never started because the pass was cancelled
    pub unprocessed: usize,
    pub cancelled: bool,
}

/// Per-cycle namespace existence cache
struct NamespaceCache {
    entries: BTreeMap<String, OnceCell<bool>>,
}

impl NamespaceCache {
    fn new(plan: &SyncPlan) -> Self {
        Self {
            entries: plan
                .targets
                .keys()
                .map(|k| (k.namespace.clone(), OnceCell::new()))
                .collect(),
        }
    }

    async fn exists(&self, sink: &dyn SecretSink, namespace: &str) -> Result<bool> {
        match self.entries.get(namespace) {
            Some(cell) => cell
                .get_or_try_init(|| sink.namespace_exists(namespace))
                .await
                .copied(),
            None => sink.namespace_exists(namespace).await,
        }
    }
}

/// Reconciles planned targets against the sink
pub struct SyncEngine {
    sink: Arc<dyn SecretSink>,
    audit: Arc<dyn AuditSink>,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(sink: Arc<dyn SecretSink>, audit: Arc<dyn AuditSink>, options: SyncOptions) -> Self {
        Self {
            sink,
            audit,
            options,
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Reconcile every target of `plan`.
    ///
    /// Targets not yet started when `cancel` fires are left alone; targets
    /// already in flight run to completion.
    pub async fn reconcile(&self, plan: &SyncPlan, cancel: &CancellationToken) -> ReconcileReport {
        let stats = StatsAccumulator::new(plan.targets.keys().map(|k| k.namespace.clone()));
        let namespaces = NamespaceCache::new(plan);
        let concurrency = self.options.concurrency.max(1);

        let mut results: Vec<TargetResult> = stream::iter(plan.targets.values())
            .map(|target| {
                let stats = &stats;
                let namespaces = &namespaces;
                async move {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    let result = self.reconcile_target(target, namespaces).await;
                    stats.record(&result.namespace, result.outcome);
                    self.record(&result).await;
                    Some(result)
                }
            })
            .buffer_unordered(concurrency)
            .filter_map(|r| async move { r })
            .collect()
            .await;

        results.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
        let unprocessed = plan.len() - results.len();
        if unprocessed > 0 {
            tracing::warn!("Cancelled with {} targets unprocessed", unprocessed);
        }

        ReconcileReport {
            totals: stats.totals(),
            namespaces: stats.per_namespace(),
            unprocessed,
            cancelled: cancel.is_cancelled(),
            results,
        }
    }

    async fn record(&self, result: &TargetResult) {
        if let Err(e) = self.audit.record_outcome(result).await {
            tracing::warn!("Audit sink failed to record {}: {}", result.key(), e);
        }
    }

    async fn reconcile_target(&self, target: &TargetPlan, namespaces: &NamespaceCache) -> TargetResult {
        let dry_run = self.options.dry_run;
        match self.apply_target(target, namespaces).await {
            Ok((outcome, removed_keys)) => {
                let mut result =
                    TargetResult::new(&target.key, outcome, target.item_ids.clone(), dry_run);
                result.removed_keys = removed_keys;
                result
            }
            Err(e) => {
                tracing::warn!("{}: {}", target.key, e);
                TargetResult::failed(&target.key, target.item_ids.clone(), e, dry_run)
            }
        }
    }

    async fn apply_target(
        &self,
        target: &TargetPlan,
        namespaces: &NamespaceCache,
    ) -> Result<(SyncOutcome, Vec<String>)> {
        let key = &target.key;
        let sink = self.sink.as_ref();

        if !namespaces.exists(sink, &key.namespace).await? {
            return Err(Error::TargetNotFound {
                namespace: key.namespace.clone(),
            });
        }

        let signature = compute_signature(&target.document, &target.annotations, &target.labels);
        let existing = sink.get_secret(&key.namespace, &key.name).await?;

        let Some(existing) = existing else {
            let secret = self.new_secret(target, &signature);
            if self.options.dry_run {
                tracing::info!("[dry-run] Would create {}", key);
            } else {
                sink.create_secret(&secret).await?;
                tracing::debug!("Created {} ({} keys)", key, secret.data.len());
            }
            return Ok((SyncOutcome::Created, Vec::new()));
        };

        if stored_signature(&existing) == Some(signature.as_str()) {
            tracing::debug!("{} unchanged; skipping", key);
            return Ok((SyncOutcome::Skipped, Vec::new()));
        }

        let ledger = ledger_of(&existing);
        let merged = merge_managed_keys(&existing.data, &ledger, &target.document);
        if !merged.claimed_keys.is_empty() {
            tracing::warn!(
                "{}: taking over externally owned keys {:?}",
                key,
                merged.claimed_keys
            );
        }
        if !merged.stale_keys.is_empty() {
            tracing::debug!("{}: dropping stale keys {:?}", key, merged.stale_keys);
        }

        let mut secret = existing;
        secret.data = merged.data;
        self.apply_metadata(&mut secret, target, &signature, serialize_ledger(&merged.ledger));

        if self.options.dry_run {
            tracing::info!("[dry-run] Would update {}", key);
        } else {
            sink.update_secret(&secret).await?;
            tracing::debug!("Updated {} ({} keys)", key, secret.data.len());
        }
        Ok((SyncOutcome::Updated, merged.stale_keys))
    }

    fn new_secret(&self, target: &TargetPlan, signature: &str) -> SinkSecret {
        let mut secret = SinkSecret::new(&target.key.namespace, &target.key.name)
            .with_data(target.document.clone());
        let ledger = serialize_ledger(target.document.keys());
        self.apply_metadata(&mut secret, target, signature, ledger);
        secret
    }

    /// Overlay item metadata and the system labels and annotations.
    ///
    /// Item labels and annotations never override system ones. Annotations an
    /// item supplied on the previous write but no longer does are removed.
    fn apply_metadata(&self, secret: &mut SinkSecret, target: &TargetPlan, signature: &str, ledger: String) {
        for (k, v) in &target.labels {
            if SYSTEM_LABELS.contains(&k.as_str()) {
                continue;
            }
            secret.labels.insert(k.clone(), v.clone());
        }
        // managed-by never changes once present
        secret
            .labels
            .entry(MANAGED_BY_LABEL.to_string())
            .or_insert_with(|| self.options.system_name.clone());
        secret
            .labels
            .insert(CREATED_BY_LABEL.to_string(), CREATED_BY_VALUE.to_string());

        let item_annotations: BTreeMap<&String, &String> = target
            .annotations
            .iter()
            .filter(|(k, _)| !SYSTEM_ANNOTATIONS.contains(&k.as_str()))
            .collect();
        for previous in parse_ledger(secret.annotation(MANAGED_ANNOTATIONS_ANNOTATION)) {
            if !item_annotations.contains_key(&previous) && !SYSTEM_ANNOTATIONS.contains(&previous.as_str()) {
                secret.annotations.remove(&previous);
            }
        }
        for (k, v) in &item_annotations {
            secret.annotations.insert((*k).clone(), (*v).clone());
        }
        secret.annotations.insert(
            MANAGED_ANNOTATIONS_ANNOTATION.to_string(),
            serialize_ledger(item_annotations.keys()),
        );
        secret
            .annotations
            .insert(MANAGED_KEYS_ANNOTATION.to_string(), ledger);
        secret
            .annotations
            .insert(SIGNATURE_ANNOTATION.to_string(), signature.to_string());
        secret
            .annotations
            .insert(LAST_SYNCED_ANNOTATION.to_string(), Utc::now().to_rfc3339());
    }
}
