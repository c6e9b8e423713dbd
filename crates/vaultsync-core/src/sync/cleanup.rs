//! Orphan cleanup
//!
//! Sink objects carrying the created-by marker and a non-empty ledger, but no
//! longer produced by any item, lose their managed keys. If nothing else is
//! left they are deleted; otherwise the remaining external keys stay and the
//! ledger is emptied. Objects a failing item still names are kept.

use std::collections::BTreeSet;
use std::sync::Arc;

use vaultsync_model::names::{MANAGED_KEYS_ANNOTATION, SIGNATURE_ANNOTATION};
use vaultsync_model::SinkSecret;

use super::report::{CleanupAction, CleanupOutcome};
use crate::backend::{AuditSink, SecretSink};
use crate::ledger::{ledger_of, serialize_ledger};
use crate::merge::strip_managed_keys;
use crate::projection::SyncPlan;
use crate::Result;

/// Name of the bootstrap secret holding the vault session token
pub const DEFAULT_PROTECTED_SECRET: &str = "vaultsync-auth-token";

#[derive(Debug, Clone)]
pub struct CleanupOptions {
    /// Report planned outcomes without writing
    pub dry_run: bool,
    /// Object names never touched, in any namespace
    pub protected_secrets: Vec<String>,
    /// Restrict cleanup to these namespaces; `None` scans all
    pub namespaces: Option<Vec<String>>,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            protected_secrets: vec![DEFAULT_PROTECTED_SECRET.to_string()],
            namespaces: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    pub outcomes: Vec<CleanupOutcome>,
    /// Namespace-level failures (listing)
    pub errors: Vec<String>,
}

pub struct OrphanCleanup {
    sink: Arc<dyn SecretSink>,
    audit: Arc<dyn AuditSink>,
    options: CleanupOptions,
}

impl OrphanCleanup {
    pub fn new(sink: Arc<dyn SecretSink>, audit: Arc<dyn AuditSink>, options: CleanupOptions) -> Self {
        Self {
            sink,
            audit,
            options,
        }
    }

    /// Clean every scanned namespace of objects `plan` no longer targets.
    ///
    /// # Errors
    ///
    /// Returns an error only when the namespace list cannot be read. Failures
    /// inside a namespace are reported and the scan moves on.
    pub async fn run(&self, plan: &SyncPlan) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();

        for namespace in self.namespaces().await? {
            let secrets = match self.sink.list_secrets_with_managed_keys(&namespace).await {
                Ok(secrets) => secrets,
                Err(e) => {
                    tracing::warn!("Cleanup could not list {}: {}", namespace, e);
                    report
                        .errors
                        .push(format!("cleanup: listing {}: {}", namespace, e));
                    continue;
                }
            };

            for secret in secrets {
                if !self.is_candidate(&secret, plan) {
                    continue;
                }
                let outcome = self.clean(secret).await;
                if let Err(e) = self.audit.record_cleanup(&outcome).await {
                    tracing::warn!(
                        "Audit sink failed to record cleanup of {}/{}: {}",
                        outcome.namespace,
                        outcome.name,
                        e
                    );
                }
                report.outcomes.push(outcome);
            }
        }

        Ok(report)
    }

    async fn namespaces(&self) -> Result<Vec<String>> {
        let listed = self.sink.list_namespaces().await?;
        Ok(match &self.options.namespaces {
            Some(allowed) => {
                let allowed: BTreeSet<&str> = allowed.iter().map(String::as_str).collect();
                listed
                    .into_iter()
                    .filter(|ns| allowed.contains(ns.as_str()))
                    .collect()
            }
            None => listed,
        })
    }

    fn is_candidate(&self, secret: &SinkSecret, plan: &SyncPlan) -> bool {
        secret.is_created_by_sync()
            && !self.options.protected_secrets.iter().any(|p| p == &secret.name)
            && !ledger_of(secret).is_empty()
            && !plan.claims(&secret.namespace, &secret.name)
    }

    async fn clean(&self, secret: SinkSecret) -> CleanupOutcome {
        let dry_run = self.options.dry_run;
        let ledger = ledger_of(&secret);
        let (remaining, removed) = strip_managed_keys(&secret.data, &ledger);
        let key = secret.key();

        if remaining.is_empty() {
            if dry_run {
                tracing::info!("[dry-run] Would delete orphan {}", key);
            } else if let Err(e) = self.sink.delete_secret(&key.namespace, &key.name).await {
                tracing::warn!("Failed to delete orphan {}: {}", key, e);
                return CleanupOutcome::failed(&key.namespace, &key.name, e, dry_run);
            } else {
                tracing::info!("Deleted orphan {}", key);
            }
            return CleanupOutcome::new(
                &key.namespace,
                &key.name,
                CleanupAction::Deleted,
                removed,
                dry_run,
            );
        }

        let mut stripped = secret;
        stripped.data = remaining;
        stripped.annotations.insert(
            MANAGED_KEYS_ANNOTATION.to_string(),
            serialize_ledger(Vec::<String>::new()),
        );
        stripped.annotations.remove(SIGNATURE_ANNOTATION);

        if dry_run {
            tracing::info!("[dry-run] Would remove managed keys {:?} from {}", removed, key);
        } else if let Err(e) = self.sink.update_secret(&stripped).await {
            tracing::warn!("Failed to strip orphan {}: {}", key, e);
            return CleanupOutcome::failed(&key.namespace, &key.name, e, dry_run);
        } else {
            tracing::info!("Removed managed keys {:?} from {}", removed, key);
        }
        CleanupOutcome::new(
            &key.namespace,
            &key.name,
            CleanupAction::KeysRemoved,
            removed,
            dry_run,
        )
    }
}
