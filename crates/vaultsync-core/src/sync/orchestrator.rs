//! One full sync cycle
//!
//! lock → authenticate → fetch → plan → reconcile → cleanup → report

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use vaultsync_fs::ProcessLock;
use vaultsync_model::Item;

use super::cleanup::{CleanupOptions, OrphanCleanup};
use super::engine::{SyncEngine, SyncOptions};
use super::report::{CleanupAction, SyncSummary};
use crate::backend::{
    AuditSink, CycleState, CycleStateStore, ItemSource, LogAuditSink, MemoryStateStore, SecretSink,
};
use crate::projection::SyncPlan;
use crate::{Error, Result};

/// Drives sync cycles against injected collaborators.
///
/// Holds no state between cycles beyond what the [`CycleStateStore`] keeps.
pub struct Orchestrator {
    source: Arc<dyn ItemSource>,
    sink: Arc<dyn SecretSink>,
    audit: Arc<dyn AuditSink>,
    state: Arc<dyn CycleStateStore>,
    lock: Option<ProcessLock>,
    options: SyncOptions,
    /// `None` disables orphan cleanup
    cleanup: Option<CleanupOptions>,
}

impl Orchestrator {
    /// Create an orchestrator logging audit records and keeping state in
    /// memory, with cleanup enabled and no process lock.
    pub fn new(source: Arc<dyn ItemSource>, sink: Arc<dyn SecretSink>) -> Self {
        Self {
            source,
            sink,
            audit: Arc::new(LogAuditSink),
            state: Arc::new(MemoryStateStore::new()),
            lock: None,
            options: SyncOptions::default(),
            cleanup: Some(CleanupOptions::default()),
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_state_store(mut self, state: Arc<dyn CycleStateStore>) -> Self {
        self.state = state;
        self
    }

    /// Hold `lock` for the duration of every cycle
    pub fn with_lock(mut self, lock: ProcessLock) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cleanup(mut self, cleanup: Option<CleanupOptions>) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Run one cycle.
    ///
    /// Per-target failures are reported in the summary. Cancellation before
    /// or during the fetch yields a `cancelled` summary with no writes.
    ///
    /// # Errors
    ///
    /// - [`Error::LockHeld`] when another cycle holds the process lock
    /// - [`Error::AuthenticationFailure`] when the source rejects the session
    /// - [`Error::PersistentEmptySource`] when the source keeps returning no
    ///   items after a cycle that had items
    /// - any error from fetching items
    pub async fn sync_once(&self, cancel: &CancellationToken) -> Result<SyncSummary> {
        let cycle_id = Uuid::new_v4().to_string();

        let guard = match &self.lock {
            Some(lock) => Some(lock.try_acquire()?),
            None => None,
        };

        let result = self.run_cycle(&cycle_id, cancel).await;
        drop(guard);

        if let Err(e) = &result {
            tracing::error!("Sync cycle {} failed: {}", cycle_id, e);
            if let Err(audit_err) = self.audit.record_failure(&cycle_id, &e.to_string()).await {
                tracing::warn!("Audit sink failed to record cycle failure: {}", audit_err);
            }
        }
        result
    }

    async fn run_cycle(&self, cycle_id: &str, cancel: &CancellationToken) -> Result<SyncSummary> {
        let dry_run = self.options.dry_run;
        let mut summary = SyncSummary::begin(cycle_id, dry_run);
        tracing::info!(
            "Starting sync cycle {}{}",
            cycle_id,
            if dry_run { " (dry-run)" } else { "" }
        );

        if cancel.is_cancelled() {
            return Ok(self.cancelled(summary).await);
        }

        let previous = match self.state.load().await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Could not load previous cycle state: {}", e);
                CycleState::default()
            }
        };

        let fetched = cancel
            .run_until_cancelled(self.fetch(&previous, &mut summary))
            .await;
        let Some(items) = fetched else {
            return Ok(self.cancelled(summary).await);
        };
        let items = items?;

        let plan = SyncPlan::build(&items);
        summary.items_fetched = items.len();
        summary.items_failed = plan.failed_items.len();
        summary.targets_total = plan.len();
        summary.warnings.extend(plan.warnings.iter().cloned());
        tracing::info!(
            "{} items projected into {} targets ({} untargeted, {} failed)",
            items.len(),
            plan.len(),
            plan.untargeted_items,
            plan.failed_items.len()
        );

        let engine = SyncEngine::new(
            Arc::clone(&self.sink),
            Arc::clone(&self.audit),
            self.options.clone(),
        );
        let report = engine.reconcile(&plan, cancel).await;

        summary.created = report.totals.created;
        summary.updated = report.totals.updated;
        summary.skipped = report.totals.skipped;
        summary.failed = report.totals.failed;
        summary.namespaces = report.namespaces;
        summary.unprocessed = report.unprocessed;
        summary.cancelled = report.cancelled;
        summary.errors.extend(
            report
                .results
                .iter()
                .filter_map(|r| r.error.as_ref().map(|e| format!("{}/{}: {}", r.namespace, r.name, e))),
        );
        summary.results = report.results;

        match &self.cleanup {
            Some(_) if summary.cancelled => {
                tracing::info!("Skipping orphan cleanup for cancelled cycle");
            }
            Some(options) => self.run_cleanup(options, &plan, &mut summary).await,
            None => tracing::debug!("Orphan cleanup disabled"),
        }

        summary.finish();
        tracing::info!("Sync cycle {} done: {}", cycle_id, summary.one_line());
        self.report(&summary).await;

        if !dry_run {
            let state = CycleState {
                last_item_count: summary.items_fetched,
                last_cycle_at: Some(Utc::now()),
            };
            if let Err(e) = self.state.save(&state).await {
                tracing::warn!("Could not save cycle state: {}", e);
            }
        }

        Ok(summary)
    }

    /// Fetch items, re-authenticating once when an empty result follows a
    /// cycle that had items.
    async fn fetch(&self, previous: &CycleState, summary: &mut SyncSummary) -> Result<Vec<Item>> {
        self.authenticate().await?;
        let items = self.source.fetch_items().await?;
        if !items.is_empty() {
            return Ok(items);
        }

        if previous.last_item_count == 0 {
            tracing::warn!("Source returned no items");
            summary
                .warnings
                .push("source returned no items; vault may be empty".to_string());
            return Ok(items);
        }

        tracing::warn!(
            "Source returned no items after a cycle with {}; re-authenticating",
            previous.last_item_count
        );
        self.authenticate().await?;
        let items = self.source.fetch_items().await?;
        if items.is_empty() {
            return Err(Error::PersistentEmptySource {
                previous_count: previous.last_item_count,
            });
        }
        Ok(items)
    }

    async fn authenticate(&self) -> Result<()> {
        match self.source.authenticate().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::AuthenticationFailure {
                message: "source rejected credentials".to_string(),
            }),
            Err(e @ Error::AuthenticationFailure { .. }) => Err(e),
            Err(e) => Err(Error::AuthenticationFailure {
                message: e.to_string(),
            }),
        }
    }

    async fn run_cleanup(&self, options: &CleanupOptions, plan: &SyncPlan, summary: &mut SyncSummary) {
        let options = CleanupOptions {
            dry_run: self.options.dry_run,
            ..options.clone()
        };
        let cleanup = OrphanCleanup::new(Arc::clone(&self.sink), Arc::clone(&self.audit), options);

        match cleanup.run(plan).await {
            Ok(report) => {
                for outcome in &report.outcomes {
                    match outcome.action {
                        CleanupAction::Deleted => summary.cleanup.deleted += 1,
                        CleanupAction::KeysRemoved => summary.cleanup.keys_removed += 1,
                        CleanupAction::Failed => {
                            summary.cleanup.failed += 1;
                            summary.errors.push(format!(
                                "cleanup {}/{}: {}",
                                outcome.namespace,
                                outcome.name,
                                outcome.error.as_deref().unwrap_or("unknown error")
                            ));
                        }
                    }
                }
                summary.errors.extend(report.errors);
                summary.cleanup_results = report.outcomes;
            }
            Err(e) => {
                tracing::warn!("Orphan cleanup failed: {}", e);
                summary.cleanup.failed += 1;
                summary.errors.push(format!("cleanup: {}", e));
            }
        }
    }

    async fn cancelled(&self, mut summary: SyncSummary) -> SyncSummary {
        tracing::info!("Sync cycle {} cancelled before reconciling", summary.cycle_id);
        summary.cancelled = true;
        summary.finish();
        self.report(&summary).await;
        summary
    }

    async fn report(&self, summary: &SyncSummary) {
        if let Err(e) = self.audit.record_summary(summary).await {
            tracing::warn!("Audit sink failed to record summary: {}", e);
        }
    }
}
