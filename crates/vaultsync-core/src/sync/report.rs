//! Per-target outcomes and per-cycle summary

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vaultsync_model::TargetKey;

/// What happened to one target during a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Created,
    Updated,
    /// Content signature unchanged; nothing written
    Skipped,
    Failed,
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of reconciling one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResult {
    pub namespace: String,
    pub name: String,
    pub outcome: SyncOutcome,
    /// Failure detail for `Failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Items merged into this target
    pub item_ids: Vec<String>,
    /// Formerly managed keys dropped by this write
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_keys: Vec<String>,
    /// Outcome was computed but not applied
    pub dry_run: bool,
    pub timestamp: DateTime<Utc>,
}

impl TargetResult {
    pub fn new(key: &TargetKey, outcome: SyncOutcome, item_ids: Vec<String>, dry_run: bool) -> Self {
        Self {
            namespace: key.namespace.clone(),
            name: key.name.clone(),
            outcome,
            error: None,
            item_ids,
            removed_keys: Vec::new(),
            dry_run,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(key: &TargetKey, item_ids: Vec<String>, error: impl ToString, dry_run: bool) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(key, SyncOutcome::Failed, item_ids, dry_run)
        }
    }

    pub fn key(&self) -> TargetKey {
        TargetKey::new(&self.namespace, &self.name)
    }
}

/// What orphan cleanup did to one sink object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupAction {
    /// Only managed keys were present; the object was deleted
    Deleted,
    /// Managed keys removed, external keys preserved
    KeysRemoved,
    Failed,
}

impl std::fmt::Display for CleanupAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Deleted => "deleted",
            Self::KeysRemoved => "keys removed, external keys preserved",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupOutcome {
    pub namespace: String,
    pub name: String,
    pub action: CleanupAction,
    pub removed_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub dry_run: bool,
    pub timestamp: DateTime<Utc>,
}

impl CleanupOutcome {
    pub fn new(
        namespace: &str,
        name: &str,
        action: CleanupAction,
        removed_keys: Vec<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            action,
            removed_keys,
            error: None,
            dry_run,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(namespace: &str, name: &str, error: impl ToString, dry_run: bool) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(namespace, name, CleanupAction::Failed, Vec::new(), dry_run)
        }
    }
}

/// Outcome counts for one namespace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceStats {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl NamespaceStats {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.failed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupStats {
    pub deleted: usize,
    pub keys_removed: usize,
    pub failed: usize,
}

/// Everything one cycle did. Produced once, never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub cycle_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub dry_run: bool,
    /// Cancellation was observed; `unprocessed` targets were never started
    pub cancelled: bool,
    pub items_fetched: usize,
    /// Items that failed projection and produced no target
    pub items_failed: usize,
    pub targets_total: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unprocessed: usize,
    pub namespaces: BTreeMap<String, NamespaceStats>,
    pub cleanup: CleanupStats,
    pub results: Vec<TargetResult>,
    pub cleanup_results: Vec<CleanupOutcome>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl SyncSummary {
    /// An empty summary for a cycle starting now
    pub fn begin(cycle_id: impl Into<String>, dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            cycle_id: cycle_id.into(),
            started_at: now,
            finished_at: now,
            elapsed_ms: 0,
            dry_run,
            cancelled: false,
            items_fetched: 0,
            items_failed: 0,
            targets_total: 0,
            created: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            unprocessed: 0,
            namespaces: BTreeMap::new(),
            cleanup: CleanupStats::default(),
            results: Vec::new(),
            cleanup_results: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Whether any item, target or cleanup candidate failed
    pub fn has_failures(&self) -> bool {
        self.items_failed > 0 || self.failed > 0 || self.cleanup.failed > 0
    }

    pub fn processed(&self) -> usize {
        self.created + self.updated + self.skipped + self.failed
    }

    /// Stamp the end time
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
        self.elapsed_ms = (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
    }

    pub fn one_line(&self) -> String {
        format!(
            "{} items ({} failed), {} targets: {} created, {} updated, {} skipped, {} failed; cleanup: {} deleted, {} stripped, {} failed",
            self.items_fetched,
            self.items_failed,
            self.targets_total,
            self.created,
            self.updated,
            self.skipped,
            self.failed,
            self.cleanup.deleted,
            self.cleanup.keys_removed,
            self.cleanup.failed
        )
    }
}

#[derive(Debug, Default)]
struct Counters {
    created: AtomicUsize,
    updated: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    fn add(&self, outcome: SyncOutcome) {
        let counter = match outcome {
            SyncOutcome::Created => &self.created,
            SyncOutcome::Updated => &self.updated,
            SyncOutcome::Skipped => &self.skipped,
            SyncOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> NamespaceStats {
        NamespaceStats {
            created: self.created.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Outcome counters shared by concurrently reconciled targets.
///
/// The namespace set is fixed up front, so recording never takes a lock.
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    totals: Counters,
    namespaces: BTreeMap<String, Counters>,
}

impl StatsAccumulator {
    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            totals: Counters::default(),
            namespaces: namespaces
                .into_iter()
                .map(|ns| (ns.into(), Counters::default()))
                .collect(),
        }
    }

    pub fn record(&self, namespace: &str, outcome: SyncOutcome) {
        self.totals.add(outcome);
        match self.namespaces.get(namespace) {
            Some(counters) => counters.add(outcome),
            None => tracing::debug!("Outcome for untracked namespace {}", namespace),
        }
    }

    pub fn totals(&self) -> NamespaceStats {
        self.totals.snapshot()
    }

    pub fn per_namespace(&self) -> BTreeMap<String, NamespaceStats> {
        self.namespaces
            .iter()
            .map(|(ns, c)| (ns.clone(), c.snapshot()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn accumulator_sums_across_threads() {
        let stats = Arc::new(StatsAccumulator::new(["a", "b"]));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    let ns = if i % 2 == 0 { "a" } else { "b" };
                    for _ in 0..100 {
                        stats.record(ns, SyncOutcome::Created);
                    }
                    stats.record(ns, SyncOutcome::Failed);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.totals().created, 800);
        assert_eq!(stats.totals().failed, 8);
        let per_ns = stats.per_namespace();
        assert_eq!(per_ns["a"].created, 400);
        assert_eq!(per_ns["b"].total(), 404);
    }

    #[test]
    fn summary_failure_detection_includes_cleanup() {
        let mut summary = SyncSummary::begin("c", false);
        assert!(!summary.has_failures());
        summary.cleanup.failed = 1;
        assert!(summary.has_failures());
    }

    #[test]
    fn summary_failure_detection_includes_failed_items() {
        let mut summary = SyncSummary::begin("c", false);
        summary.items_failed = 1;
        assert!(summary.has_failures());
    }

    #[test]
    fn cleanup_action_describes_key_strip() {
        assert_eq!(
            CleanupAction::KeysRemoved.to_string(),
            "keys removed, external keys preserved"
        );
    }
}
