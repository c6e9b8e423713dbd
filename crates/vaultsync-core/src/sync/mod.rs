//! Sync cycle machinery
//!
//! This module provides:
//! - **engine**: reconcile planned targets against the sink
//! - **cleanup**: remove managed keys from objects no item targets anymore
//! - **orchestrator**: one full cycle from lock to summary
//! - **report**: per-target outcomes and the cycle summary

mod cleanup;
mod engine;
mod orchestrator;
mod report;

pub use cleanup::{CleanupOptions, CleanupReport, DEFAULT_PROTECTED_SECRET, OrphanCleanup};
pub use engine::{DEFAULT_CONCURRENCY, ReconcileReport, SyncEngine, SyncOptions};
pub use orchestrator::Orchestrator;
pub use report::{
    CleanupAction, CleanupOutcome, CleanupStats, NamespaceStats, StatsAccumulator, SyncOutcome,
    SyncSummary, TargetResult,
};
