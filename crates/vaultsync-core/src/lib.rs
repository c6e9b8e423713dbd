//! Reconciliation core for vaultsync
//!
//! This crate turns vault items into cluster secrets and keeps them converged:
//!
//! - **Sanitizer**: text to valid object names and data keys
//! - **Projection**: one item to a secret document and its target namespaces
//! - **Signature**: content hash used to skip no-op writes
//! - **Managed-key ledger and merge**: partial ownership of objects shared
//!   with other tools
//! - **SyncEngine / OrphanCleanup / Orchestrator**: one full sync cycle
//! - **Configuration resolution**: layered defaults, files, and environment
//!
//! # Architecture
//!
//! ```text
//!                     vaultsync-cli
//!                          |
//!                    vaultsync-core
//!                          |
//!              +-----------+-----------+
//!              |                       |
//!        vaultsync-fs           vaultsync-model
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use vaultsync_core::{DirectorySink, ExportSource, Orchestrator};
//!
//! let orchestrator = Orchestrator::new(
//!     Arc::new(ExportSource::new("export.json")),
//!     Arc::new(DirectorySink::new("secrets")),
//! );
//! let summary = orchestrator.sync_once(&CancellationToken::new()).await?;
//! println!("{}", summary.one_line());
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod ledger;
pub mod merge;
pub mod projection;
pub mod sanitize;
pub mod signature;
pub mod sync;

pub use backend::{
    AuditSink, CycleState, CycleStateStore, DirectorySink, ExportSource, FileStateStore, ItemSource,
    JsonLinesAuditSink, LogAuditSink, MemoryStateStore, RetryPolicy, Retrying, SecretSink,
};
pub use config::{ConfigResolver, SyncConfig};
pub use error::{Error, Result};
pub use ledger::{ManagedKeys, ledger_of, parse_ledger, serialize_ledger};
pub use merge::{MergeResult, merge_managed_keys, strip_managed_keys};
pub use projection::{ItemProjection, SyncPlan, TargetPlan, project_item};
pub use sanitize::{sanitize_key, sanitize_name};
pub use signature::compute_signature;
pub use sync::{
    CleanupAction, CleanupOptions, CleanupOutcome, NamespaceStats, Orchestrator, OrphanCleanup,
    SyncEngine, SyncOptions, SyncOutcome, SyncSummary, TargetResult,
};
