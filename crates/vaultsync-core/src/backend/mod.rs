//! Collaborator interfaces
//!
//! The engine talks to the outside world only through these traits:
//!
//! - [`ItemSource`]: the password vault
//! - [`SecretSink`]: the cluster secret store
//! - [`AuditSink`]: outcome and summary recording
//! - [`CycleStateStore`]: what the previous cycle saw
//!
//! Bundled implementations let the engine run against local files.

mod audit;
mod directory;
mod export;
mod retry;
mod state;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vaultsync_model::{Item, SinkSecret};

use crate::Result;
use crate::sync::{CleanupOutcome, SyncSummary, TargetResult};

pub use audit::{JsonLinesAuditSink, LogAuditSink};
pub use directory::DirectorySink;
pub use export::ExportSource;
pub use retry::{RetryPolicy, Retrying};
pub use state::{FileStateStore, MemoryStateStore};

/// Source of vault items
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch every item visible to the current session.
    async fn fetch_items(&self) -> Result<Vec<Item>>;

    /// (Re-)establish the session. `Ok(false)` means the credentials were
    /// rejected.
    async fn authenticate(&self) -> Result<bool>;
}

/// Cluster secret store
#[async_trait]
pub trait SecretSink: Send + Sync {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool>;

    async fn list_namespaces(&self) -> Result<Vec<String>>;

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SinkSecret>>;

    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool> {
        Ok(self.get_secret(namespace, name).await?.is_some())
    }

    async fn create_secret(&self, secret: &SinkSecret) -> Result<()>;

    /// Replace data, labels, and annotations of an existing object.
    async fn update_secret(&self, secret: &SinkSecret) -> Result<()>;

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()>;

    /// Names of objects in `namespace` carrying the created-by marker.
    async fn list_managed_secret_names(&self, namespace: &str) -> Result<Vec<String>>;

    /// Objects in `namespace` carrying the created-by marker and a ledger
    /// annotation.
    async fn list_secrets_with_managed_keys(&self, namespace: &str) -> Result<Vec<SinkSecret>>;
}

/// Records what each cycle did. Failures here never fail a cycle.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record_outcome(&self, result: &TargetResult) -> Result<()>;

    async fn record_cleanup(&self, outcome: &CleanupOutcome) -> Result<()>;

    async fn record_summary(&self, summary: &SyncSummary) -> Result<()>;

    /// A cycle aborted with a fatal error
    async fn record_failure(&self, cycle_id: &str, message: &str) -> Result<()>;
}

/// What the previous cycle observed, persisted between cycles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleState {
    /// Number of items the previous cycle fetched
    pub last_item_count: usize,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait CycleStateStore: Send + Sync {
    async fn load(&self) -> Result<CycleState>;

    async fn save(&self, state: &CycleState) -> Result<()>;

    async fn reset(&self) -> Result<()> {
        self.save(&CycleState::default()).await
    }
}
