//! Configuration schema

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use vaultsync_model::names::DEFAULT_SYSTEM_NAME;

use crate::backend::RetryPolicy;
use crate::sync::{CleanupOptions, DEFAULT_CONCURRENCY, DEFAULT_PROTECTED_SECRET, SyncOptions};
use crate::{Error, Result};

/// Application directory name under the platform config/data dirs
pub const APP_DIR: &str = "vaultsync";

/// Fully resolved configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub source: SourceConfig,
    pub sink: SinkConfig,
    pub sync: SyncSection,
    pub cleanup: CleanupConfig,
    pub retry: RetryPolicy,
    pub audit: AuditConfig,
    pub lock: LockConfig,
    pub state: StateConfig,
}

/// `[source]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Vault export file read by the bundled source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_path: Option<PathBuf>,
}

/// `[sink]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Root directory of the bundled directory sink
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Value written to the managed-by label
    pub system_name: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            root: None,
            system_name: DEFAULT_SYSTEM_NAME.to_string(),
        }
    }
}

/// `[sync]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub dry_run: bool,
    /// Maximum targets reconciled at once
    pub concurrency: usize,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            dry_run: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// `[cleanup]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub enabled: bool,
    pub protected_secrets: Vec<String>,
    /// Only scan these namespaces; all when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            protected_secrets: vec![DEFAULT_PROTECTED_SECRET.to_string()],
            namespaces: None,
        }
    }
}

/// Where audit records go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditKind {
    /// tracing events
    #[default]
    Log,
    /// JSON lines appended to `audit.path`
    JsonLines,
}

/// `[audit]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub kind: AuditKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// `[lock]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub enabled: bool,
    /// Defaults to `<runtime dir>/vaultsync.lock`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// `[state]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Defaults to `<local data dir>/vaultsync/state.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl SyncConfig {
    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.sync.concurrency == 0 {
            return Err(Error::config("sync.concurrency must be at least 1"));
        }
        if self.sink.system_name.trim().is_empty() {
            return Err(Error::config("sink.system_name must not be empty"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config("retry.max_attempts must be at least 1"));
        }
        if self.retry.multiplier < 1.0 {
            return Err(Error::config("retry.multiplier must be at least 1.0"));
        }
        if self.retry.initial_interval_ms > self.retry.max_interval_ms {
            return Err(Error::config(
                "retry.initial_interval_ms must not exceed retry.max_interval_ms",
            ));
        }
        if self.audit.kind == AuditKind::JsonLines && self.audit.path.is_none() {
            return Err(Error::config("audit.path is required for json-lines audit"));
        }
        Ok(())
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            dry_run: self.sync.dry_run,
            concurrency: self.sync.concurrency,
            system_name: self.sink.system_name.clone(),
        }
    }

    /// Cleanup options, `None` when cleanup is disabled
    pub fn cleanup_options(&self) -> Option<CleanupOptions> {
        self.cleanup.enabled.then(|| CleanupOptions {
            dry_run: self.sync.dry_run,
            protected_secrets: self.cleanup.protected_secrets.clone(),
            namespaces: self.cleanup.namespaces.clone(),
        })
    }

    /// Lock file path, `None` when locking is disabled
    pub fn lock_path(&self) -> Option<PathBuf> {
        if !self.lock.enabled {
            return None;
        }
        Some(self.lock.path.clone().unwrap_or_else(|| {
            dirs::runtime_dir()
                .or_else(dirs::cache_dir)
                .unwrap_or_else(std::env::temp_dir)
                .join(format!("{}.lock", APP_DIR))
        }))
    }

    pub fn state_path(&self) -> PathBuf {
        self.state.path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR)
                .join("state.json")
        })
    }
}
