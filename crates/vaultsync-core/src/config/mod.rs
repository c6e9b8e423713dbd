//! Configuration resolution
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged from these sources (later sources override earlier):
//!
//! 1. **Defaults** - built into [`SyncConfig`]
//! 2. **Global config** - `<config_dir>/vaultsync/config.toml`
//! 3. **Config file** - passed explicitly; TOML, JSON, or YAML
//! 4. **Environment** - `VAULTSYNC_DRY_RUN`, `VAULTSYNC_CLEANUP`, `VAULTSYNC_CONCURRENCY`
//!
//! # Example
//!
//! ```toml
//! [source]
//! export_path = "/var/lib/vaultsync/export.json"
//!
//! [sink]
//! root = "/var/lib/vaultsync/secrets"
//!
//! [sync]
//! concurrency = 8
//!
//! [cleanup]
//! protected_secrets = ["vaultsync-auth-token", "registry-creds"]
//! ```

mod resolver;
mod settings;

pub use resolver::{ConfigResolver, ENV_CLEANUP, ENV_CONCURRENCY, ENV_DRY_RUN};
pub use settings::{
    APP_DIR, AuditConfig, AuditKind, CleanupConfig, LockConfig, SinkConfig, SourceConfig,
    StateConfig, SyncConfig, SyncSection,
};
