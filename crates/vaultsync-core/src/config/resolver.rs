//! Configuration resolution with hierarchical merge
//!
//! The `ConfigResolver` loads and merges configuration from multiple sources
//! in a defined hierarchy, with later sources overriding earlier ones.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use vaultsync_fs::ConfigStore;

use super::settings::{APP_DIR, SyncConfig};
use crate::{Error, Result};

/// Environment variable forcing dry-run (`true`/`false`)
pub const ENV_DRY_RUN: &str = "VAULTSYNC_DRY_RUN";
/// Environment variable toggling orphan cleanup (`true`/`false`)
pub const ENV_CLEANUP: &str = "VAULTSYNC_CLEANUP";
/// Environment variable setting `sync.concurrency`
pub const ENV_CONCURRENCY: &str = "VAULTSYNC_CONCURRENCY";

/// Resolves configuration by merging multiple sources
///
/// Configuration is loaded from a hierarchy of sources:
/// 1. Built-in defaults
/// 2. Global config (`<config_dir>/vaultsync/config.toml`)
/// 3. Explicit config file (TOML, JSON, or YAML by extension)
/// 4. Environment overrides (`VAULTSYNC_*`)
///
/// Later sources override earlier ones, with deep merging for tables.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    explicit_path: Option<PathBuf>,

    /// Override for the global config directory (used for testing).
    /// When `None`, the platform-appropriate directory is used via `dirs::config_dir()`.
    global_config_dir_override: Option<PathBuf>,

    /// Replacement for the process environment (used for testing)
    env_override: Option<BTreeMap<String, String>>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also load `path` on top of the global config
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    /// Use a custom global config directory instead of the platform one
    pub fn with_global_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.global_config_dir_override = Some(dir.into());
        self
    }

    /// Read environment overrides from `vars` instead of the process
    /// environment
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_override = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join(APP_DIR))
    }

    fn env_var(&self, name: &str) -> Option<String> {
        match &self.env_override {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
    }

    /// Resolve and validate the configuration.
    ///
    /// A missing global config is skipped; a missing explicit file is an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error when a layer cannot be parsed, an environment value is
    /// malformed, or the merged configuration fails validation.
    pub fn resolve(&self) -> Result<SyncConfig> {
        let store = ConfigStore::new();
        let mut merged = serde_json::to_value(SyncConfig::default())?;

        // Layer 2 - Global config
        if let Some(global_dir) = self.global_config_dir() {
            let global_path = global_dir.join("config.toml");
            match store.load_optional::<Value>(&global_path)? {
                Some(layer) => {
                    tracing::debug!(?global_path, "Loading global config (layer 2)");
                    deep_merge(&mut merged, layer);
                }
                None => tracing::debug!(?global_path, "No global config found (layer 2)"),
            }
        }

        // Layer 3 - Explicit file
        if let Some(path) = &self.explicit_path {
            tracing::debug!(?path, "Loading config file (layer 3)");
            let layer: Value = store.load(path)?;
            deep_merge(&mut merged, layer);
        }

        let mut config: SyncConfig = serde_json::from_value(merged)
            .map_err(|e| Error::config(format!("invalid configuration: {}", e)))?;

        // Layer 4 - Environment
        self.apply_env(&mut config)?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&self, config: &mut SyncConfig) -> Result<()> {
        if let Some(value) = self.env_var(ENV_DRY_RUN) {
            config.sync.dry_run = parse_bool(ENV_DRY_RUN, &value)?;
        }
        if let Some(value) = self.env_var(ENV_CLEANUP) {
            config.cleanup.enabled = parse_bool(ENV_CLEANUP, &value)?;
        }
        if let Some(value) = self.env_var(ENV_CONCURRENCY) {
            config.sync.concurrency = value.trim().parse().map_err(|_| {
                Error::config(format!("{} must be a positive integer, got {:?}", ENV_CONCURRENCY, value))
            })?;
        }
        Ok(())
    }

    pub fn explicit_path(&self) -> Option<&Path> {
        self.explicit_path.as_deref()
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("{} must be a boolean, got {:?}", name, value))),
    }
}

/// Merge `overlay` into `base`. Objects merge recursively; anything else is
/// replaced.
fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
