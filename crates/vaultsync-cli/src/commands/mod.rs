//! Command implementations for vaultsync-cli

pub mod config;
pub mod render;
pub mod sync;

use vaultsync_core::{DirectorySink, ExportSource, SyncConfig};

use crate::error::{CliError, Result};

pub use config::run_config;
pub use render::run_render;
pub use sync::{SyncArgs, run_sync};

/// Process exit status of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// The command aborted
    Fatal,
    /// The cycle ran but some targets or cleanup candidates failed
    Failures,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Fatal => 1,
            Self::Failures => 2,
        }
    }
}

/// The configured vault export
pub(crate) fn export_source(config: &SyncConfig) -> Result<ExportSource> {
    let path = config
        .source
        .export_path
        .as_ref()
        .ok_or_else(|| CliError::user("source.export_path is not configured"))?;
    Ok(ExportSource::new(path))
}

/// The configured secret directory
pub(crate) fn directory_sink(config: &SyncConfig) -> Result<DirectorySink> {
    let root = config
        .sink
        .root
        .as_ref()
        .ok_or_else(|| CliError::user("sink.root is not configured"))?;
    if !root.is_dir() {
        return Err(CliError::user(format!(
            "sink root {} is not a directory",
            root.display()
        )));
    }
    Ok(DirectorySink::new(root))
}
