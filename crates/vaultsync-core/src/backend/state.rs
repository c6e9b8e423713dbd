//! Cycle state stores

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use vaultsync_fs::io;

use super::{CycleState, CycleStateStore};
use crate::Result;

/// Keeps the cycle state in memory; lost on restart
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<CycleState>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: CycleState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

#[async_trait]
impl CycleStateStore for MemoryStateStore {
    async fn load(&self) -> Result<CycleState> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &CycleState) -> Result<()> {
        *self.state.lock().await = state.clone();
        Ok(())
    }
}

/// Persists the cycle state as a JSON file, written atomically
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CycleStateStore for FileStateStore {
    async fn load(&self) -> Result<CycleState> {
        match io::read_text_if_exists(&self.path)? {
            Some(content) if !content.trim().is_empty() => Ok(serde_json::from_str(&content)?),
            _ => Ok(CycleState::default()),
        }
    }

    async fn save(&self, state: &CycleState) -> Result<()> {
        let content = serde_json::to_string_pretty(state)?;
        io::write_text(&self.path, &content)?;
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        io::remove_if_exists(&self.path)?;
        Ok(())
    }
}
