//! Vault export file source

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use vaultsync_model::Item;

use super::ItemSource;
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExportFile {
    Wrapped { items: Vec<Item> },
    Bare(Vec<Item>),
}

/// Reads items from a JSON vault export.
///
/// Accepts `{"items": [...]}` or a bare array. The file is re-read on every
/// fetch, so edits show up in the next cycle.
#[derive(Debug, Clone)]
pub struct ExportSource {
    path: PathBuf,
}

impl ExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse export content
    pub fn parse(content: &str) -> Result<Vec<Item>> {
        let file: ExportFile = serde_json::from_str(content)?;
        Ok(match file {
            ExportFile::Wrapped { items } => items,
            ExportFile::Bare(items) => items,
        })
    }
}

#[async_trait]
impl ItemSource for ExportSource {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::backend(format!("reading {}: {}", self.path.display(), e)))?;
        let items = Self::parse(&content)?;
        tracing::debug!("Read {} items from {}", items.len(), self.path.display());
        Ok(items)
    }

    async fn authenticate(&self) -> Result<bool> {
        // The export needs no session; being readable is enough
        Ok(tokio::fs::try_exists(&self.path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_and_bare_exports() {
        let wrapped = r#"{"items":[{"id":"1","name":"a","type":"secure-note","notes":"n"}]}"#;
        let bare = r#"[{"id":"1","name":"a","type":"secure-note","notes":"n"}]"#;

        assert_eq!(ExportSource::parse(wrapped).unwrap().len(), 1);
        assert_eq!(ExportSource::parse(bare).unwrap().len(), 1);
    }

    #[test]
    fn rejects_malformed_export() {
        assert!(matches!(
            ExportSource::parse("{\"items\": 3}"),
            Err(Error::Json(_))
        ));
    }
}
