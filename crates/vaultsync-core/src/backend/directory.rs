//! Directory-backed secret sink
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   <namespace>/
//!     <secret-name>.json
//! ```
//!
//! A namespace exists when its subdirectory exists; the sink never creates
//! namespaces. Secret files hold the serialized [`SinkSecret`] and are written
//! atomically. Filesystem calls run on the blocking thread pool.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use vaultsync_fs::io;
use vaultsync_model::SinkSecret;
use vaultsync_model::names::MANAGED_KEYS_ANNOTATION;

use super::SecretSink;
use crate::{Error, Result};

const SECRET_EXTENSION: &str = "json";

/// Sink storing secrets as JSON files below a root directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a namespace directory
    pub fn create_namespace(&self, namespace: &str) -> Result<()> {
        let dir = self.namespace_dir(namespace)?;
        fs::create_dir_all(&dir).map_err(|e| vaultsync_fs::Error::io(&dir, e))?;
        Ok(())
    }

    fn namespace_dir(&self, namespace: &str) -> Result<PathBuf> {
        check_segment(namespace)?;
        Ok(self.root.join(namespace))
    }

    fn secret_path(&self, namespace: &str, name: &str) -> Result<PathBuf> {
        check_segment(name)?;
        Ok(self
            .namespace_dir(namespace)?
            .join(format!("{}.{}", name, SECRET_EXTENSION)))
    }

    fn read_secret(&self, path: &Path) -> Result<Option<SinkSecret>> {
        match io::read_text_if_exists(path)? {
            Some(content) => Ok(Some(serde_json::from_str(&content)?)),
            None => Ok(None),
        }
    }

    fn write_secret(&self, secret: &SinkSecret) -> Result<()> {
        let path = self.secret_path(&secret.namespace, &secret.name)?;
        let content = serde_json::to_string_pretty(secret)?;
        io::write_text(&path, &content)?;
        Ok(())
    }

    fn require_namespace(&self, namespace: &str) -> Result<()> {
        if self.namespace_dir(namespace)?.is_dir() {
            Ok(())
        } else {
            Err(Error::TargetNotFound {
                namespace: namespace.to_string(),
            })
        }
    }

    fn managed_secrets(&self, namespace: &str) -> Result<Vec<SinkSecret>> {
        let dir = self.namespace_dir(namespace)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut secrets = Vec::new();
        let entries = fs::read_dir(&dir).map_err(|e| vaultsync_fs::Error::io(&dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| vaultsync_fs::Error::io(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SECRET_EXTENSION) {
                continue;
            }
            match self.read_secret(&path) {
                Ok(Some(secret)) if secret.is_created_by_sync() => secrets.push(secret),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable secret {}: {}", path.display(), e),
            }
        }
        secrets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(secrets)
    }

    fn namespaces(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let entries =
            fs::read_dir(&self.root).map_err(|e| vaultsync_fs::Error::io(&self.root, e))?;

        let mut namespaces = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| vaultsync_fs::Error::io(&self.root, e))?;
            if entry.path().is_dir()
                && let Some(name) = entry.file_name().to_str()
                && !name.starts_with('.')
            {
                namespaces.push(name.to_string());
            }
        }
        namespaces.sort();
        Ok(namespaces)
    }

    /// Run filesystem work off the async runtime
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&DirectorySink) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sink = self.clone();
        tokio::task::spawn_blocking(move || op(&sink))
            .await
            .map_err(|e| Error::backend(format!("directory sink task failed: {}", e)))?
    }
}

/// Reject names that would escape the sink root
fn check_segment(segment: &str) -> Result<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
    {
        return Err(Error::invalid_argument(format!(
            "invalid sink path segment {:?}",
            segment
        )));
    }
    Ok(())
}

#[async_trait]
impl SecretSink for DirectorySink {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        let namespace = namespace.to_string();
        self.blocking(move |sink| Ok(sink.namespace_dir(&namespace)?.is_dir()))
            .await
    }

    async fn list_namespaces(&self) -> Result<Vec<String>> {
        self.blocking(|sink| sink.namespaces()).await
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SinkSecret>> {
        let (namespace, name) = (namespace.to_string(), name.to_string());
        self.blocking(move |sink| sink.read_secret(&sink.secret_path(&namespace, &name)?))
            .await
    }

    async fn create_secret(&self, secret: &SinkSecret) -> Result<()> {
        let secret = secret.clone();
        self.blocking(move |sink| {
            sink.require_namespace(&secret.namespace)?;
            if sink.secret_path(&secret.namespace, &secret.name)?.exists() {
                return Err(Error::backend(format!("secret {} already exists", secret.key())));
            }
            sink.write_secret(&secret)
        })
        .await
    }

    async fn update_secret(&self, secret: &SinkSecret) -> Result<()> {
        let secret = secret.clone();
        self.blocking(move |sink| {
            sink.require_namespace(&secret.namespace)?;
            if !sink.secret_path(&secret.namespace, &secret.name)?.exists() {
                return Err(Error::backend(format!("secret {} does not exist", secret.key())));
            }
            sink.write_secret(&secret)
        })
        .await
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()> {
        let (namespace, name) = (namespace.to_string(), name.to_string());
        self.blocking(move |sink| {
            let path = sink.secret_path(&namespace, &name)?;
            if !io::remove_if_exists(&path)? {
                tracing::debug!("Secret {}/{} already absent", namespace, name);
            }
            Ok(())
        })
        .await
    }

    async fn list_managed_secret_names(&self, namespace: &str) -> Result<Vec<String>> {
        let namespace = namespace.to_string();
        let secrets = self
            .blocking(move |sink| sink.managed_secrets(&namespace))
            .await?;
        Ok(secrets.into_iter().map(|s| s.name).collect())
    }

    async fn list_secrets_with_managed_keys(&self, namespace: &str) -> Result<Vec<SinkSecret>> {
        let namespace = namespace.to_string();
        let secrets = self
            .blocking(move |sink| sink.managed_secrets(&namespace))
            .await?;
        Ok(secrets
            .into_iter()
            .filter(|s| s.annotation(MANAGED_KEYS_ANNOTATION).is_some())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vaultsync_model::names::{CREATED_BY_LABEL, CREATED_BY_VALUE};

    fn managed(namespace: &str, name: &str) -> SinkSecret {
        SinkSecret::new(namespace, name)
            .with_label(CREATED_BY_LABEL, CREATED_BY_VALUE)
            .with_annotation(MANAGED_KEYS_ANNOTATION, "[\"k\"]")
    }

    #[tokio::test]
    async fn create_requires_existing_namespace() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path());

        let err = sink.create_secret(&managed("prod", "db")).await.unwrap_err();
        assert!(matches!(err, Error::TargetNotFound { .. }));

        sink.create_namespace("prod").unwrap();
        sink.create_secret(&managed("prod", "db")).await.unwrap();
        assert!(sink.secret_exists("prod", "db").await.unwrap());
    }

    #[tokio::test]
    async fn create_fails_when_secret_exists_and_update_when_missing() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path());
        sink.create_namespace("ns").unwrap();

        assert!(sink.update_secret(&managed("ns", "a")).await.is_err());
        sink.create_secret(&managed("ns", "a")).await.unwrap();
        assert!(sink.create_secret(&managed("ns", "a")).await.is_err());
        sink.update_secret(&managed("ns", "a")).await.unwrap();
    }

    #[tokio::test]
    async fn listing_only_returns_sync_created_secrets() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path());
        sink.create_namespace("ns").unwrap();
        sink.create_secret(&managed("ns", "ours")).await.unwrap();
        sink.create_secret(&SinkSecret::new("ns", "theirs")).await.unwrap();
        sink.create_secret(
            &SinkSecret::new("ns", "unledgered").with_label(CREATED_BY_LABEL, CREATED_BY_VALUE),
        )
        .await
        .unwrap();

        assert_eq!(
            sink.list_managed_secret_names("ns").await.unwrap(),
            vec!["ours".to_string(), "unledgered".to_string()]
        );
        let with_keys = sink.list_secrets_with_managed_keys("ns").await.unwrap();
        assert_eq!(with_keys.len(), 1);
        assert_eq!(with_keys[0].name, "ours");
    }

    #[tokio::test]
    async fn namespaces_are_subdirectories() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path());
        sink.create_namespace("b").unwrap();
        sink.create_namespace("a").unwrap();
        std::fs::write(temp.path().join("stray.json"), "{}").unwrap();

        assert_eq!(
            sink.list_namespaces().await.unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(sink.namespace_exists("a").await.unwrap());
        assert!(!sink.namespace_exists("c").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path());

        assert!(matches!(
            sink.get_secret("..", "x").await,
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_writes_from_many_tasks_all_land() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path());
        sink.create_namespace("ns").unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let sink = sink.clone();
                tokio::spawn(async move { sink.create_secret(&managed("ns", &format!("s{i:02}"))).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let names = sink.list_managed_secret_names("ns").await.unwrap();
        assert_eq!(names.len(), 16);
        assert_eq!(names[0], "s00");
        sink.delete_secret("ns", "s00").await.unwrap();
        assert!(!sink.secret_exists("ns", "s00").await.unwrap());
    }
}
