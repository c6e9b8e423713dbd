//! Retry wrapper for transport collaborators
//!
//! The engine never retries. Transient transport failures are retried here,
//! one layer below, with exponential backoff.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use serde::{Deserialize, Serialize};

use vaultsync_model::{Item, SinkSecret};

use super::{ItemSource, SecretSink};
use crate::Result;

/// Backoff settings (`[retry]` config section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first
    pub max_attempts: u32,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval_ms: 200,
            max_interval_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.initial_interval_ms))
            .with_max_interval(Duration::from_millis(self.max_interval_ms))
            .with_multiplier(self.multiplier)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Wraps a source or sink, retrying calls that fail with a transient error
#[derive(Debug, Clone)]
pub struct Retrying<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> Retrying<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    async fn call<R, F, Fut>(&self, operation: &str, mut attempt_call: F) -> Result<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0u32;

        backoff::future::retry(self.policy.backoff(), || {
            attempt += 1;
            let current = attempt;
            let pending = attempt_call();
            async move {
                pending.await.map_err(|e| {
                    if e.is_transient() && current < max_attempts {
                        tracing::debug!(
                            "{} failed (attempt {}/{}), retrying: {}",
                            operation,
                            current,
                            max_attempts,
                            e
                        );
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
            }
        })
        .await
    }
}

#[async_trait]
impl<T: ItemSource> ItemSource for Retrying<T> {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        self.call("fetch_items", || self.inner.fetch_items()).await
    }

    async fn authenticate(&self) -> Result<bool> {
        self.call("authenticate", || self.inner.authenticate()).await
    }
}

#[async_trait]
impl<T: SecretSink> SecretSink for Retrying<T> {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        self.call("namespace_exists", || self.inner.namespace_exists(namespace))
            .await
    }

    async fn list_namespaces(&self) -> Result<Vec<String>> {
        self.call("list_namespaces", || self.inner.list_namespaces())
            .await
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SinkSecret>> {
        self.call("get_secret", || self.inner.get_secret(namespace, name))
            .await
    }

    async fn create_secret(&self, secret: &SinkSecret) -> Result<()> {
        self.call("create_secret", || self.inner.create_secret(secret))
            .await
    }

    async fn update_secret(&self, secret: &SinkSecret) -> Result<()> {
        self.call("update_secret", || self.inner.update_secret(secret))
            .await
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()> {
        self.call("delete_secret", || self.inner.delete_secret(namespace, name))
            .await
    }

    async fn list_managed_secret_names(&self, namespace: &str) -> Result<Vec<String>> {
        self.call("list_managed_secret_names", || {
            self.inner.list_managed_secret_names(namespace)
        })
        .await
    }

    async fn list_secrets_with_managed_keys(&self, namespace: &str) -> Result<Vec<SinkSecret>> {
        self.call("list_secrets_with_managed_keys", || {
            self.inner.list_secrets_with_managed_keys(namespace)
        })
        .await
    }
}
