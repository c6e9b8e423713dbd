//! [`MemorySink`]: an in-memory cluster

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use vaultsync_core::{Error, Result, SecretSink};
use vaultsync_model::names::MANAGED_KEYS_ANNOTATION;
use vaultsync_model::{SecretDocument, SinkSecret, TargetKey};

/// Sink operation, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkOp {
    NamespaceExists,
    ListNamespaces,
    Get,
    Create,
    Update,
    Delete,
    ListManaged,
}

/// One recorded sink call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    NamespaceExists(String),
    ListNamespaces,
    Get(TargetKey),
    Create(TargetKey),
    Update(TargetKey),
    Delete(TargetKey),
    ListManagedNames(String),
    ListWithManagedKeys(String),
}

impl SinkCall {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Create(_) | Self::Update(_) | Self::Delete(_))
    }
}

#[derive(Debug, Clone)]
struct Failure {
    op: SinkOp,
    namespace: Option<String>,
    name: Option<String>,
    transient: bool,
}

impl Failure {
    fn matches(&self, op: SinkOp, namespace: Option<&str>, name: Option<&str>) -> bool {
        self.op == op
            && self.namespace.as_deref().is_none_or(|ns| Some(ns) == namespace)
            && self.name.as_deref().is_none_or(|n| Some(n) == name)
    }
}

/// An in-memory sink recording every call.
///
/// Namespaces must be added before secrets can be created in them.
#[derive(Debug, Default)]
pub struct MemorySink {
    namespaces: Mutex<BTreeSet<String>>,
    secrets: Mutex<BTreeMap<TargetKey, SinkSecret>>,
    calls: Mutex<Vec<SinkCall>>,
    failures: Mutex<Vec<Failure>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink with the given namespaces already present
    pub fn with_namespaces(namespaces: &[&str]) -> Self {
        let sink = Self::new();
        for ns in namespaces {
            sink.add_namespace(ns);
        }
        sink
    }

    pub fn add_namespace(&self, namespace: &str) {
        self.namespaces.lock().unwrap().insert(namespace.to_string());
    }

    /// Store an object directly, bypassing recording and failures
    pub fn insert(&self, secret: SinkSecret) {
        self.add_namespace(&secret.namespace);
        self.secrets.lock().unwrap().insert(secret.key(), secret);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<SinkSecret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&TargetKey::new(namespace, name))
            .cloned()
    }

    /// Data of a stored object
    ///
    /// # Panics
    /// Panics if the object does not exist.
    pub fn data(&self, namespace: &str, name: &str) -> SecretDocument {
        self.secret(namespace, name)
            .unwrap_or_else(|| panic!("no secret {}/{}", namespace, name))
            .data
    }

    pub fn secret_count(&self) -> usize {
        self.secrets.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Number of create, update, and delete calls made
    pub fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_mutation())
            .count()
    }

    /// Fail every `op` call on `namespace` (any when `None`) and `name`
    /// (any when `None`) with a transient transport error.
    pub fn fail_transport(&self, op: SinkOp, namespace: Option<&str>, name: Option<&str>) {
        self.push_failure(op, namespace, name, true);
    }

    /// Like [`fail_transport`](Self::fail_transport) with a non-retryable
    /// backend error.
    pub fn fail_backend(&self, op: SinkOp, namespace: Option<&str>, name: Option<&str>) {
        self.push_failure(op, namespace, name, false);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    fn push_failure(&self, op: SinkOp, namespace: Option<&str>, name: Option<&str>, transient: bool) {
        self.failures.lock().unwrap().push(Failure {
            op,
            namespace: namespace.map(str::to_string),
            name: name.map(str::to_string),
            transient,
        });
    }

    fn record(&self, call: SinkCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: SinkOp, namespace: Option<&str>, name: Option<&str>) -> Result<()> {
        let failures = self.failures.lock().unwrap();
        match failures.iter().find(|f| f.matches(op, namespace, name)) {
            Some(f) if f.transient => Err(Error::transport(format!("injected {:?} timeout", op))),
            Some(_) => Err(Error::backend(format!("injected {:?} failure", op))),
            None => Ok(()),
        }
    }

    fn require_namespace(&self, namespace: &str) -> Result<()> {
        if self.namespaces.lock().unwrap().contains(namespace) {
            Ok(())
        } else {
            Err(Error::TargetNotFound {
                namespace: namespace.to_string(),
            })
        }
    }

    fn managed(&self, namespace: &str) -> Vec<SinkSecret> {
        self.secrets
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.namespace == namespace && s.is_created_by_sync())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SecretSink for MemorySink {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        self.record(SinkCall::NamespaceExists(namespace.to_string()));
        self.check(SinkOp::NamespaceExists, Some(namespace), None)?;
        Ok(self.namespaces.lock().unwrap().contains(namespace))
    }

    async fn list_namespaces(&self) -> Result<Vec<String>> {
        self.record(SinkCall::ListNamespaces);
        self.check(SinkOp::ListNamespaces, None, None)?;
        Ok(self.namespaces.lock().unwrap().iter().cloned().collect())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SinkSecret>> {
        self.record(SinkCall::Get(TargetKey::new(namespace, name)));
        self.check(SinkOp::Get, Some(namespace), Some(name))?;
        Ok(self.secret(namespace, name))
    }

    async fn create_secret(&self, secret: &SinkSecret) -> Result<()> {
        self.record(SinkCall::Create(secret.key()));
        self.check(SinkOp::Create, Some(&secret.namespace), Some(&secret.name))?;
        self.require_namespace(&secret.namespace)?;
        let mut secrets = self.secrets.lock().unwrap();
        if secrets.contains_key(&secret.key()) {
            return Err(Error::backend(format!("{} already exists", secret.key())));
        }
        secrets.insert(secret.key(), secret.clone());
        Ok(())
    }

    async fn update_secret(&self, secret: &SinkSecret) -> Result<()> {
        self.record(SinkCall::Update(secret.key()));
        self.check(SinkOp::Update, Some(&secret.namespace), Some(&secret.name))?;
        let mut secrets = self.secrets.lock().unwrap();
        match secrets.get_mut(&secret.key()) {
            Some(existing) => {
                *existing = secret.clone();
                Ok(())
            }
            None => Err(Error::backend(format!("{} does not exist", secret.key()))),
        }
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()> {
        self.record(SinkCall::Delete(TargetKey::new(namespace, name)));
        self.check(SinkOp::Delete, Some(namespace), Some(name))?;
        self.secrets
            .lock()
            .unwrap()
            .remove(&TargetKey::new(namespace, name));
        Ok(())
    }

    async fn list_managed_secret_names(&self, namespace: &str) -> Result<Vec<String>> {
        self.record(SinkCall::ListManagedNames(namespace.to_string()));
        self.check(SinkOp::ListManaged, Some(namespace), None)?;
        Ok(self.managed(namespace).into_iter().map(|s| s.name).collect())
    }

    async fn list_secrets_with_managed_keys(&self, namespace: &str) -> Result<Vec<SinkSecret>> {
        self.record(SinkCall::ListWithManagedKeys(namespace.to_string()));
        self.check(SinkOp::ListManaged, Some(namespace), None)?;
        Ok(self
            .managed(namespace)
            .into_iter()
            .filter(|s| s.annotation(MANAGED_KEYS_ANNOTATION).is_some())
            .collect())
    }
}
