//! Sink-side secret types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::names::{CREATED_BY_LABEL, CREATED_BY_VALUE};

/// Key/value payload destined for one sink object.
///
/// Ordered so that iteration, serialization, and hashing are deterministic.
pub type SecretDocument = BTreeMap<String, String>;

/// Identity of one sink object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetKey {
    pub namespace: String,
    pub name: String,
}

impl TargetKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for TargetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// An opaque secret object as stored in the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkSecret {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub data: SecretDocument,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl SinkSecret {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: SecretDocument) -> Self {
        self.data = data;
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn key(&self) -> TargetKey {
        TargetKey::new(&self.namespace, &self.name)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Whether the object carries this system's creation marker
    pub fn is_created_by_sync(&self) -> bool {
        self.label(CREATED_BY_LABEL) == Some(CREATED_BY_VALUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_key_displays_as_namespace_slash_name() {
        assert_eq!(TargetKey::new("prod", "db").to_string(), "prod/db");
    }

    #[test]
    fn created_by_marker_requires_exact_value() {
        let ours = SinkSecret::new("ns", "a").with_label(CREATED_BY_LABEL, CREATED_BY_VALUE);
        let theirs = SinkSecret::new("ns", "b").with_label(CREATED_BY_LABEL, "helm");
        assert!(ours.is_created_by_sync());
        assert!(!theirs.is_created_by_sync());
        assert!(!SinkSecret::new("ns", "c").is_created_by_sync());
    }
}
