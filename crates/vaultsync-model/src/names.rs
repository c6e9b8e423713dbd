//! Well-known names used on sink objects and in vault custom fields.

/// Label carrying the owning system's name. Never overwritten once present.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Label marking objects this system created or writes to
pub const CREATED_BY_LABEL: &str = "vaultsync.io/created-by";

/// Value of [`CREATED_BY_LABEL`]
pub const CREATED_BY_VALUE: &str = "sync";

/// Default value of [`MANAGED_BY_LABEL`]
pub const DEFAULT_SYSTEM_NAME: &str = "vaultsync";

/// Annotation holding the managed-keys ledger (JSON array of key names)
pub const MANAGED_KEYS_ANNOTATION: &str = "vaultsync.io/managed-keys";

/// Annotation holding the content signature of the last write
pub const SIGNATURE_ANNOTATION: &str = "vaultsync.io/content-signature";

/// Annotation holding the RFC 3339 time of the last write
pub const LAST_SYNCED_ANNOTATION: &str = "vaultsync.io/last-synced";

/// Annotation listing the item-supplied annotation keys of the last write
pub const MANAGED_ANNOTATIONS_ANNOTATION: &str = "vaultsync.io/managed-annotations";

/// Annotations owned by the sync itself; excluded from content signatures.
pub const SYSTEM_ANNOTATIONS: [&str; 4] = [
    MANAGED_KEYS_ANNOTATION,
    SIGNATURE_ANNOTATION,
    LAST_SYNCED_ANNOTATION,
    MANAGED_ANNOTATIONS_ANNOTATION,
];

/// Labels owned by the sync itself; item metadata cannot set them.
pub const SYSTEM_LABELS: [&str; 2] = [MANAGED_BY_LABEL, CREATED_BY_LABEL];

/// Custom field names that configure projection rather than become data keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedField {
    /// Comma-separated target namespaces
    Namespaces,
    /// Override for the secret object name
    SecretName,
    /// Override for the key holding the item's main value
    SecretKeyPassword,
    /// Override for the key holding a login's username
    SecretKeyUsername,
    /// Comma-separated custom field names to leave out
    IgnoreField,
    /// `key=value` / `key: value` lines added as annotations
    SecretAnnotation,
    /// `key=value` / `key: value` lines added as labels
    SecretLabel,
}

impl ReservedField {
    pub const ALL: [ReservedField; 7] = [
        Self::Namespaces,
        Self::SecretName,
        Self::SecretKeyPassword,
        Self::SecretKeyUsername,
        Self::IgnoreField,
        Self::SecretAnnotation,
        Self::SecretLabel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Namespaces => "namespaces",
            Self::SecretName => "secret-name",
            Self::SecretKeyPassword => "secret-key-password",
            Self::SecretKeyUsername => "secret-key-username",
            Self::IgnoreField => "ignore-field",
            Self::SecretAnnotation => "secret-annotation",
            Self::SecretLabel => "secret-label",
        }
    }

    /// Match a custom field name, ignoring case and surrounding whitespace.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for ReservedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
