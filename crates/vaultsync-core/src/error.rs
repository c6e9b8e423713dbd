//! Error types for vaultsync-core

use std::path::PathBuf;

/// Result type for vaultsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vaultsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A sanitizer or projector rejected blank or degenerate input
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The target namespace does not exist in the sink
    #[error("Namespace not found: {namespace}")]
    TargetNotFound { namespace: String },

    /// Timeout, throttling, or connection failure talking to source or sink
    #[error("Transport error: {message}")]
    TransientTransport { message: String },

    /// Non-retryable failure reported by the source or sink
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// The source rejected our credentials
    #[error("Authentication failed: {message}")]
    AuthenticationFailure { message: String },

    /// The source returned no items right after a cycle that had items
    #[error(
        "Source returned no items after re-authentication (previous cycle had {previous_count})"
    )]
    PersistentEmptySource { previous_count: usize },

    /// Another sync cycle holds the process lock
    #[error("Another sync is already running (lock {path}, held by pid {holder})")]
    LockHeld { path: PathBuf, holder: String },

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from vaultsync-fs
    #[error(transparent)]
    Fs(vaultsync_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransientTransport {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a transport collaborator may retry the failed call
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientTransport { .. })
    }

    /// Whether this error invalidates the whole cycle rather than one target
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailure { .. }
                | Self::PersistentEmptySource { .. }
                | Self::LockHeld { .. }
                | Self::Config { .. }
        )
    }
}

impl From<vaultsync_fs::Error> for Error {
    fn from(err: vaultsync_fs::Error) -> Self {
        match err {
            vaultsync_fs::Error::LockHeld { path, holder } => Error::LockHeld { path, holder },
            other => Error::Fs(other),
        }
    }
}
