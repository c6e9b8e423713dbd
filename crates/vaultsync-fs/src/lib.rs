//! Filesystem primitives for vaultsync
//!
//! Provides the process lock that serializes sync cycles across processes,
//! atomic file writes, canonical content checksums, and format-agnostic
//! configuration loading.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod lock;

pub use checksum::compute_content_checksum;
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use lock::{ProcessLock, ProcessLockGuard};
