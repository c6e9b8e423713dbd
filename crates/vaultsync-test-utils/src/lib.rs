//! Shared test utilities for the vaultsync workspace.
//!
//! In-memory collaborators that record every call and can be told to fail.
//! It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`source`]: [`MemorySource`], a scripted item source
//! - [`sink`]: [`MemorySink`], an in-memory cluster with call recording
//! - [`audit`]: recording and always-failing audit sinks
//! - [`items`]: builders for tagged vault items

pub mod audit;
pub mod items;
pub mod sink;
pub mod source;

pub use audit::{FailingAuditSink, RecordingAuditSink};
pub use items::{login, note, tagged_login};
pub use sink::{MemorySink, SinkCall, SinkOp};
pub use source::MemorySource;
