//! Item projection
//!
//! Turns vault items into the desired state of sink objects:
//!
//! - [`project_item`]: one item to its namespaces, secret name, and document
//! - [`SyncPlan`]: every projection grouped and merged per target

pub mod metadata;
pub mod plan;
pub mod projector;

pub use metadata::parse_metadata;
pub use plan::{SyncPlan, TargetPlan};
pub use projector::{ItemProjection, parse_list, parse_namespaces, project_item, resolve_secret_name};
