//! Data model shared by every vaultsync crate.
//!
//! - [`Item`]: a record as fetched from the vault, read-only
//! - [`SinkSecret`]: an opaque key-value object in the cluster
//! - [`names`]: well-known label, annotation, and reserved field names

pub mod item;
pub mod names;
pub mod secret;

pub use item::{CustomField, FieldType, Item, ItemType, LoginCredentials, SshKey};
pub use names::ReservedField;
pub use secret::{SecretDocument, SinkSecret, TargetKey};
