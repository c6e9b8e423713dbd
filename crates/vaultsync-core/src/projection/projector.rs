//! Projection of one vault item into a secret document
//!
//! Reserved custom fields (see [`ReservedField`]) steer the projection; every
//! other custom field becomes a data key.

use std::collections::{BTreeMap, BTreeSet};

use vaultsync_model::{FieldType, Item, ItemType, ReservedField, SecretDocument};

use super::metadata::parse_metadata_into;
use crate::sanitize::{fingerprint_key, public_key_key, sanitize_key, sanitize_name, username_key};
use crate::{Error, Result};

/// One item's contribution to the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemProjection {
    pub item_id: String,
    /// Target namespaces in field order, deduplicated
    pub namespaces: Vec<String>,
    pub secret_name: String,
    pub document: SecretDocument,
    pub annotations: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    /// Non-fatal problems found while projecting (skipped fields)
    pub warnings: Vec<String>,
}

/// Values of the reserved fields on one item
#[derive(Debug, Default)]
struct ReservedValues<'a> {
    namespaces: Vec<&'a str>,
    secret_name: Option<&'a str>,
    content_key: Option<&'a str>,
    username_key: Option<&'a str>,
    ignored: BTreeSet<String>,
    annotation_blocks: Vec<&'a str>,
    label_blocks: Vec<&'a str>,
}

impl<'a> ReservedValues<'a> {
    fn collect(item: &'a Item) -> Self {
        let mut values = Self::default();
        for field in &item.fields {
            let Some(reserved) = ReservedField::parse(&field.name) else {
                continue;
            };
            let value = field.value_str();
            let non_blank = Some(value.trim()).filter(|v| !v.is_empty());
            match reserved {
                ReservedField::Namespaces => values.namespaces.push(value),
                ReservedField::SecretName => {
                    if non_blank.is_some() {
                        values.secret_name = non_blank;
                    }
                }
                ReservedField::SecretKeyPassword => {
                    if non_blank.is_some() {
                        values.content_key = non_blank;
                    }
                }
                ReservedField::SecretKeyUsername => {
                    if non_blank.is_some() {
                        values.username_key = non_blank;
                    }
                }
                ReservedField::IgnoreField => values.ignored.extend(parse_list(value)),
                ReservedField::SecretAnnotation => values.annotation_blocks.push(value),
                ReservedField::SecretLabel => values.label_blocks.push(value),
            }
        }
        values
    }
}

/// Split a comma-separated list, trimming entries and dropping blanks and
/// repeats while keeping first-seen order.
pub fn parse_list(value: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter(|entry| seen.insert(entry.to_string()))
        .map(str::to_string)
        .collect()
}

/// Target namespaces of an item; empty when the item is not tagged.
pub fn parse_namespaces(item: &Item) -> Vec<String> {
    let joined = ReservedValues::collect(item).namespaces.join(",");
    parse_list(&joined)
}

/// Secret name of an item: the `secret-name` override, else its display name,
/// sanitized either way.
pub fn resolve_secret_name(item: &Item) -> Result<String> {
    let values = ReservedValues::collect(item);
    sanitize_name(values.secret_name.unwrap_or(item.name.as_str()))
}

/// Project an item.
///
/// Returns `Ok(None)` when the item carries no target namespaces; that is an
/// ordinary, informational skip.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] when the secret name or a key-name
/// override cannot be sanitized.
pub fn project_item(item: &Item) -> Result<Option<ItemProjection>> {
    let values = ReservedValues::collect(item);

    let namespaces = parse_list(&values.namespaces.join(","));
    if namespaces.is_empty() {
        return Ok(None);
    }

    let secret_name = sanitize_name(values.secret_name.unwrap_or(item.name.as_str()))
        .map_err(|e| Error::invalid_argument(format!("item {}: secret name: {}", item.id, e)))?;
    let content_key = match values.content_key {
        Some(key) => sanitize_key(key).map_err(|e| {
            Error::invalid_argument(format!("item {}: content key: {}", item.id, e))
        })?,
        None => secret_name.clone(),
    };
    let user_key = match values.username_key {
        Some(key) => sanitize_key(key).map_err(|e| {
            Error::invalid_argument(format!("item {}: username key: {}", item.id, e))
        })?,
        None => username_key(&secret_name),
    };

    let mut document = seed_document(item, &secret_name, &content_key, &user_key);
    let mut warnings = Vec::new();

    for field in &item.fields {
        if ReservedField::parse(&field.name).is_some() || values.ignored.contains(field.name.trim()) {
            continue;
        }

        let value = match field.field_type {
            FieldType::Linked => match item.linked_value(field.value_str()) {
                Some(v) => v.to_string(),
                None => {
                    warnings.push(format!(
                        "item {}: linked field {:?} does not resolve; skipped",
                        item.id, field.name
                    ));
                    continue;
                }
            },
            _ => field.value_str().to_string(),
        };

        match sanitize_key(field.name.as_str()) {
            Ok(key) => {
                document.insert(key, value);
            }
            Err(e) => warnings.push(format!(
                "item {}: field {:?} skipped: {}",
                item.id, field.name, e
            )),
        }
    }

    let mut annotations = BTreeMap::new();
    for block in &values.annotation_blocks {
        parse_metadata_into(block, &mut annotations);
    }
    let mut labels = BTreeMap::new();
    for block in &values.label_blocks {
        parse_metadata_into(block, &mut labels);
    }

    Ok(Some(ItemProjection {
        item_id: item.id.clone(),
        namespaces,
        secret_name,
        document,
        annotations,
        labels,
        warnings,
    }))
}

/// Initial document built from the item's built-in credential fields.
fn seed_document(item: &Item, secret_name: &str, content_key: &str, user_key: &str) -> SecretDocument {
    let mut document = SecretDocument::new();
    let fallback = |value: &str| {
        if value.is_empty() {
            item.name.clone()
        } else {
            value.to_string()
        }
    };

    match item.item_type {
        ItemType::Login => {
            document.insert(content_key.to_string(), fallback(item.password()));
            let username = item.username();
            if !username.is_empty() {
                document.insert(user_key.to_string(), username.to_string());
            }
        }
        ItemType::SecureNote => {
            document.insert(content_key.to_string(), fallback(item.notes()));
        }
        ItemType::SshKey => {
            let key = item.ssh_key.clone().unwrap_or_default();
            document.insert(
                content_key.to_string(),
                fallback(key.private_key.as_deref().unwrap_or("")),
            );
            if let Some(public) = key.public_key.filter(|v| !v.is_empty()) {
                document.insert(public_key_key(secret_name), public);
            }
            if let Some(fingerprint) = key.key_fingerprint.filter(|v| !v.is_empty()) {
                document.insert(fingerprint_key(secret_name), fingerprint);
            }
        }
    }

    document
}
