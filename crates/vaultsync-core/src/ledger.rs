//! Managed-keys ledger
//!
//! The ledger records which data keys of a sink object this system owns. It
//! is persisted in the [`MANAGED_KEYS_ANNOTATION`] annotation as a JSON array
//! of sorted, unique key names. Keys outside the ledger belong to someone else
//! and are never removed.

use std::collections::BTreeSet;

use vaultsync_model::SinkSecret;
use vaultsync_model::names::MANAGED_KEYS_ANNOTATION;

/// Set of data keys owned by the sync on one sink object
pub type ManagedKeys = BTreeSet<String>;

/// Serialize a ledger for storage in an annotation.
///
/// Output is deterministic: keys are deduplicated and sorted.
pub fn serialize_ledger<I, S>(keys: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sorted: BTreeSet<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
    // A set of strings always serializes
    serde_json::to_string(&sorted).unwrap_or_else(|_| "[]".to_string())
}

/// Parse a stored ledger.
///
/// Missing, blank, or malformed values parse to an empty ledger, which makes
/// the sync treat every existing key as externally owned. A comma-separated
/// list is accepted as well as the JSON form.
pub fn parse_ledger(raw: Option<&str>) -> ManagedKeys {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return ManagedKeys::new();
    };

    if raw.starts_with('[') {
        return match serde_json::from_str::<Vec<String>>(raw) {
            Ok(keys) => keys.into_iter().filter(|k| !k.is_empty()).collect(),
            Err(e) => {
                tracing::warn!("Ignoring malformed managed-keys ledger: {}", e);
                ManagedKeys::new()
            }
        };
    }

    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read the ledger stored on a sink object
pub fn ledger_of(secret: &SinkSecret) -> ManagedKeys {
    parse_ledger(secret.annotation(MANAGED_KEYS_ANNOTATION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_is_sorted_and_deduplicated() {
        assert_eq!(serialize_ledger(["b", "a", "b"]), r#"["a","b"]"#);
    }

    #[test]
    fn empty_ledger_serializes_to_empty_array() {
        assert_eq!(serialize_ledger(Vec::<String>::new()), "[]");
    }

    #[test]
    fn missing_or_blank_parses_empty() {
        assert!(parse_ledger(None).is_empty());
        assert!(parse_ledger(Some("   ")).is_empty());
        assert!(parse_ledger(Some("[]")).is_empty());
    }

    #[test]
    fn malformed_json_parses_empty() {
        assert!(parse_ledger(Some("[\"a\",")).is_empty());
    }

    #[test]
    fn comma_separated_form_is_accepted() {
        let keys = parse_ledger(Some("x, y ,,z"));
        assert_eq!(
            keys.into_iter().collect::<Vec<_>>(),
            vec!["x".to_string(), "y".to_string(), "z".to_string()]
        );
    }

    #[test]
    fn ledger_of_reads_annotation() {
        let secret = SinkSecret::new("ns", "s").with_annotation(MANAGED_KEYS_ANNOTATION, r#"["k"]"#);
        assert!(ledger_of(&secret).contains("k"));
    }
}
