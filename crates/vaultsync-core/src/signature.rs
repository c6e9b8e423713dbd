//! Content signature used to detect no-op writes
//!
//! The signature is a SHA-256 over a canonical, length-prefixed encoding of
//! the synced document plus the item-supplied annotations and labels. Maps are
//! ordered, so the result never depends on insertion order. System-owned
//! annotations are excluded, so writing the ledger or signature does not change
//! the signature.

use std::collections::BTreeMap;
use std::fmt::Write;

use vaultsync_fs::compute_content_checksum;
use vaultsync_model::names::{SIGNATURE_ANNOTATION, SYSTEM_ANNOTATIONS};
use vaultsync_model::{SecretDocument, SinkSecret};

fn encode_section<'a>(
    out: &mut String,
    section: &str,
    entries: impl Iterator<Item = (&'a String, &'a String)>,
) {
    out.push_str(section);
    out.push('\n');
    for (key, value) in entries {
        // Length prefixes keep "a=b" + "c" distinct from "a" + "b=c"
        let _ = writeln!(out, "{}:{}={}:{}", key.len(), key, value.len(), value);
    }
}

/// Compute the signature of a candidate write.
pub fn compute_signature(
    document: &SecretDocument,
    annotations: &BTreeMap<String, String>,
    labels: &BTreeMap<String, String>,
) -> String {
    let mut canonical = String::new();
    encode_section(&mut canonical, "data", document.iter());
    encode_section(
        &mut canonical,
        "annotations",
        annotations
            .iter()
            .filter(|(k, _)| !SYSTEM_ANNOTATIONS.contains(&k.as_str())),
    );
    encode_section(&mut canonical, "labels", labels.iter());
    compute_content_checksum(&canonical)
}

/// Signature stored on an existing sink object, if any
pub fn stored_signature(secret: &SinkSecret) -> Option<&str> {
    secret
        .annotation(SIGNATURE_ANNOTATION)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
