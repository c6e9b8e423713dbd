//! Deserialization of the vault export item shape

use pretty_assertions::assert_eq;
use rstest::rstest;
use vaultsync_model::{FieldType, Item, ItemType};

#[test]
fn login_item_deserializes_from_export_json() {
    let json = r#"{
        "id": "0b7c",
        "name": "Test Item",
        "type": "login",
        "login": { "username": "u", "password": "p" },
        "fields": [
            { "name": "namespaces", "value": "default", "type": "text" },
            { "name": "token", "value": "t0k", "type": "hidden" }
        ]
    }"#;

    let item: Item = serde_json::from_str(json).unwrap();

    assert_eq!(item.item_type, ItemType::Login);
    assert_eq!(item.username(), "u");
    assert_eq!(item.password(), "p");
    assert_eq!(item.fields.len(), 2);
    assert_eq!(item.fields[1].field_type, FieldType::Hidden);
}

#[test]
fn missing_optional_sections_default_to_empty() {
    let json = r#"{ "id": "1", "name": "note", "type": "secure-note" }"#;

    let item: Item = serde_json::from_str(json).unwrap();

    assert_eq!(item.notes(), "");
    assert_eq!(item.username(), "");
    assert!(item.fields.is_empty());
}

#[test]
fn field_type_defaults_to_text() {
    let json = r#"{ "id": "1", "name": "n", "type": "login",
        "fields": [ { "name": "a", "value": "b" } ] }"#;

    let item: Item = serde_json::from_str(json).unwrap();
    assert_eq!(item.fields[0].field_type, FieldType::Text);
}

#[test]
fn ssh_key_section_uses_camel_case() {
    let json = r#"{ "id": "1", "name": "deploy", "type": "ssh-key",
        "sshKey": { "privateKey": "PRIV", "publicKey": "PUB", "keyFingerprint": "SHA256:x" } }"#;

    let item: Item = serde_json::from_str(json).unwrap();
    let key = item.ssh_key.unwrap();
    assert_eq!(key.private_key.as_deref(), Some("PRIV"));
    assert_eq!(key.key_fingerprint.as_deref(), Some("SHA256:x"));
}

#[rstest]
#[case("username", Some("alice"))]
#[case("Password", Some("s3cret"))]
#[case("totp", None)]
fn linked_value_resolves_credentials(#[case] target: &str, #[case] expected: Option<&str>) {
    let item = Item::login("1", "svc", "alice", "s3cret");
    assert_eq!(item.linked_value(target), expected);
}
