//! Builders for vault items used across test suites.

use vaultsync_model::Item;

/// A login item without target namespaces
pub fn login(id: &str, name: &str, username: &str, password: &str) -> Item {
    Item::login(id, name, username, password)
}

/// A login item targeting `namespaces` (comma-separated)
pub fn tagged_login(id: &str, name: &str, username: &str, password: &str, namespaces: &str) -> Item {
    Item::login(id, name, username, password).with_text_field("namespaces", namespaces)
}

/// A secure note targeting `namespaces` under an explicit secret name
pub fn note(id: &str, secret_name: &str, namespaces: &str) -> Item {
    Item::secure_note(id, secret_name, "")
        .with_text_field("namespaces", namespaces)
        .with_text_field("secret-name", secret_name)
}
