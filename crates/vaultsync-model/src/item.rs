//! Vault item types
//!
//! Items are deserialized from the vault's JSON export shape. Only the parts
//! of an item relevant to secret projection are modelled.

use serde::{Deserialize, Serialize};

/// Kind of vault record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemType {
    Login,
    SecureNote,
    SshKey,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Login => "login",
            Self::SecureNote => "secure-note",
            Self::SshKey => "ssh-key",
        };
        f.write_str(s)
    }
}

/// Username/password pair of a login item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Key material of an ssh-key item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_fingerprint: Option<String>,
}

/// How a custom field's value is stored in the vault
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Hidden,
    Boolean,
    /// Value is taken from the item credential named by the field value
    Linked,
}

/// A user-defined name/value pair on an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
}

impl CustomField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            field_type: FieldType::Text,
        }
    }

    pub fn hidden(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            field_type: FieldType::Hidden,
        }
    }

    /// A field whose value mirrors the item's `username` or `password`
    pub fn linked(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(target.into()),
            field_type: FieldType::Linked,
        }
    }

    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

/// A vault record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<LoginCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<SshKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Custom fields in vault order
    #[serde(default)]
    pub fields: Vec<CustomField>,
}

impl Item {
    /// Create a login item
    pub fn login(
        id: impl Into<String>,
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            item_type: ItemType::Login,
            login: Some(LoginCredentials {
                username: Some(username.into()),
                password: Some(password.into()),
            }),
            ssh_key: None,
            notes: None,
            fields: Vec::new(),
        }
    }

    /// Create a secure-note item
    pub fn secure_note(id: impl Into<String>, name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            item_type: ItemType::SecureNote,
            login: None,
            ssh_key: None,
            notes: Some(notes.into()),
            fields: Vec::new(),
        }
    }

    /// Create an ssh-key item
    pub fn ssh_key(id: impl Into<String>, name: impl Into<String>, key: SshKey) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            item_type: ItemType::SshKey,
            login: None,
            ssh_key: Some(key),
            notes: None,
            fields: Vec::new(),
        }
    }

    /// Append a custom field
    pub fn with_field(mut self, field: CustomField) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a plain text custom field
    pub fn with_text_field(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_field(CustomField::text(name, value))
    }

    pub fn username(&self) -> &str {
        self.login
            .as_ref()
            .and_then(|l| l.username.as_deref())
            .unwrap_or("")
    }

    pub fn password(&self) -> &str {
        self.login
            .as_ref()
            .and_then(|l| l.password.as_deref())
            .unwrap_or("")
    }

    pub fn notes(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }

    /// Resolve what a linked field points at
    pub fn linked_value(&self, target: &str) -> Option<&str> {
        match target.trim().to_ascii_lowercase().as_str() {
            "username" => self.login.as_ref().and_then(|l| l.username.as_deref()),
            "password" => self.login.as_ref().and_then(|l| l.password.as_deref()),
            _ => None,
        }
    }
}
