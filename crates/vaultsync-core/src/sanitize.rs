//! Text to object-name and text to data-key transforms
//!
//! Object names and data keys obey different cluster rules, so there are two
//! independent rule sets:
//!
//! | transform | allowed | case | separator |
//! |---|---|---|---|
//! | [`sanitize_name`] | `a-z 0-9 - .` | lowered | `-` |
//! | [`sanitize_key`] | `A-Z a-z 0-9 - _ .` | preserved | `_` |
//!
//! Both transforms are idempotent on their own output.

use crate::{Error, Result};

/// Separator substituted for disallowed runs in object names
pub const NAME_SEPARATOR: char = '-';

/// Separator substituted for disallowed runs in data keys
pub const KEY_SEPARATOR: char = '_';

/// Maximum length of an object name or data key
pub const MAX_LENGTH: usize = 253;

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.'
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn require_text<'a>(text: Option<&'a str>, what: &str) -> Result<&'a str> {
    match text {
        None => Err(Error::invalid_argument(format!("{what} must not be null"))),
        Some(t) if t.trim().is_empty() => Err(Error::invalid_argument(format!(
            "{what} must not be empty or whitespace"
        ))),
        Some(t) => Ok(t),
    }
}

fn truncate(mut value: String) -> String {
    // Output is pure ASCII, so byte length equals char length
    if value.len() > MAX_LENGTH {
        value.truncate(MAX_LENGTH);
    }
    value
}

/// Convert arbitrary text into a valid object name.
///
/// Lower-cases the input, collapses every run of disallowed characters (and
/// any `-` adjacent to them) into one `-`, and strips leading and trailing
/// separators and dots.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] when the input is `None`, empty, or
/// whitespace, or when nothing remains after stripping (e.g. `"---"`).
///
/// # Example
///
/// ```
/// use vaultsync_core::sanitize::sanitize_name;
///
/// assert_eq!(sanitize_name("Test Item").unwrap(), "test-item");
/// assert!(sanitize_name("---").is_err());
/// ```
pub fn sanitize_name<'a>(text: impl Into<Option<&'a str>>) -> Result<String> {
    let text = require_text(text.into(), "name")?;

    let mut out = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if !is_name_char(c) {
            pending_separator = true;
            continue;
        }
        if pending_separator && !out.is_empty() {
            out.push(NAME_SEPARATOR);
        }
        pending_separator = false;
        if c == '.' && out.ends_with('.') {
            continue;
        }
        out.push(c);
    }

    let stripped = out.trim_matches(|c| c == NAME_SEPARATOR || c == '.');
    let name = truncate(stripped.to_string());
    let name = name
        .trim_end_matches(|c| c == NAME_SEPARATOR || c == '.')
        .to_string();

    if name.is_empty() {
        return Err(Error::invalid_argument(format!(
            "name {text:?} contains no usable characters"
        )));
    }
    Ok(name)
}

/// Convert arbitrary text into a valid data key.
///
/// Preserves case and every allowed character; each run of disallowed
/// characters becomes a single `_`. Surrounding whitespace is trimmed first.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] when the input is `None`, empty, or
/// whitespace, or when none of its characters are allowed in a key.
///
/// # Example
///
/// ```
/// use vaultsync_core::sanitize::sanitize_key;
///
/// assert_eq!(sanitize_key("API Key").unwrap(), "API_Key");
/// assert_eq!(sanitize_key("db.password").unwrap(), "db.password");
/// ```
pub fn sanitize_key<'a>(text: impl Into<Option<&'a str>>) -> Result<String> {
    let text = require_text(text.into(), "key")?.trim();

    let mut out = String::with_capacity(text.len());
    let mut kept_any = false;
    let mut in_run = false;

    for c in text.chars() {
        if is_key_char(c) {
            out.push(c);
            kept_any = true;
            in_run = false;
        } else if !in_run {
            out.push(KEY_SEPARATOR);
            in_run = true;
        }
    }

    if !kept_any {
        return Err(Error::invalid_argument(format!(
            "key {text:?} contains no usable characters"
        )));
    }

    let key = truncate(out);
    if key == "." || key == ".." {
        return Err(Error::invalid_argument(format!("key {key:?} is reserved")));
    }
    Ok(key)
}

/// Key holding a login's username, derived from the secret name
pub fn username_key(secret_name: &str) -> String {
    format!("{secret_name}{KEY_SEPARATOR}username")
}

/// Key holding an ssh-key item's public key, derived from the secret name
pub fn public_key_key(secret_name: &str) -> String {
    format!("{secret_name}{KEY_SEPARATOR}public_key")
}

/// Key holding an ssh-key item's fingerprint, derived from the secret name
pub fn fingerprint_key(secret_name: &str) -> String {
    format!("{secret_name}{KEY_SEPARATOR}fingerprint")
}
