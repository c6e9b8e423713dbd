//! Parsing of `secret-annotation` / `secret-label` field values
//!
//! Each field value holds one entry per line in either `key=value` or
//! `key: value` form. The earliest `=` or `:` on a line is the delimiter, so
//! values may contain either character (URLs, for example). Blank lines and
//! lines starting with `#` are ignored.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static ENTRY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^=:]*?)\s*[=:]\s*(.*?)\s*$").unwrap());

/// Parse one metadata block, merging into `into`. Later lines win.
pub fn parse_metadata_into(text: &str, into: &mut BTreeMap<String, String>) {
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(captures) = ENTRY_PATTERN.captures(trimmed) else {
            tracing::debug!("Ignoring metadata line without delimiter: {:?}", trimmed);
            continue;
        };
        let key = captures.get(1).map_or("", |m| m.as_str());
        if key.is_empty() {
            continue;
        }
        let value = captures.get(2).map_or("", |m| m.as_str());
        into.insert(key.to_string(), value.to_string());
    }
}

/// Parse one metadata block into a fresh map
pub fn parse_metadata(text: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    parse_metadata_into(text, &mut map);
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_both_syntaxes() {
        let map = parse_metadata("team=payments\nowner: alice");
        assert_eq!(map.get("team").map(String::as_str), Some("payments"));
        assert_eq!(map.get("owner").map(String::as_str), Some("alice"));
    }

    #[test]
    fn skips_comments_blank_lines_and_undelimited_lines() {
        let map = parse_metadata("# comment\n\n   \nno delimiter here\nk=v\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map["k"], "v");
    }

    #[test]
    fn earliest_delimiter_splits_so_values_keep_colons() {
        let map = parse_metadata("docs=https://example.com/a?b=c\nlink: http://x");
        assert_eq!(map["docs"], "https://example.com/a?b=c");
        assert_eq!(map["link"], "http://x");
    }

    #[test]
    fn later_lines_overwrite_earlier() {
        let map = parse_metadata("k=1\nk: 2");
        assert_eq!(map["k"], "2");
    }

    #[test]
    fn empty_keys_are_ignored_and_empty_values_kept() {
        let map = parse_metadata("=orphan\nflag=");
        assert_eq!(map.len(), 1);
        assert_eq!(map["flag"], "");
    }

    #[test]
    fn handles_crlf_line_endings() {
        let map = parse_metadata("a=1\r\nb: 2\r\n");
        assert_eq!(map["a"], "1");
        assert_eq!(map["b"], "2");
    }
}
