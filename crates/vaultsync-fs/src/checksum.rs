//! Canonical `sha256:<hex>` checksums for content signatures

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Checksum of `content` in the form `sha256:<lowercase hex>`.
pub fn compute_content_checksum(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("{}{:x}", PREFIX, digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_hashes_to_the_sha256_of_nothing() {
        assert_eq!(
            compute_content_checksum(""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn checksum_is_prefixed_lowercase_hex() {
        let checksum = compute_content_checksum("data\n4:user=5:alice\n");
        let hex = checksum.strip_prefix("sha256:").unwrap();
        assert_eq!(hex.len(), 64);
        assert!(hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn one_byte_change_changes_the_checksum() {
        assert_ne!(
            compute_content_checksum("4:user=5:alice"),
            compute_content_checksum("4:user=5:alicf")
        );
    }
}
