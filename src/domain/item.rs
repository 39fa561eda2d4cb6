use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// A candidate link pulled off a list page. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub title: String,
    pub url: String,
}

/// A posting that has passed the dedup gate. One row per item hash and
/// per URL; created once and never updated.
#[derive(Debug, Clone)]
pub struct SeenItem {
    pub site_url: String,
    pub item_hash: String,
    pub title: String,
    pub url: String,
    pub first_seen: DateTime<Utc>,
}

/// Hex SHA-256 of a string. Used for the item dedup identity (hash of
/// the canonical URL) and for the bot credential fingerprint.
pub fn text_hash(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let a = text_hash("https://example.com/post/1");
        let b = text_hash("https://example.com/post/1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_distinct_inputs() {
        let a = text_hash("https://example.com/post/1");
        let b = text_hash("https://example.com/post/2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let h = text_hash("anything");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
