//! Shared helpers for table lookups.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Indexing disposition of a literal header field representation,
/// RFC 7541 Section 6.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexType {
    /// Literal without indexing.
    None,
    /// Literal with incremental indexing: the field enters the dynamic
    /// table on both sides.
    Incremental,
    /// Literal never indexed: intermediaries must forward it verbatim.
    Never,
}

/// Compares two octet strings in constant time for length-equal inputs.
///
/// Header values can carry credentials; a short-circuiting comparison in
/// the encoder's table lookups would leak how many leading octets of a
/// probe match a stored value.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Hash of a header name, used to key the encoder's content index.
pub(crate) fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"cookie", b"cookie"));
        assert!(!constant_time_eq(b"cookie", b"cookif"));
        assert!(!constant_time_eq(b"cookie", b"cooki"));
    }

    #[test]
    fn test_hash_is_stable_per_content() {
        assert_eq!(hash_bytes(b":method"), hash_bytes(b":method"));
        assert_ne!(hash_bytes(b":method"), hash_bytes(b":path"));
    }
}
