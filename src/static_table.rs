//! HPACK static table, RFC 7541 Appendix A.
//!
//! 61 predefined header fields with fixed 1-based indices. Entries with
//! the same name are contiguous, which the name-value lookup exploits by
//! scanning forward from the first name match.

use hashbrown::HashMap;
use once_cell::sync::Lazy;

use crate::util::constant_time_eq;

/// Appendix A entries in index order (index 1 is the first element).
const STATIC_TABLE: [(&str, &str); 61] = [
    (":authority", ""),
    (":method", "GET"),
    (":method", "POST"),
    (":path", "/"),
    (":path", "/index.html"),
    (":scheme", "http"),
    (":scheme", "https"),
    (":status", "200"),
    (":status", "204"),
    (":status", "206"),
    (":status", "304"),
    (":status", "400"),
    (":status", "404"),
    (":status", "500"),
    ("accept-charset", ""),
    ("accept-encoding", "gzip, deflate"),
    ("accept-language", ""),
    ("accept-ranges", ""),
    ("accept", ""),
    ("access-control-allow-origin", ""),
    ("age", ""),
    ("allow", ""),
    ("authorization", ""),
    ("cache-control", ""),
    ("content-disposition", ""),
    ("content-encoding", ""),
    ("content-language", ""),
    ("content-length", ""),
    ("content-location", ""),
    ("content-range", ""),
    ("content-type", ""),
    ("cookie", ""),
    ("date", ""),
    ("etag", ""),
    ("expect", ""),
    ("expires", ""),
    ("from", ""),
    ("host", ""),
    ("if-match", ""),
    ("if-modified-since", ""),
    ("if-none-match", ""),
    ("if-range", ""),
    ("if-unmodified-since", ""),
    ("last-modified", ""),
    ("link", ""),
    ("location", ""),
    ("max-forwards", ""),
    ("proxy-authenticate", ""),
    ("proxy-authorization", ""),
    ("range", ""),
    ("referer", ""),
    ("refresh", ""),
    ("retry-after", ""),
    ("server", ""),
    ("set-cookie", ""),
    ("strict-transport-security", ""),
    ("transfer-encoding", ""),
    ("user-agent", ""),
    ("vary", ""),
    ("via", ""),
    ("www-authenticate", ""),
];

/// Number of entries in the static table.
pub const LENGTH: usize = STATIC_TABLE.len();

// Built in reverse so the smallest index for a repeated name wins.
static INDEX_BY_NAME: Lazy<HashMap<&'static [u8], usize>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(LENGTH);
    for index in (1..=LENGTH).rev() {
        map.insert(STATIC_TABLE[index - 1].0.as_bytes(), index);
    }
    map
});

/// Returns the entry at the given 1-based index.
pub fn get(index: usize) -> Option<(&'static [u8], &'static [u8])> {
    if index == 0 || index > LENGTH {
        return None;
    }
    let (name, value) = STATIC_TABLE[index - 1];
    Some((name.as_bytes(), value.as_bytes()))
}

/// Returns the smallest index whose name matches, if any.
pub fn index_of_name(name: &[u8]) -> Option<usize> {
    INDEX_BY_NAME.get(name).copied()
}

/// Returns the index of an exact name-value match, if any.
pub fn index_of(name: &[u8], value: &[u8]) -> Option<usize> {
    let mut index = index_of_name(name)?;
    // Entries for a given name are sequential.
    while index <= LENGTH {
        let (entry_name, entry_value) = STATIC_TABLE[index - 1];
        if !constant_time_eq(entry_name.as_bytes(), name) {
            break;
        }
        if constant_time_eq(entry_value.as_bytes(), value) {
            return Some(index);
        }
        index += 1;
    }
    None
}
