//! Header field representation.
//!
//! A name-value pair of opaque octet strings. Names are conventionally
//! lowercase ASCII but the codec never inspects them beyond equality.

use bytes::Bytes;
use std::fmt;

/// Fixed per-entry accounting surcharge for dynamic table sizing,
/// RFC 7541 Section 4.1.
pub const HEADER_ENTRY_OVERHEAD: usize = 32;

/// An HTTP header field (name-value pair).
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: Bytes,
    pub value: Bytes,
}

impl HeaderField {
    /// Creates a new header field.
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the size of this field for dynamic table accounting:
    /// `name_len + value_len + 32`.
    pub fn size(&self) -> usize {
        Self::size_of(&self.name, &self.value)
    }

    /// Accounting size of a field that has not been constructed yet.
    pub fn size_of(name: &[u8], value: &[u8]) -> usize {
        name.len() + value.len() + HEADER_ENTRY_OVERHEAD
    }
}

impl fmt::Debug for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HeaderField({:?}: {:?})",
            String::from_utf8_lossy(&self.name),
            String::from_utf8_lossy(&self.value)
        )
    }
}
