//! HPACK encoder, RFC 7541 Section 6.
//!
//! Chooses a representation per header field: indexed where the field is
//! already in a table, literal with incremental indexing where caching
//! will pay off, literal without indexing where the field cannot or
//! should not enter the table, and never-indexed for sensitive fields.
//! Each representation is written eagerly to the caller's buffer.

use bytes::{BufMut, Bytes, BytesMut};
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::dynamic_table::DynamicTable;
use crate::header_field::HeaderField;
use crate::huffman;
use crate::integer;
use crate::static_table;
use crate::util::{constant_time_eq, hash_bytes, IndexType};

/// HPACK encoder state: the dynamic table plus a content index that maps
/// a name hash to the absolute insertion indices of live entries. The
/// index mirrors the table exactly; eviction and clearing keep both in
/// step.
pub struct Encoder {
    table: DynamicTable,
    index: HashMap<u64, SmallVec<[u64; 4]>>,
    /// Absolute index the next insertion will receive. The entry at
    /// absolute index `a` currently sits at relative index
    /// `insert_count - a` (1-based, newest first).
    insert_count: u64,
    use_indexing: bool,
    force_huffman_on: bool,
    force_huffman_off: bool,
}

impl Encoder {
    /// Creates a new encoder with the given maximum dynamic table size.
    pub fn new(max_header_table_size: usize) -> Self {
        Self::with_options(max_header_table_size, true, false, false)
    }

    /// Constructor exposing the indexing and Huffman switches, intended
    /// for tests that need deterministic wire output.
    pub fn with_options(
        max_header_table_size: usize,
        use_indexing: bool,
        force_huffman_on: bool,
        force_huffman_off: bool,
    ) -> Self {
        Self {
            table: DynamicTable::new(max_header_table_size),
            index: HashMap::new(),
            insert_count: 0,
            use_indexing,
            force_huffman_on,
            force_huffman_off,
        }
    }

    /// Encodes one header field into `dst`.
    ///
    /// `sensitive` requests the never-indexed representation, which keeps
    /// the field out of both endpoints' dynamic tables.
    pub fn encode_header(&mut self, dst: &mut BytesMut, name: &[u8], value: &[u8], sensitive: bool) {
        if sensitive {
            let name_index = self.name_index(name);
            self.encode_literal(dst, name, value, IndexType::Never, name_index);
            return;
        }

        // With a zero-capacity table only the static table can help.
        if self.table.capacity() == 0 {
            match static_table::index_of(name, value) {
                Some(index) => integer::encode(dst, 0x80, 7, index as u32),
                None => {
                    let name_index = static_table::index_of_name(name);
                    self.encode_literal(dst, name, value, IndexType::None, name_index);
                }
            }
            return;
        }

        let header_size = HeaderField::size_of(name, value);

        // A field larger than the table itself can never be indexed.
        if header_size > self.table.capacity() {
            let name_index = self.name_index(name);
            self.encode_literal(dst, name, value, IndexType::None, name_index);
            return;
        }

        if let Some(relative) = self.find_exact(name, value) {
            // Section 6.1. Indexed Header Field Representation
            integer::encode(dst, 0x80, 7, (relative + static_table::LENGTH) as u32);
        } else if let Some(index) = static_table::index_of(name, value) {
            integer::encode(dst, 0x80, 7, index as u32);
        } else {
            let name_index = self.name_index(name);
            if self.use_indexing {
                self.ensure_capacity(header_size);
            }
            let index_type = if self.use_indexing {
                IndexType::Incremental
            } else {
                IndexType::None
            };
            self.encode_literal(dst, name, value, index_type, name_index);
            if self.use_indexing {
                self.add(name, value);
            }
        }
    }

    /// Changes the maximum dynamic table size, evicting to fit and
    /// emitting a dynamic table size update so the peer decoder follows.
    /// A no-op when the size is unchanged.
    pub fn set_max_header_table_size(&mut self, dst: &mut BytesMut, max_header_table_size: usize) {
        if self.table.capacity() == max_header_table_size {
            return;
        }
        tracing::trace!(
            from = self.table.capacity(),
            to = max_header_table_size,
            "encoder dynamic table size change"
        );
        while self.table.size() > max_header_table_size {
            self.evict();
        }
        self.table.set_capacity(max_header_table_size);
        integer::encode(dst, 0x20, 5, max_header_table_size as u32);
    }

    /// Current maximum dynamic table size.
    pub fn max_header_table_size(&self) -> usize {
        self.table.capacity()
    }

    /// Dynamic table, exposed for inspection in tests.
    pub fn table(&self) -> &DynamicTable {
        &self.table
    }

    /// Encodes a literal representation, Section 6.2. A `None` name
    /// index writes the name inline as a string literal.
    fn encode_literal(
        &mut self,
        dst: &mut BytesMut,
        name: &[u8],
        value: &[u8],
        index_type: IndexType,
        name_index: Option<usize>,
    ) {
        let (mask, prefix_bits) = match index_type {
            IndexType::Incremental => (0x40, 6),
            IndexType::None => (0x00, 4),
            IndexType::Never => (0x10, 4),
        };
        integer::encode(dst, mask, prefix_bits, name_index.unwrap_or(0) as u32);
        if name_index.is_none() {
            self.encode_string_literal(dst, name);
        }
        self.encode_string_literal(dst, value);
    }

    /// Encodes a string literal, Section 5.2, picking Huffman when it is
    /// shorter than the raw octets.
    fn encode_string_literal(&mut self, dst: &mut BytesMut, string: &[u8]) {
        let huffman_len = huffman::encoded_len(string);
        if self.force_huffman_on || (huffman_len < string.len() && !self.force_huffman_off) {
            integer::encode(dst, 0x80, 7, huffman_len as u32);
            huffman::encode(dst, string);
        } else {
            integer::encode(dst, 0x00, 7, string.len() as u32);
            dst.put_slice(string);
        }
    }

    /// Combined-space name index: static table first, then the dynamic
    /// table offset past it.
    fn name_index(&self, name: &[u8]) -> Option<usize> {
        static_table::index_of_name(name)
            .or_else(|| self.find_name(name).map(|rel| rel + static_table::LENGTH))
    }

    /// Relative index of the newest dynamic entry matching name and
    /// value exactly.
    fn find_exact(&self, name: &[u8], value: &[u8]) -> Option<usize> {
        let chain = self.index.get(&hash_bytes(name))?;
        for &absolute in chain.iter().rev() {
            let relative = (self.insert_count - absolute) as usize;
            if let Some(entry) = self.table.get(relative) {
                if constant_time_eq(&entry.name, name) && constant_time_eq(&entry.value, value) {
                    return Some(relative);
                }
            }
        }
        None
    }

    /// Relative index of the newest dynamic entry whose name matches.
    fn find_name(&self, name: &[u8]) -> Option<usize> {
        let chain = self.index.get(&hash_bytes(name))?;
        for &absolute in chain.iter().rev() {
            let relative = (self.insert_count - absolute) as usize;
            if let Some(entry) = self.table.get(relative) {
                if constant_time_eq(&entry.name, name) {
                    return Some(relative);
                }
            }
        }
        None
    }

    /// Evicts oldest entries until `header_size` more bytes fit.
    fn ensure_capacity(&mut self, header_size: usize) {
        while self.table.size() + header_size > self.table.capacity() {
            if self.table.is_empty() {
                break;
            }
            self.evict();
        }
    }

    /// Removes the oldest entry and drops it from the content index.
    fn evict(&mut self) {
        let oldest = self.insert_count - self.table.len() as u64;
        if let Some(entry) = self.table.remove() {
            let hash = hash_bytes(&entry.name);
            if let Some(chain) = self.index.get_mut(&hash) {
                chain.retain(|absolute| *absolute != oldest);
                if chain.is_empty() {
                    self.index.remove(&hash);
                }
            }
        }
    }

    /// Inserts a field as the newest dynamic entry. The octets are
    /// copied so later caller mutations cannot reach the table.
    fn add(&mut self, name: &[u8], value: &[u8]) {
        let header_size = HeaderField::size_of(name, value);
        if header_size > self.table.capacity() {
            self.table.clear();
            self.index.clear();
            return;
        }
        self.ensure_capacity(header_size);

        let entry = HeaderField::new(Bytes::copy_from_slice(name), Bytes::copy_from_slice(value));
        let hash = hash_bytes(&entry.name);
        self.table.add(entry);
        let absolute = self.insert_count;
        self.insert_count += 1;
        self.index.entry(hash).or_default().push(absolute);
    }
}
