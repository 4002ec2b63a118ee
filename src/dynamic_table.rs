//! Dynamic table, RFC 7541 Section 4.
//!
//! A bounded FIFO of header fields with size accounting. Index 1 is the
//! newest entry, index `len()` the oldest. The size of the table is the
//! sum of entry sizes (each carrying the 32-octet overhead) and never
//! exceeds the capacity between operations.

use std::collections::VecDeque;

use crate::header_field::HeaderField;

/// The dynamic table. `VecDeque` supplies the ring buffer; eviction pops
/// from the front (oldest), insertion pushes to the back (newest).
#[derive(Debug)]
pub struct DynamicTable {
    entries: VecDeque<HeaderField>,
    size: usize,
    capacity: usize,
}

impl DynamicTable {
    /// Creates an empty table with the given capacity in bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            size: 0,
            capacity,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current size in bytes (sum of entry sizes).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Maximum allowed size in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the entry at the given 1-based index, newest first.
    pub fn get(&self, index: usize) -> Option<&HeaderField> {
        if index == 0 || index > self.entries.len() {
            return None;
        }
        self.entries.get(self.entries.len() - index)
    }

    /// Inserts a field as the newest entry, evicting the oldest entries
    /// until it fits. A field larger than the whole capacity clears the
    /// table and is not inserted (RFC 7541 Section 4.4).
    pub fn add(&mut self, entry: HeaderField) {
        let entry_size = entry.size();
        if entry_size > self.capacity {
            tracing::trace!(entry_size, capacity = self.capacity, "oversize entry clears dynamic table");
            self.clear();
            return;
        }
        while self.size + entry_size > self.capacity {
            self.remove();
        }
        self.size += entry_size;
        self.entries.push_back(entry);
    }

    /// Removes and returns the oldest entry.
    pub fn remove(&mut self) -> Option<HeaderField> {
        let entry = self.entries.pop_front()?;
        self.size -= entry.size();
        Some(entry)
    }

    /// Changes the capacity, evicting oldest entries until the current
    /// size fits.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.size > capacity {
            self.remove();
        }
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.size = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, value: &str) -> HeaderField {
        HeaderField::new(name.to_string(), value.to_string())
    }

    #[test]
    fn test_add_and_get_newest_first() {
        let mut table = DynamicTable::new(1024);
        table.add(field("a", "1"));
        table.add(field("b", "2"));

        assert_eq!(table.len(), 2);
        assert_eq!(&table.get(1).unwrap().name[..], b"b");
        assert_eq!(&table.get(2).unwrap().name[..], b"a");
        assert!(table.get(0).is_none());
        assert!(table.get(3).is_none());
    }

    #[test]
    fn test_size_accounting() {
        let mut table = DynamicTable::new(1024);
        table.add(field(":authority", "twitter.com"));
        assert_eq!(table.size(), 10 + 11 + 32);
        table.remove();
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn test_eviction_is_fifo() {
        // Each entry is 34 bytes; capacity fits two.
        let mut table = DynamicTable::new(68);
        table.add(field("a", "1"));
        table.add(field("b", "2"));
        table.add(field("c", "3"));

        assert_eq!(table.len(), 2);
        assert_eq!(&table.get(1).unwrap().name[..], b"c");
        assert_eq!(&table.get(2).unwrap().name[..], b"b");
        assert!(table.size() <= table.capacity());
    }

    #[test]
    fn test_oversize_entry_clears() {
        let mut table = DynamicTable::new(64);
        table.add(field("a", "1"));
        assert_eq!(table.len(), 1);

        // 30 + 30 + 32 > 64: table is cleared, nothing inserted.
        table.add(field(&"n".repeat(30), &"v".repeat(30)));
        assert_eq!(table.len(), 0);
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn test_set_capacity_evicts_oldest() {
        let mut table = DynamicTable::new(1024);
        table.add(field("a", "1"));
        table.add(field("b", "2"));

        table.set_capacity(40);
        assert_eq!(table.len(), 1);
        assert_eq!(&table.get(1).unwrap().name[..], b"b");

        table.set_capacity(0);
        assert!(table.is_empty());
        assert_eq!(table.size(), 0);
    }
}
