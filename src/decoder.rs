//! HPACK decoder, RFC 7541 Section 3.
//!
//! A streaming state machine over a header block. The caller feeds
//! whatever bytes are available through [`Decoder::decode`]; every byte
//! is consumed, and partially read integers and string fragments are
//! held inside the decoder so the block can be resumed at any byte
//! boundary. Decoded fields are pushed through a [`HeaderSink`] in wire
//! order. When the whole block has been fed, [`Decoder::end_header_block`]
//! reports whether the block was truncated against the aggregate size
//! limit and resets per-block state.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::dynamic_table::DynamicTable;
use crate::error::{HpackError, Result};
use crate::header_field::{HeaderField, HEADER_ENTRY_OVERHEAD};
use crate::huffman;
use crate::integer::IntegerDecoder;
use crate::static_table;
use crate::util::IndexType;

/// Listener receiving decoded header fields.
///
/// `sensitive` is true for fields carried in the never-indexed
/// representation. Emission order is exactly the wire order of the
/// block, and a sink may see the same logical header again when a block
/// repeats it.
pub trait HeaderSink {
    fn add_header(&mut self, name: &[u8], value: &[u8], sensitive: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ReadHeaderRepresentation,
    ReadMaxDynamicTableSize,
    ReadIndexedHeader,
    ReadIndexedHeaderName,
    ReadLiteralHeaderNameLengthPrefix,
    ReadLiteralHeaderNameLength,
    ReadLiteralHeaderName,
    SkipLiteralHeaderName,
    ReadLiteralHeaderValueLengthPrefix,
    ReadLiteralHeaderValueLength,
    ReadLiteralHeaderValue,
    SkipLiteralHeaderValue,
}

/// HPACK decoder state.
pub struct Decoder {
    dynamic_table: DynamicTable,
    /// Aggregate limit on emitted name + value octets per block.
    max_header_size: usize,
    /// Largest dynamic table size the peer's encoder may use, as
    /// advertised by this endpoint's settings.
    max_dynamic_table_size: usize,
    /// Set when a local reduction must be confirmed by a size update at
    /// the start of the peer's next header block.
    max_dynamic_table_size_change_required: bool,

    state: State,
    index_type: IndexType,
    integer: IntegerDecoder,
    huffman_encoded: bool,
    /// Emitted octets so far this block; sticks at `max_header_size + 1`
    /// once the limit is crossed so truncation is reported at block end.
    header_size: u64,
    /// True once a header field representation has been seen in the
    /// current block; size updates are only legal before that.
    header_field_seen: bool,

    name: Option<Bytes>,
    name_length: usize,
    value_length: usize,
    skip_length: usize,
    pending: BytesMut,
}

impl Decoder {
    /// Creates a decoder.
    ///
    /// `max_header_size` caps the aggregate decoded size of one block
    /// (resource-exhaustion guard, reported as truncation rather than an
    /// error); `max_header_table_size` is the dynamic table limit this
    /// endpoint advertises.
    pub fn new(max_header_size: usize, max_header_table_size: usize) -> Self {
        Self {
            dynamic_table: DynamicTable::new(max_header_table_size),
            max_header_size,
            max_dynamic_table_size: max_header_table_size,
            max_dynamic_table_size_change_required: false,
            state: State::ReadHeaderRepresentation,
            index_type: IndexType::None,
            integer: IntegerDecoder::new(),
            huffman_encoded: false,
            header_size: 0,
            header_field_seen: false,
            name: None,
            name_length: 0,
            value_length: 0,
            skip_length: 0,
            pending: BytesMut::new(),
        }
    }

    /// Consumes all of `src`, emitting completed header fields through
    /// `sink`. Returns after the source is exhausted; the block position
    /// is kept so the next call resumes where this one stopped.
    pub fn decode<B: Buf, S: HeaderSink>(&mut self, src: &mut B, sink: &mut S) -> Result<()> {
        while src.has_remaining() {
            match self.state {
                State::ReadHeaderRepresentation => {
                    let byte = src.get_u8();
                    if self.max_dynamic_table_size_change_required && byte & 0xE0 != 0x20 {
                        // The peer must lead with a size update confirming
                        // our reduction before any header field.
                        return Err(HpackError::MaxDynamicTableSizeChangeRequired);
                    }
                    if byte & 0x80 != 0 {
                        // Section 6.1. Indexed Header Field
                        self.header_field_seen = true;
                        let index = (byte & 0x7F) as u32;
                        if index == 0 {
                            return Err(HpackError::IllegalIndexValue);
                        } else if index == 0x7F {
                            self.integer.begin(0x7F);
                            self.state = State::ReadIndexedHeader;
                        } else {
                            self.index_header(index as usize, sink)?;
                        }
                    } else if byte & 0x40 == 0x40 {
                        // Section 6.2.1. Literal with Incremental Indexing
                        self.header_field_seen = true;
                        self.index_type = IndexType::Incremental;
                        self.start_literal(byte & 0x3F, 0x3F)?;
                    } else if byte & 0x20 == 0x20 {
                        // Section 6.3. Dynamic Table Size Update
                        if self.header_field_seen {
                            return Err(HpackError::IllegalEncodingContextUpdate);
                        }
                        let size = (byte & 0x1F) as u32;
                        if size == 0x1F {
                            self.integer.begin(0x1F);
                            self.state = State::ReadMaxDynamicTableSize;
                        } else {
                            self.set_dynamic_table_size(size)?;
                        }
                    } else {
                        // Section 6.2.2 / 6.2.3. Literal without Indexing
                        // or Never Indexed
                        self.header_field_seen = true;
                        self.index_type = if byte & 0x10 == 0x10 {
                            IndexType::Never
                        } else {
                            IndexType::None
                        };
                        self.start_literal(byte & 0x0F, 0x0F)?;
                    }
                }

                State::ReadMaxDynamicTableSize => {
                    if let Some(size) = self.integer.push(src.get_u8())? {
                        self.set_dynamic_table_size(size)?;
                        self.state = State::ReadHeaderRepresentation;
                    }
                }

                State::ReadIndexedHeader => {
                    if let Some(index) = self.integer.push(src.get_u8())? {
                        self.index_header(index as usize, sink)?;
                        self.state = State::ReadHeaderRepresentation;
                    }
                }

                State::ReadIndexedHeaderName => {
                    if let Some(index) = self.integer.push(src.get_u8())? {
                        self.read_name(index as usize)?;
                        self.state = State::ReadLiteralHeaderValueLengthPrefix;
                    }
                }

                State::ReadLiteralHeaderNameLengthPrefix => {
                    let byte = src.get_u8();
                    self.huffman_encoded = byte & 0x80 == 0x80;
                    let length = (byte & 0x7F) as u32;
                    if length == 0x7F {
                        self.integer.begin(0x7F);
                        self.state = State::ReadLiteralHeaderNameLength;
                    } else {
                        self.begin_name(length as usize)?;
                    }
                }

                State::ReadLiteralHeaderNameLength => {
                    if let Some(length) = self.integer.push(src.get_u8())? {
                        self.begin_name(length as usize)?;
                    }
                }

                State::ReadLiteralHeaderName => {
                    let want = self.name_length - self.pending.len();
                    let take = want.min(src.remaining());
                    self.pending.put((&mut *src).take(take));
                    if self.pending.len() == self.name_length {
                        let raw = self.pending.split().freeze();
                        let name = if self.huffman_encoded {
                            Bytes::from(huffman::decode(&raw)?)
                        } else {
                            raw
                        };
                        self.name_length = name.len();
                        self.name = Some(name);
                        self.state = State::ReadLiteralHeaderValueLengthPrefix;
                    }
                }

                State::SkipLiteralHeaderName => {
                    let take = self.skip_length.min(src.remaining());
                    src.advance(take);
                    self.skip_length -= take;
                    if self.skip_length == 0 {
                        self.state = State::ReadLiteralHeaderValueLengthPrefix;
                    }
                }

                State::ReadLiteralHeaderValueLengthPrefix => {
                    let byte = src.get_u8();
                    self.huffman_encoded = byte & 0x80 == 0x80;
                    let length = (byte & 0x7F) as u32;
                    if length == 0x7F {
                        self.integer.begin(0x7F);
                        self.state = State::ReadLiteralHeaderValueLength;
                    } else {
                        self.begin_value(length as usize, sink)?;
                    }
                }

                State::ReadLiteralHeaderValueLength => {
                    if let Some(length) = self.integer.push(src.get_u8())? {
                        self.begin_value(length as usize, sink)?;
                    }
                }

                State::ReadLiteralHeaderValue => {
                    let want = self.value_length - self.pending.len();
                    let take = want.min(src.remaining());
                    self.pending.put((&mut *src).take(take));
                    if self.pending.len() == self.value_length {
                        let raw = self.pending.split().freeze();
                        let value = if self.huffman_encoded {
                            Bytes::from(huffman::decode(&raw)?)
                        } else {
                            raw
                        };
                        self.value_length = value.len();
                        self.insert_header(sink, value);
                        self.state = State::ReadHeaderRepresentation;
                    }
                }

                State::SkipLiteralHeaderValue => {
                    let take = self.skip_length.min(src.remaining());
                    src.advance(take);
                    self.skip_length -= take;
                    if self.skip_length == 0 {
                        self.state = State::ReadHeaderRepresentation;
                    }
                }
            }
        }
        Ok(())
    }

    /// Ends the current header block. Returns true if the aggregate
    /// decoded size exceeded `max_header_size` (emission was suppressed
    /// past that point; the dynamic table stayed in sync). Resets all
    /// per-block state; the dynamic table is untouched.
    pub fn end_header_block(&mut self) -> bool {
        let truncated = self.header_size > self.max_header_size as u64;
        self.header_size = 0;
        self.state = State::ReadHeaderRepresentation;
        self.index_type = IndexType::None;
        self.header_field_seen = false;
        self.name = None;
        self.pending.clear();
        truncated
    }

    /// Updates the local limit on the peer encoder's dynamic table size.
    /// A reduction shrinks the table immediately and requires the peer's
    /// next block to lead with a confirming size update.
    pub fn set_max_header_table_size(&mut self, max_header_table_size: usize) {
        self.max_dynamic_table_size = max_header_table_size;
        if max_header_table_size < self.dynamic_table.capacity() {
            self.max_dynamic_table_size_change_required = true;
            self.dynamic_table.set_capacity(max_header_table_size);
        }
    }

    /// Current local limit on the dynamic table size.
    pub fn max_header_table_size(&self) -> usize {
        self.max_dynamic_table_size
    }

    /// Dynamic table, exposed for inspection in tests.
    pub fn table(&self) -> &DynamicTable {
        &self.dynamic_table
    }

    /// Applies a dynamic table size update from the wire.
    fn set_dynamic_table_size(&mut self, size: u32) -> Result<()> {
        let size = size as usize;
        if size > self.max_dynamic_table_size {
            return Err(HpackError::InvalidMaxDynamicTableSize);
        }
        tracing::trace!(size, "dynamic table size update");
        self.max_dynamic_table_size_change_required = false;
        self.dynamic_table.set_capacity(size);
        Ok(())
    }

    /// Classifies the name-index prefix shared by all literal forms.
    fn start_literal(&mut self, prefix: u8, max_prefix: u8) -> Result<()> {
        if prefix == 0 {
            self.state = State::ReadLiteralHeaderNameLengthPrefix;
        } else if prefix == max_prefix {
            self.integer.begin(max_prefix as u32);
            self.state = State::ReadIndexedHeaderName;
        } else {
            self.read_name(prefix as usize)?;
            self.state = State::ReadLiteralHeaderValueLengthPrefix;
        }
        Ok(())
    }

    /// Emits the field at a combined-space index. Indexed fields are
    /// already represented in a table, so nothing is inserted.
    fn index_header<S: HeaderSink>(&mut self, index: usize, sink: &mut S) -> Result<()> {
        if index <= static_table::LENGTH {
            let (name, value) = static_table::get(index).ok_or(HpackError::IllegalIndexValue)?;
            self.emit_header(sink, name, value, false);
        } else {
            let entry = self
                .dynamic_table
                .get(index - static_table::LENGTH)
                .cloned()
                .ok_or(HpackError::IllegalIndexValue)?;
            self.emit_header(sink, &entry.name, &entry.value, false);
        }
        Ok(())
    }

    /// Resolves an indexed literal name. The octets are captured before
    /// this header's own insertion can mutate the table.
    fn read_name(&mut self, index: usize) -> Result<()> {
        if index <= static_table::LENGTH {
            let (name, _) = static_table::get(index).ok_or(HpackError::IllegalIndexValue)?;
            self.name = Some(Bytes::from_static(name));
            self.name_length = name.len();
        } else {
            let entry = self
                .dynamic_table
                .get(index - static_table::LENGTH)
                .ok_or(HpackError::IllegalIndexValue)?;
            self.name_length = entry.name.len();
            self.name = Some(entry.name.clone());
        }
        Ok(())
    }

    /// Handles a literal name length that just became known.
    fn begin_name(&mut self, length: usize) -> Result<()> {
        // Empty names cannot be represented in HTTP/1.x.
        if length == 0 {
            return Err(HpackError::Decompression("empty header name"));
        }
        self.name_length = length;

        if self.exceeds_max_header_size(length as u64) {
            if self.index_type != IndexType::Incremental {
                // Name is unused, skip the octets.
                self.name = Some(Bytes::new());
                self.skip_length = length;
                self.state = State::SkipLiteralHeaderName;
                return Ok(());
            }
            // The entry must still be inserted to stay in sync with the
            // peer, unless it cannot fit the table at all.
            if length + HEADER_ENTRY_OVERHEAD > self.dynamic_table.capacity() {
                self.dynamic_table.clear();
                self.name = Some(Bytes::new());
                self.skip_length = length;
                self.state = State::SkipLiteralHeaderName;
                return Ok(());
            }
        }
        self.pending.clear();
        self.state = State::ReadLiteralHeaderName;
        Ok(())
    }

    /// Handles a literal value length that just became known.
    fn begin_value<S: HeaderSink>(&mut self, length: usize, sink: &mut S) -> Result<()> {
        self.value_length = length;

        let new_header_size = self.name_length as u64 + length as u64;
        if self.exceeds_max_header_size(new_header_size) {
            if self.index_type != IndexType::Incremental {
                // Value is unused, skip the octets.
                self.skip_or_finish_value();
                return Ok(());
            }
            if new_header_size + HEADER_ENTRY_OVERHEAD as u64
                > self.dynamic_table.capacity() as u64
            {
                self.dynamic_table.clear();
                self.skip_or_finish_value();
                return Ok(());
            }
            // Falls through: the octets are still needed for insertion,
            // emission is suppressed by the size check in emit_header.
        }

        if length == 0 {
            self.insert_header(sink, Bytes::new());
            self.state = State::ReadHeaderRepresentation;
        } else {
            self.pending.clear();
            self.state = State::ReadLiteralHeaderValue;
        }
        Ok(())
    }

    fn skip_or_finish_value(&mut self) {
        if self.value_length == 0 {
            self.state = State::ReadHeaderRepresentation;
        } else {
            self.skip_length = self.value_length;
            self.state = State::SkipLiteralHeaderValue;
        }
    }

    /// Completes a literal: emits the field and, for incremental
    /// indexing, inserts it as the newest dynamic entry.
    fn insert_header<S: HeaderSink>(&mut self, sink: &mut S, value: Bytes) {
        let name = self.name.take().unwrap_or_default();
        self.emit_header(sink, &name, &value, self.index_type == IndexType::Never);
        if self.index_type == IndexType::Incremental {
            self.dynamic_table.add(HeaderField::new(name, value));
        }
    }

    /// Emits one field, accounting it against the aggregate block limit.
    fn emit_header<S: HeaderSink>(&mut self, sink: &mut S, name: &[u8], value: &[u8], sensitive: bool) {
        let new_size = self.header_size + name.len() as u64 + value.len() as u64;
        if new_size <= self.max_header_size as u64 {
            sink.add_header(name, value, sensitive);
            self.header_size = new_size;
        } else {
            // Truncation is reported by end_header_block.
            self.header_size = self.max_header_size as u64 + 1;
        }
    }

    /// Sticky aggregate size check; crossing the limit marks the block
    /// truncated.
    fn exceeds_max_header_size(&mut self, size: u64) -> bool {
        if size + self.header_size <= self.max_header_size as u64 {
            return false;
        }
        if self.header_size <= self.max_header_size as u64 {
            tracing::debug!(
                max_header_size = self.max_header_size,
                "header block exceeds maximum size, truncating"
            );
        }
        self.header_size = self.max_header_size as u64 + 1;
        true
    }
}
