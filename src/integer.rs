//! Prefix integer encoding and decoding.
//!
//! Implements the variable-length integer encoding of RFC 7541 Section 5.1.
//! An integer is represented in two parts:
//! - a prefix that fills the remainder of a byte (N bits, 1 ≤ N ≤ 8);
//! - optional continuation bytes if the value doesn't fit in the prefix.
//!
//! If I < 2^N - 1, the integer is encoded in the N-bit prefix. Otherwise
//! the prefix bits are all set to 1 and the remainder is encoded
//! little-endian in base 128, the high bit of each byte marking
//! continuation.
//!
//! Values are bounded by 2^31 - 1; anything larger on the wire is a
//! decoding error.

use bytes::{BufMut, BytesMut};

use crate::error::{HpackError, Result};

/// Largest integer value this codec accepts on the wire.
pub const MAX_INTEGER: u32 = i32::MAX as u32;

/// Encodes `value` with an N-bit prefix.
///
/// `mask` carries the representation bits above the prefix and is OR-ed
/// into the first byte.
///
/// # Example
///
/// ```
/// use bytes::BytesMut;
///
/// let mut buf = BytesMut::new();
/// // Encode 10 with a 5-bit prefix under the 001 size-update mask.
/// hpack::integer::encode(&mut buf, 0b0010_0000, 5, 10);
/// assert_eq!(&buf[..], &[0b0010_1010]);
/// ```
pub fn encode(dst: &mut BytesMut, mask: u8, prefix_bits: u8, value: u32) {
    debug_assert!(prefix_bits >= 1 && prefix_bits <= 8, "prefix_bits must be 1-8");

    let max_prefix = 0xFFu32 >> (8 - prefix_bits);
    if value < max_prefix {
        dst.put_u8(mask | value as u8);
        return;
    }

    dst.put_u8(mask | max_prefix as u8);
    let mut remaining = value - max_prefix;
    while remaining >= 0x80 {
        dst.put_u8((remaining & 0x7F) as u8 | 0x80);
        remaining >>= 7;
    }
    dst.put_u8(remaining as u8);
}

/// Decodes an integer with an N-bit prefix from a contiguous buffer.
///
/// Returns the decoded value and the number of bytes consumed. The
/// streaming decoder ([`IntegerDecoder`]) is the byte-at-a-time variant
/// used by the header block state machine.
pub fn decode(buf: &[u8], prefix_bits: u8) -> Result<(u32, usize)> {
    debug_assert!(prefix_bits >= 1 && prefix_bits <= 8, "prefix_bits must be 1-8");

    let first = *buf
        .first()
        .ok_or(HpackError::Decompression("truncated integer"))?;
    let max_prefix = 0xFFu32 >> (8 - prefix_bits);
    let prefix = first as u32 & max_prefix;
    if prefix < max_prefix {
        return Ok((prefix, 1));
    }

    let mut decoder = IntegerDecoder::new();
    decoder.begin(max_prefix);
    for (i, &byte) in buf[1..].iter().enumerate() {
        if let Some(value) = decoder.push(byte)? {
            return Ok((value, i + 2));
        }
    }
    Err(HpackError::Decompression("truncated integer"))
}

/// Resumable decoder for the continuation bytes of a prefix integer.
///
/// Armed with [`begin`](Self::begin) once the caller has observed a
/// saturated prefix, then fed one byte at a time; the value is complete
/// when [`push`](Self::push) returns `Some`. Keeping the partial value
/// and shift here lets the header block decoder suspend between any two
/// bytes without rewinding its source.
#[derive(Debug, Default)]
pub struct IntegerDecoder {
    value: u32,
    shift: u32,
}

impl IntegerDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the decoder with the saturated prefix value.
    pub fn begin(&mut self, prefix: u32) {
        self.value = prefix;
        self.shift = 0;
    }

    /// Consumes one continuation byte.
    ///
    /// Returns `Ok(Some(value))` when the byte had its continuation bit
    /// clear, `Ok(None)` when more bytes are needed.
    pub fn push(&mut self, byte: u8) -> Result<Option<u32>> {
        // At shift 28 only the low three bits can contribute without
        // taking the total past 2^31 - 1.
        if self.shift == 28 && byte & 0xF8 != 0 {
            return Err(HpackError::Decompression("integer overflow"));
        }

        let add = ((byte & 0x7F) as u32) << self.shift;
        self.value = self
            .value
            .checked_add(add)
            .filter(|v| *v <= MAX_INTEGER)
            .ok_or(HpackError::Decompression("integer overflow"))?;

        if byte & 0x80 == 0 {
            Ok(Some(self.value))
        } else {
            self.shift += 7;
            Ok(None)
        }
    }
}
