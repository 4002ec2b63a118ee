//! HPACK error types.
//!
//! Every error here is a protocol error caused by peer bytes. RFC 7541
//! Section 2.2 makes header blocks non-resynchronizable, so any of these
//! is fatal for the block and the caller is expected to tear down the
//! HTTP/2 connection with a COMPRESSION_ERROR.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, HpackError>;

/// Decoding failures raised while processing a header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HpackError {
    /// Malformed input: integer overflow, truncated or over-padded
    /// Huffman data, an empty header name, and similar wire damage.
    #[error("decompression failure: {0}")]
    Decompression(&'static str),

    /// An indexed representation referenced index zero or an index past
    /// the end of the combined static + dynamic table space.
    #[error("illegal index value")]
    IllegalIndexValue,

    /// A dynamic table size update appeared after the first header field
    /// of the block (RFC 7541 Section 4.2 requires it at the beginning).
    #[error("illegal encoding context update")]
    IllegalEncodingContextUpdate,

    /// A dynamic table size update exceeded the maximum this decoder
    /// advertised via SETTINGS_HEADER_TABLE_SIZE.
    #[error("invalid max dynamic table size")]
    InvalidMaxDynamicTableSize,

    /// The local maximum was reduced but the peer's next header block did
    /// not lead with the required dynamic table size update.
    #[error("max dynamic table size change required")]
    MaxDynamicTableSizeChangeRequired,
}
