//! HPACK: Header Compression for HTTP/2 (RFC 7541).
//!
//! A stateful encoder and decoder pair for HTTP/2 header blocks. Each
//! endpoint keeps one [`Encoder`] for outbound headers and one
//! [`Decoder`] for inbound headers; the wire format is self-describing,
//! so the two peers' dynamic tables evolve in lock-step.
//!
//! - **Streaming decode**: the decoder suspends at any byte boundary and
//!   resumes when more input arrives, so it plugs into any transport.
//! - **Safe**: no `unsafe` blocks; indexed tables instead of pointer
//!   graphs.
//! - **Bounded**: wire integers are capped at 2^31 - 1 and a per-block
//!   aggregate size limit guards against decompression bombs.
//!
//! # Example
//!
//! ```rust
//! use bytes::BytesMut;
//! use hpack::{Decoder, Encoder, HeaderSink};
//!
//! struct Collect(Vec<(Vec<u8>, Vec<u8>)>);
//!
//! impl HeaderSink for Collect {
//!     fn add_header(&mut self, name: &[u8], value: &[u8], _sensitive: bool) {
//!         self.0.push((name.to_vec(), value.to_vec()));
//!     }
//! }
//!
//! let mut encoder = Encoder::new(4096);
//! let mut block = BytesMut::new();
//! encoder.encode_header(&mut block, b":method", b"GET", false);
//! encoder.encode_header(&mut block, b":authority", b"www.example.com", false);
//!
//! let mut decoder = Decoder::new(8192, 4096);
//! let mut headers = Collect(Vec::new());
//! let mut src = block.freeze();
//! decoder.decode(&mut src, &mut headers).unwrap();
//! assert!(!decoder.end_header_block());
//!
//! assert_eq!(headers.0[0], (b":method".to_vec(), b"GET".to_vec()));
//! assert_eq!(headers.0[1], (b":authority".to_vec(), b"www.example.com".to_vec()));
//! ```

pub mod decoder;
pub mod dynamic_table;
pub mod encoder;
pub mod error;
pub mod header_field;
pub mod huffman;
pub mod integer;
pub mod static_table;
mod util;

pub use decoder::{Decoder, HeaderSink};
pub use dynamic_table::DynamicTable;
pub use encoder::Encoder;
pub use error::{HpackError, Result};
pub use header_field::{HeaderField, HEADER_ENTRY_OVERHEAD};
