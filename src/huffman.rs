//! Huffman coding for HPACK string literals, RFC 7541 Appendix B.
//!
//! The code is a canonical prefix code over the 256 byte symbols plus an
//! EOS symbol. Encoding runs a 64-bit accumulator; decoding walks a
//! byte-indexed trie (branching factor 256) built once at first use, so
//! each input byte costs a single table step instead of eight bit steps.

use bytes::{BufMut, BytesMut};
use once_cell::sync::Lazy;

use crate::error::{HpackError, Result};

/// RFC 7541 Appendix B Huffman code table (256 symbols + EOS at 256),
/// as (code, bit length) pairs with codes right-justified.
const HUFFMAN_CODES: [(u32, u8); 257] = [
    // Symbols 0-31
    (0x1ff8, 13), (0x7fffd8, 23), (0xfffffe2, 28), (0xfffffe3, 28),
    (0xfffffe4, 28), (0xfffffe5, 28), (0xfffffe6, 28), (0xfffffe7, 28),
    (0xfffffe8, 28), (0xffffea, 24), (0x3ffffffc, 30), (0xfffffe9, 28),
    (0xfffffea, 28), (0x3ffffffd, 30), (0xfffffeb, 28), (0xfffffec, 28),
    (0xfffffed, 28), (0xfffffee, 28), (0xfffffef, 28), (0xffffff0, 28),
    (0xffffff1, 28), (0xffffff2, 28), (0x3ffffffe, 30), (0xffffff3, 28),
    (0xffffff4, 28), (0xffffff5, 28), (0xffffff6, 28), (0xffffff7, 28),
    (0xffffff8, 28), (0xffffff9, 28), (0xffffffa, 28), (0xffffffb, 28),
    // Symbols 32-63
    (0x14, 6), (0x3f8, 10), (0x3f9, 10), (0xffa, 12),
    (0x1ff9, 13), (0x15, 6), (0xf8, 8), (0x7fa, 11),
    (0x3fa, 10), (0x3fb, 10), (0xf9, 8), (0x7fb, 11),
    (0xfa, 8), (0x16, 6), (0x17, 6), (0x18, 6),
    (0x0, 5), (0x1, 5), (0x2, 5), (0x19, 6),
    (0x1a, 6), (0x1b, 6), (0x1c, 6), (0x1d, 6),
    (0x1e, 6), (0x1f, 6), (0x5c, 7), (0xfb, 8),
    (0x7ffc, 15), (0x20, 6), (0xffb, 12), (0x3fc, 10),
    // Symbols 64-95
    (0x1ffa, 13), (0x21, 6), (0x5d, 7), (0x5e, 7),
    (0x5f, 7), (0x60, 7), (0x61, 7), (0x62, 7),
    (0x63, 7), (0x64, 7), (0x65, 7), (0x66, 7),
    (0x67, 7), (0x68, 7), (0x69, 7), (0x6a, 7),
    (0x6b, 7), (0x6c, 7), (0x6d, 7), (0x6e, 7),
    (0x6f, 7), (0x70, 7), (0x71, 7), (0x72, 7),
    (0xfc, 8), (0x73, 7), (0xfd, 8), (0x1ffb, 13),
    (0x7fff0, 19), (0x1ffc, 13), (0x3ffc, 14), (0x22, 6),
    // Symbols 96-127
    (0x7ffd, 15), (0x3, 5), (0x23, 6), (0x4, 5),
    (0x24, 6), (0x5, 5), (0x25, 6), (0x26, 6),
    (0x27, 6), (0x6, 5), (0x74, 7), (0x75, 7),
    (0x28, 6), (0x29, 6), (0x2a, 6), (0x7, 5),
    (0x2b, 6), (0x76, 7), (0x2c, 6), (0x8, 5),
    (0x9, 5), (0x2d, 6), (0x77, 7), (0x78, 7),
    (0x79, 7), (0x7a, 7), (0x7b, 7), (0x7ffe, 15),
    (0x7fc, 11), (0x3ffd, 14), (0x1ffd, 13), (0xffffffc, 28),
    // Symbols 128-159
    (0xfffe6, 20), (0x3fffd2, 22), (0xfffe7, 20), (0xfffe8, 20),
    (0x3fffd3, 22), (0x3fffd4, 22), (0x3fffd5, 22), (0x7fffd9, 23),
    (0x3fffd6, 22), (0x7fffda, 23), (0x7fffdb, 23), (0x7fffdc, 23),
    (0x7fffdd, 23), (0x7fffde, 23), (0xffffeb, 24), (0x7fffdf, 23),
    (0xffffec, 24), (0xffffed, 24), (0x3fffd7, 22), (0x7fffe0, 23),
    (0xffffee, 24), (0x7fffe1, 23), (0x7fffe2, 23), (0x7fffe3, 23),
    (0x7fffe4, 23), (0x1fffdc, 21), (0x3fffd8, 22), (0x7fffe5, 23),
    (0x3fffd9, 22), (0x7fffe6, 23), (0x7fffe7, 23), (0xffffef, 24),
    // Symbols 160-191
    (0x3fffda, 22), (0x1fffdd, 21), (0xfffe9, 20), (0x3fffdb, 22),
    (0x3fffdc, 22), (0x7fffe8, 23), (0x7fffe9, 23), (0x1fffde, 21),
    (0x7fffea, 23), (0x3fffdd, 22), (0x3fffde, 22), (0xfffff0, 24),
    (0x1fffdf, 21), (0x3fffdf, 22), (0x7fffeb, 23), (0x7fffec, 23),
    (0x1fffe0, 21), (0x1fffe1, 21), (0x3fffe0, 22), (0x1fffe2, 21),
    (0x7fffed, 23), (0x3fffe1, 22), (0x7fffee, 23), (0x7fffef, 23),
    (0xfffea, 20), (0x3fffe2, 22), (0x3fffe3, 22), (0x3fffe4, 22),
    (0x7ffff0, 23), (0x3fffe5, 22), (0x3fffe6, 22), (0x7ffff1, 23),
    // Symbols 192-223
    (0x3ffffe0, 26), (0x3ffffe1, 26), (0xfffeb, 20), (0x7fff1, 19),
    (0x3fffe7, 22), (0x7ffff2, 23), (0x3fffe8, 22), (0x1ffffec, 25),
    (0x3ffffe2, 26), (0x3ffffe3, 26), (0x3ffffe4, 26), (0x7ffffde, 27),
    (0x7ffffdf, 27), (0x3ffffe5, 26), (0xfffff1, 24), (0x1ffffed, 25),
    (0x7fff2, 19), (0x1fffe3, 21), (0x3ffffe6, 26), (0x7ffffe0, 27),
    (0x7ffffe1, 27), (0x3ffffe7, 26), (0x7ffffe2, 27), (0xfffff2, 24),
    (0x1fffe4, 21), (0x1fffe5, 21), (0x3ffffe8, 26), (0x3ffffe9, 26),
    (0xffffffd, 28), (0x7ffffe3, 27), (0x7ffffe4, 27), (0x7ffffe5, 27),
    // Symbols 224-255
    (0xfffec, 20), (0xfffff3, 24), (0xfffed, 20), (0x1fffe6, 21),
    (0x3fffe9, 22), (0x1fffe7, 21), (0x1fffe8, 21), (0x7ffff3, 23),
    (0x3fffea, 22), (0x3fffeb, 22), (0x1ffffee, 25), (0x1ffffef, 25),
    (0xfffff4, 24), (0xfffff5, 24), (0x3ffffea, 26), (0x7ffff4, 23),
    (0x3ffffeb, 26), (0x7ffffe6, 27), (0x3ffffec, 26), (0x3ffffed, 26),
    (0x7ffffe7, 27), (0x7ffffe8, 27), (0x7ffffe9, 27), (0x7ffffea, 27),
    (0x7ffffeb, 27), (0xffffffe, 28), (0x7ffffec, 27), (0x7ffffed, 27),
    (0x7ffffee, 27), (0x7ffffef, 27), (0x7fffff0, 27), (0x3ffffee, 26),
    // EOS symbol at 256
    (0x3fffffff, 30),
];

const EOS: u16 = 256;

/// Sentinel for an unassigned child slot.
const UNSET: u16 = u16::MAX;

/// Trie node. Interior nodes carry a 256-entry child table; terminal
/// nodes carry their symbol and the number of bits consumed out of the
/// final 8-bit chunk of the code.
struct Node {
    children: Vec<u16>,
    symbol: u16,
    terminal_bits: u8,
}

impl Node {
    fn interior() -> Self {
        Node {
            children: vec![UNSET; 256],
            symbol: 0,
            terminal_bits: 0,
        }
    }

    fn terminal(symbol: u16, code_len: u8) -> Self {
        let bits = code_len & 0x07;
        Node {
            children: Vec::new(),
            symbol,
            terminal_bits: if bits == 0 { 8 } else { bits },
        }
    }

    fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }
}

/// Byte-indexed decoding trie, index 0 is the root.
struct DecodeTrie {
    nodes: Vec<Node>,
}

impl DecodeTrie {
    fn build() -> Self {
        let mut nodes = vec![Node::interior()];
        for (symbol, &(code, len)) in HUFFMAN_CODES.iter().enumerate() {
            Self::insert(&mut nodes, symbol as u16, code, len);
        }
        DecodeTrie { nodes }
    }

    fn insert(nodes: &mut Vec<Node>, symbol: u16, code: u32, mut len: u8) {
        let mut current = 0usize;
        while len > 8 {
            len -= 8;
            let chunk = ((code >> len) & 0xFF) as usize;
            let next = nodes[current].children[chunk];
            current = if next == UNSET {
                let created = nodes.len() as u16;
                nodes.push(Node::interior());
                nodes[current].children[chunk] = created;
                created as usize
            } else {
                next as usize
            };
        }

        // The terminal covers every 8-bit extension of the code's last
        // partial byte, so chunk lookups need no masking of pad bits.
        let terminal = nodes.len() as u16;
        nodes.push(Node::terminal(symbol, len));
        let shift = 8 - len;
        let start = ((code << shift) & 0xFF) as usize;
        let count = 1usize << shift;
        for slot in &mut nodes[current].children[start..start + count] {
            *slot = terminal;
        }
    }
}

static DECODE_TRIE: Lazy<DecodeTrie> = Lazy::new(DecodeTrie::build);

/// Returns the Huffman-encoded length of `data` in bytes.
#[inline]
pub fn encoded_len(data: &[u8]) -> usize {
    let total_bits: u64 = data
        .iter()
        .map(|&byte| HUFFMAN_CODES[byte as usize].1 as u64)
        .sum();
    total_bits.div_ceil(8) as usize
}

/// Huffman-encodes `data` into `dst`, padding the final byte with the
/// most significant bits of the EOS code (all ones).
pub fn encode(dst: &mut BytesMut, data: &[u8]) {
    let mut current: u64 = 0;
    let mut bits: u32 = 0;

    for &byte in data {
        let (code, len) = HUFFMAN_CODES[byte as usize];
        current = (current << len) | code as u64;
        bits += len as u32;
        while bits >= 8 {
            bits -= 8;
            dst.put_u8((current >> bits) as u8);
        }
    }

    if bits > 0 {
        let pad = 8 - bits;
        current = (current << pad) | ((1u64 << pad) - 1);
        dst.put_u8(current as u8);
    }
}

/// Decodes a Huffman-coded string literal.
///
/// Fails if the EOS symbol appears, if the final padding is 8 bits or
/// longer, or if the padding is not a prefix of the EOS code (all ones),
/// per RFC 7541 Section 5.2.
pub fn decode(input: &[u8]) -> Result<Vec<u8>> {
    let trie = &*DECODE_TRIE;
    let mut out = Vec::with_capacity(input.len() * 2);
    let mut node = 0usize;
    let mut current: u64 = 0;
    let mut bits: u32 = 0;

    for &byte in input {
        current = (current << 8) | byte as u64;
        bits += 8;
        while bits >= 8 {
            let chunk = ((current >> (bits - 8)) & 0xFF) as usize;
            let next = trie.nodes[node].children[chunk];
            if next == UNSET {
                return Err(HpackError::Decompression("invalid huffman code"));
            }
            let next = next as usize;
            if trie.nodes[next].is_terminal() {
                if trie.nodes[next].symbol == EOS {
                    return Err(HpackError::Decompression("huffman EOS decoded"));
                }
                out.push(trie.nodes[next].symbol as u8);
                bits -= trie.nodes[next].terminal_bits as u32;
                node = 0;
            } else {
                bits -= 8;
                node = next;
            }
        }
    }

    // Fewer than 8 bits remain; zero-fill the chunk's low bits and keep
    // resolving symbols that fit entirely in the real bits.
    while bits > 0 {
        let chunk = ((current << (8 - bits)) & 0xFF) as usize;
        let next = trie.nodes[node].children[chunk];
        if next == UNSET {
            break;
        }
        let next = next as usize;
        if !trie.nodes[next].is_terminal() || trie.nodes[next].terminal_bits as u32 > bits {
            break;
        }
        if trie.nodes[next].symbol == EOS {
            return Err(HpackError::Decompression("huffman EOS decoded"));
        }
        out.push(trie.nodes[next].symbol as u8);
        bits -= trie.nodes[next].terminal_bits as u32;
        node = 0;
    }

    if node != 0 {
        // Stranded in an interior node: at least 8 bits of padding.
        return Err(HpackError::Decompression("invalid huffman padding"));
    }
    let mask = (1u64 << bits) - 1;
    if current & mask != mask {
        return Err(HpackError::Decompression("invalid huffman padding"));
    }

    Ok(out)
}
