//! Paired encoder/decoder round-trip behavior: table synchronization,
//! sensitive headers, truncation, and size updates.

use bytes::BytesMut;
use hpack::{Decoder, Encoder, HeaderSink};

#[derive(Default)]
struct Collector {
    headers: Vec<(Vec<u8>, Vec<u8>, bool)>,
}

impl HeaderSink for Collector {
    fn add_header(&mut self, name: &[u8], value: &[u8], sensitive: bool) {
        self.headers.push((name.to_vec(), value.to_vec(), sensitive));
    }
}

/// Encodes one block and feeds it straight to the decoder. Returns the
/// emitted headers and the truncation flag.
fn round_trip(
    encoder: &mut Encoder,
    decoder: &mut Decoder,
    headers: &[(&[u8], &[u8], bool)],
) -> (Vec<(Vec<u8>, Vec<u8>, bool)>, bool) {
    let mut block = BytesMut::new();
    for &(name, value, sensitive) in headers {
        encoder.encode_header(&mut block, name, value, sensitive);
    }
    let mut sink = Collector::default();
    let mut src = block.freeze();
    decoder.decode(&mut src, &mut sink).unwrap();
    let truncated = decoder.end_header_block();
    (sink.headers, truncated)
}

fn assert_emitted(emitted: &[(Vec<u8>, Vec<u8>, bool)], expected: &[(&[u8], &[u8], bool)]) {
    assert_eq!(emitted.len(), expected.len());
    for (got, &(name, value, sensitive)) in emitted.iter().zip(expected) {
        assert_eq!(got.0, name);
        assert_eq!(got.1, value);
        assert_eq!(got.2, sensitive);
    }
}

#[test]
fn test_static_only_round_trip() {
    let mut encoder = Encoder::new(0);
    let mut decoder = Decoder::new(8192, 0);

    let headers: &[(&[u8], &[u8], bool)] = &[
        (b":method", b"GET", false),
        (b":scheme", b"https", false),
        (b":path", b"/", false),
    ];
    let (emitted, truncated) = round_trip(&mut encoder, &mut decoder, headers);

    assert!(!truncated);
    assert_emitted(&emitted, headers);
    assert_eq!(encoder.table().len(), 0);
    assert_eq!(decoder.table().len(), 0);
}

#[test]
fn test_tables_stay_in_sync_across_blocks() {
    let mut encoder = Encoder::new(4096);
    let mut decoder = Decoder::new(8192, 4096);

    let headers: &[(&[u8], &[u8], bool)] = &[
        (b":authority", b"example.org", false),
        (b"x-request-id", b"7d1a0b5c", false),
        (b"accept", b"application/json", false),
    ];

    for _ in 0..3 {
        let (emitted, truncated) = round_trip(&mut encoder, &mut decoder, headers);
        assert!(!truncated);
        assert_emitted(&emitted, headers);
        assert_eq!(encoder.table().len(), decoder.table().len());
        assert_eq!(encoder.table().size(), decoder.table().size());
    }
    assert_eq!(encoder.table().len(), 3);
}

#[test]
fn test_repeat_block_collapses_to_indexed() {
    let mut encoder = Encoder::new(4096);
    let mut decoder = Decoder::new(8192, 4096);

    let headers: &[(&[u8], &[u8], bool)] = &[(b"x-session", b"0123456789abcdef", false)];

    let mut first = BytesMut::new();
    encoder.encode_header(&mut first, headers[0].0, headers[0].1, false);
    let mut second = BytesMut::new();
    encoder.encode_header(&mut second, headers[0].0, headers[0].1, false);

    // Once cached, the representation is a short indexed form.
    assert!(second.len() <= 2);
    assert!(second.len() < first.len());

    for block in [first, second] {
        let mut sink = Collector::default();
        let mut src = block.freeze();
        decoder.decode(&mut src, &mut sink).unwrap();
        assert!(!decoder.end_header_block());
        assert_emitted(&sink.headers, headers);
    }
}

#[test]
fn test_sensitive_header_round_trip() {
    let mut encoder = Encoder::new(4096);
    let mut decoder = Decoder::new(8192, 4096);

    let headers: &[(&[u8], &[u8], bool)] = &[
        (b":method", b"POST", false),
        (b"authorization", b"Bearer secret-token", true),
        (b"cookie", b"session=abcd", true),
    ];
    let (emitted, truncated) = round_trip(&mut encoder, &mut decoder, headers);

    assert!(!truncated);
    assert_emitted(&emitted, headers);
    // Sensitive fields never enter either table.
    assert_eq!(encoder.table().len(), 0);
    assert_eq!(decoder.table().len(), 0);
}

#[test]
fn test_empty_value_round_trip() {
    let mut encoder = Encoder::new(4096);
    let mut decoder = Decoder::new(8192, 4096);

    let headers: &[(&[u8], &[u8], bool)] = &[(b"x-empty", b"", false)];
    let (emitted, truncated) = round_trip(&mut encoder, &mut decoder, headers);

    assert!(!truncated);
    assert_emitted(&emitted, headers);
    assert_eq!(decoder.table().len(), 1);
}

#[test]
fn test_binary_value_round_trip() {
    let mut encoder = Encoder::new(4096);
    let mut decoder = Decoder::new(8192, 4096);

    let value: Vec<u8> = (0u8..=255).collect();
    let headers: &[(&[u8], &[u8], bool)] = &[(b"x-blob", &value, false)];
    let (emitted, truncated) = round_trip(&mut encoder, &mut decoder, headers);

    assert!(!truncated);
    assert_emitted(&emitted, headers);
}

#[test]
fn test_long_value_round_trip() {
    // Length needs integer continuation bytes in the string literal.
    let mut encoder = Encoder::new(4096);
    let mut decoder = Decoder::new(65536, 4096);

    let value = b"z".repeat(500);
    let headers: &[(&[u8], &[u8], bool)] = &[(b"x-long", &value, false)];
    let (emitted, truncated) = round_trip(&mut encoder, &mut decoder, headers);

    assert!(!truncated);
    assert_emitted(&emitted, headers);
}

#[test]
fn test_oversize_header_bypasses_tables() {
    let mut encoder = Encoder::new(64);
    let mut decoder = Decoder::new(8192, 64);

    // Seed an entry on both sides.
    round_trip(&mut encoder, &mut decoder, &[(b"a", b"1", false)]);
    assert_eq!(encoder.table().len(), 1);
    assert_eq!(decoder.table().len(), 1);

    // 7 + 40 + 32 > 64: encoded as a plain literal, no insertion.
    let value = "v".repeat(40);
    let headers: &[(&[u8], &[u8], bool)] = &[(b"x-large", value.as_bytes(), false)];
    let (emitted, _) = round_trip(&mut encoder, &mut decoder, headers);

    assert_emitted(&emitted, headers);
    assert_eq!(encoder.table().len(), 1);
    assert_eq!(decoder.table().len(), 1);
}

#[test]
fn test_eviction_stays_in_sync() {
    // Room for two 34-byte entries on each side.
    let mut encoder = Encoder::new(68);
    let mut decoder = Decoder::new(8192, 68);

    for (name, value) in [(b"a", b"1"), (b"b", b"2"), (b"c", b"3"), (b"d", b"4")] {
        let headers: &[(&[u8], &[u8], bool)] = &[(name, value, false)];
        let (emitted, _) = round_trip(&mut encoder, &mut decoder, headers);
        assert_emitted(&emitted, headers);
    }

    assert_eq!(encoder.table().len(), 2);
    assert_eq!(decoder.table().len(), 2);
    assert_eq!(&decoder.table().get(1).unwrap().name[..], b"d");
    assert_eq!(&decoder.table().get(2).unwrap().name[..], b"c");
}

#[test]
fn test_size_update_round_trip() {
    let mut encoder = Encoder::new(4096);
    let mut decoder = Decoder::new(8192, 4096);

    round_trip(&mut encoder, &mut decoder, &[(b"x-keep", b"1", false)]);
    assert_eq!(decoder.table().len(), 1);

    // Shrink to zero: the update leads the next block and empties the
    // peer table.
    let mut block = BytesMut::new();
    encoder.set_max_header_table_size(&mut block, 0);
    encoder.encode_header(&mut block, b":method", b"GET", false);

    let mut sink = Collector::default();
    let mut src = block.freeze();
    decoder.decode(&mut src, &mut sink).unwrap();
    assert!(!decoder.end_header_block());

    assert_eq!(decoder.table().capacity(), 0);
    assert_eq!(decoder.table().len(), 0);
    assert_emitted(&sink.headers, &[(b":method", b"GET", false)]);
}

#[test]
fn test_truncation_reported_and_bounded() {
    let mut encoder = Encoder::new(4096);
    let mut decoder = Decoder::new(100, 4096);

    // Aggregate decoded size is roughly 200 octets.
    let big = "x".repeat(60);
    let headers: &[(&[u8], &[u8], bool)] = &[
        (b"h1", big.as_bytes(), false),
        (b"h2", big.as_bytes(), false),
        (b"h3", big.as_bytes(), false),
    ];
    let (emitted, truncated) = round_trip(&mut encoder, &mut decoder, headers);

    assert!(truncated);
    let total: usize = emitted.iter().map(|(n, v, _)| n.len() + v.len()).sum();
    assert!(total <= 100);

    // The decoder still mirrored the encoder's insertions.
    assert_eq!(encoder.table().len(), decoder.table().len());
    assert_eq!(encoder.table().size(), decoder.table().size());
}

#[test]
fn test_fragmented_delivery() {
    let mut encoder = Encoder::new(4096);
    let mut decoder = Decoder::new(8192, 4096);

    let headers: &[(&[u8], &[u8], bool)] = &[
        (b":authority", b"www.example.com", false),
        (b"user-agent", b"curl/8.5.0", false),
    ];
    let mut block = BytesMut::new();
    for &(name, value, sensitive) in headers {
        encoder.encode_header(&mut block, name, value, sensitive);
    }

    // Deliver one byte at a time across three chunk sizes.
    for chunk_size in [1, 2, 3] {
        let mut sink = Collector::default();
        for chunk in block.chunks(chunk_size) {
            let mut src = bytes::Bytes::copy_from_slice(chunk);
            decoder.decode(&mut src, &mut sink).unwrap();
        }
        assert!(!decoder.end_header_block());
        assert_emitted(&sink.headers, headers);
    }
}

#[test]
fn test_duplicate_headers_preserve_order() {
    let mut encoder = Encoder::new(4096);
    let mut decoder = Decoder::new(8192, 4096);

    let headers: &[(&[u8], &[u8], bool)] = &[
        (b"set-cookie", b"a=1", false),
        (b"set-cookie", b"b=2", false),
        (b"set-cookie", b"a=1", false),
    ];
    let (emitted, _) = round_trip(&mut encoder, &mut decoder, headers);
    assert_emitted(&emitted, headers);
}
