//! # strata-rlp
//!
//! RLP (Recursive Length Prefix) codec.
//!
//! Encoding goes through the `rlp` crate's [`RlpStream`]. Decoding is done in
//! two stages: [`RlpItem::decode`] parses bytes into an untyped tree of byte
//! strings and lists while enforcing canonical form, and each record type
//! then converts that tree with the schema helpers on [`RlpItem`], rejecting
//! any shape mismatch.
//!
//! ## RLP Encoding Rules
//!
//! - Single byte `[0x00, 0x7f]`: itself
//! - Short string (0-55 bytes): `0x80 + len` + data
//! - Long string (>55 bytes): `0xb7 + len_of_len` + len + data
//! - Short list (0-55 bytes payload): `0xc0 + len` + items
//! - Long list (>55 bytes payload): `0xf7 + len_of_len` + len + items

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod item;

pub use error::RlpError;
pub use item::RlpItem;

// Re-export rlp crate for direct use
pub use rlp::{Encodable, RlpStream};

// Re-export primitives with RLP support
pub use strata_primitives::{Address, H256, U256};

/// Encode a value to RLP bytes
pub fn encode<T: Encodable>(value: &T) -> Vec<u8> {
    rlp::encode(value).to_vec()
}

/// Encode a slice of values as an RLP list
pub fn encode_list<T: Encodable>(items: &[T]) -> Vec<u8> {
    let mut stream = RlpStream::new_list(items.len());
    for item in items {
        stream.append(item);
    }
    stream.out().to_vec()
}

/// Append a byte string to `stream` as one list item
pub fn append_bytes(stream: &mut RlpStream, bytes: &[u8]) {
    stream.append(&bytes);
}

/// Write a byte string without counting it as a list item.
///
/// Only for `Encodable::rlp_append` bodies that emit a single string; the
/// `RlpStream::append` that invoked them counts the item.
pub fn write_bytes(stream: &mut RlpStream, bytes: &[u8]) {
    stream.encoder().encode_value(bytes);
}

/// Write already-encoded RLP without counting it as a list item.
///
/// Same contract as [`write_bytes`].
pub fn write_raw(stream: &mut RlpStream, encoded: &[u8]) {
    stream.append_raw(encoded, 0);
}

/// Decode a complete RLP document and convert it with `convert`.
pub fn decode_with<T>(
    data: &[u8],
    convert: impl FnOnce(&RlpItem) -> Result<T, RlpError>,
) -> Result<T, RlpError> {
    let item = RlpItem::decode(data)?;
    convert(&item)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Single byte encoding ====================

    #[test]
    fn test_single_byte_values() {
        assert_eq!(encode(&vec![0x00u8]), vec![0x00]);
        assert_eq!(encode(&vec![0x7fu8]), vec![0x7f]);
        // 0x80 needs length prefix
        assert_eq!(encode(&vec![0x80u8]), vec![0x81, 0x80]);
    }

    // ==================== String encoding ====================

    #[test]
    fn test_short_string_encoding() {
        assert_eq!(encode(&""), vec![0x80]);
        assert_eq!(encode(&"a"), vec![0x61]);
        assert_eq!(encode(&"abc"), vec![0x83, b'a', b'b', b'c']);
    }

    #[test]
    fn test_string_length_boundary() {
        let short = encode(&vec![0x42u8; 55]);
        assert_eq!(short[0], 0xb7);
        assert_eq!(short.len(), 56);

        let long = encode(&vec![0x42u8; 56]);
        assert_eq!(&long[..2], &[0xb8, 56]);
        assert_eq!(long.len(), 58);
    }

    // ==================== Integer encoding ====================

    #[test]
    fn test_integer_encoding_is_minimal() {
        assert_eq!(encode(&0u64), vec![0x80]);
        assert_eq!(encode(&127u64), vec![0x7f]);
        assert_eq!(encode(&128u64), vec![0x81, 0x80]);
        assert_eq!(encode(&0x0400u64), vec![0x82, 0x04, 0x00]);
        assert_eq!(encode(&U256::zero()), vec![0x80]);
        assert_eq!(encode(&U256::from(1024)), vec![0x82, 0x04, 0x00]);
    }

    // ==================== List encoding ====================

    #[test]
    fn test_list_encoding() {
        assert_eq!(encode_list::<u64>(&[]), vec![0xc0]);
        assert_eq!(encode_list(&[1u64, 2u64]), vec![0xc2, 0x01, 0x02]);
    }

    #[test]
    fn test_nested_list() {
        // [[], [[]], [[], [[]]]] is the set-theoretic representation of three
        let mut s = RlpStream::new_list(3);
        s.begin_list(0);
        s.begin_list(1).begin_list(0);
        s.begin_list(2).begin_list(0).begin_list(1).begin_list(0);
        assert_eq!(
            s.out().to_vec(),
            vec![0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0]
        );
    }

    #[test]
    fn test_primitive_encodings() {
        let addr = Address::from_bytes([0x42; 20]);
        let encoded = encode(&addr);
        assert_eq!(encoded[0], 0x94);
        assert_eq!(&encoded[1..], &[0x42; 20]);

        let hash = H256::from_bytes([0x11; 32]);
        let encoded = encode(&hash);
        assert_eq!(encoded[0], 0xa0);
    }

    #[test]
    fn test_append_bytes_uses_string_header() {
        let mut s = RlpStream::new_list(2);
        append_bytes(&mut s, &[0x05]);
        append_bytes(&mut s, &[0u8; 8]);
        assert_eq!(
            s.out().to_vec(),
            vec![0xca, 0x05, 0x88, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_append_bytes_completes_enclosing_list() {
        let mut s = RlpStream::new_list(3);
        s.append(&1u64);
        append_bytes(&mut s, b"strata");
        s.append(&2u64);
        let mut expected = vec![0xc9, 0x01, 0x86];
        expected.extend_from_slice(b"strata");
        expected.push(0x02);
        assert_eq!(s.out().to_vec(), expected);
    }

    struct Blob(Vec<u8>);

    impl Encodable for Blob {
        fn rlp_append(&self, s: &mut RlpStream) {
            write_bytes(s, &self.0);
        }
    }

    struct PreEncoded(Vec<u8>);

    impl Encodable for PreEncoded {
        fn rlp_append(&self, s: &mut RlpStream) {
            write_raw(s, &self.0);
        }
    }

    #[test]
    fn test_uncounted_writers_count_once_through_append() {
        let mut s = RlpStream::new_list(4);
        s.append(&Blob(vec![0xaa, 0xbb]));
        s.append(&PreEncoded(vec![0xc1, 0x05]));
        s.append(&PreEncoded(vec![0xc1, 0x06]));
        s.append(&Blob(Vec::new()));
        assert_eq!(
            s.out().to_vec(),
            vec![0xc8, 0x82, 0xaa, 0xbb, 0xc1, 0x05, 0xc1, 0x06, 0x80]
        );
        assert_eq!(encode(&Blob(vec![0x01])), vec![0x01]);
    }

    #[test]
    fn test_decode_with_converts() {
        let encoded = encode_list(&[7u64, 9u64]);
        let values = decode_with(&encoded, |item| {
            item.as_list()?.iter().map(RlpItem::as_u64).collect::<Result<Vec<_>, _>>()
        })
        .unwrap();
        assert_eq!(values, vec![7, 9]);
    }
}
