//! Nibble paths and hex-prefix encoding

/// Split bytes into 4-bit nibbles, high nibble first.
pub fn bytes_to_nibbles(bytes: &[u8]) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(bytes.len() * 2);
    for b in bytes {
        nibbles.push(b >> 4);
        nibbles.push(b & 0x0f);
    }
    nibbles
}

/// Length of the shared prefix of two nibble paths.
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Hex-prefix (compact) encoding of a nibble path.
///
/// The first nibble carries two flags: bit 1 marks a leaf, bit 0 marks an
/// odd-length path, in which case the first path nibble shares the byte.
pub fn hex_prefix_encode(nibbles: &[u8], is_leaf: bool) -> Vec<u8> {
    let odd = nibbles.len() % 2 == 1;
    let flag = (if is_leaf { 2 } else { 0 }) + (if odd { 1 } else { 0 });

    let mut out = Vec::with_capacity(nibbles.len() / 2 + 1);
    let rest = if odd {
        out.push((flag << 4) | nibbles[0]);
        &nibbles[1..]
    } else {
        out.push(flag << 4);
        nibbles
    };
    for pair in rest.chunks(2) {
        out.push((pair[0] << 4) | pair[1]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_nibbles() {
        assert_eq!(bytes_to_nibbles(&[0x12, 0xab]), vec![1, 2, 0xa, 0xb]);
        assert!(bytes_to_nibbles(&[]).is_empty());
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix_len(&[1, 2, 3], &[1, 2, 4]), 2);
        assert_eq!(common_prefix_len(&[1], &[2]), 0);
        assert_eq!(common_prefix_len(&[], &[2]), 0);
    }

    // Vectors from the hex-prefix appendix of the yellow paper
    #[test]
    fn test_hex_prefix_extension() {
        assert_eq!(hex_prefix_encode(&[1, 2, 3, 4, 5], false), vec![0x11, 0x23, 0x45]);
        assert_eq!(hex_prefix_encode(&[0, 1, 2, 3, 4, 5], false), vec![0x00, 0x01, 0x23, 0x45]);
    }

    #[test]
    fn test_hex_prefix_leaf() {
        assert_eq!(
            hex_prefix_encode(&[0, 0xf, 1, 0xc, 0xb, 8], true),
            vec![0x20, 0x0f, 0x1c, 0xb8]
        );
        assert_eq!(hex_prefix_encode(&[0xf, 1, 0xc, 0xb, 8], true), vec![0x3f, 0x1c, 0xb8]);
        assert_eq!(hex_prefix_encode(&[], true), vec![0x20]);
    }
}
