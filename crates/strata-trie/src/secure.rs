//! Keyed tries used by state and block commitments

use crate::Trie;
use strata_crypto::keccak256;
use strata_primitives::H256;
use strata_rlp::{encode, Encodable};

/// Trie whose keys are hashed with keccak before insertion.
///
/// Used for the account trie and per-account storage tries.
#[derive(Debug, Clone, Default)]
pub struct SecureTrie {
    inner: Trie,
}

impl SecureTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: &[u8], value: Vec<u8>) {
        self.inner.put(keccak256(key).as_bytes(), value);
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.inner.get(keccak256(key).as_bytes())
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.inner.delete(keccak256(key).as_bytes());
    }

    pub fn root(&self) -> H256 {
        self.inner.root()
    }
}

/// Root of a list keyed by `rlp(index)`, as used for transactions and receipts.
///
/// Each value is already serialized. Typed transactions and receipts are
/// passed as their `type || payload` bytes.
pub fn ordered_trie_root<I, V>(values: I) -> H256
where
    I: IntoIterator<Item = V>,
    V: Into<Vec<u8>>,
{
    let mut trie = Trie::new();
    for (index, value) in values.into_iter().enumerate() {
        trie.put(&encode(&(index as u64)), value.into());
    }
    trie.root()
}

/// Root of a list of encodable items keyed by `rlp(index)`.
pub fn ordered_trie_root_of<T: Encodable>(items: &[T]) -> H256 {
    ordered_trie_root(items.iter().map(encode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_trie_hashes_keys() {
        let mut secure = SecureTrie::new();
        secure.put(b"key", b"value".to_vec());
        assert_eq!(secure.get(b"key"), Some(&b"value"[..]));

        let mut plain = Trie::new();
        plain.put(keccak256(b"key").as_bytes(), b"value".to_vec());
        assert_eq!(secure.root(), plain.root());

        secure.delete(b"key");
        assert_eq!(secure.root(), Trie::new().root());
    }

    #[test]
    fn test_ordered_root_of_nothing_is_empty_root() {
        assert_eq!(
            ordered_trie_root(Vec::<Vec<u8>>::new()),
            strata_crypto::KECCAK_NULL_RLP
        );
    }

    #[test]
    fn test_ordered_root_uses_rlp_index_keys() {
        let values = vec![vec![0xaa; 40], vec![0xbb; 3]];
        let mut expected = Trie::new();
        // rlp(0) is 0x80, rlp(1) is 0x01
        expected.put(&[0x80], values[0].clone());
        expected.put(&[0x01], values[1].clone());
        assert_eq!(ordered_trie_root(values), expected.root());
    }
}
