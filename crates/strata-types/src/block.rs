//! Block types

use bytes::Bytes;
use strata_crypto::keccak256;
use strata_primitives::{Address, H256, U256};
use strata_rlp::{
    append_bytes, decode_with, encode, encode_list, write_bytes, Encodable, RlpError, RlpItem,
    RlpStream,
};
use strata_trie::ordered_trie_root;

use crate::transaction::SignedTransaction;

/// Block header
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockHeader {
    /// Parent block hash
    pub parent_hash: H256,
    /// keccak of the RLP list of ommer headers
    pub ommers_hash: H256,
    /// Beneficiary of fees and rewards
    pub coinbase: Address,
    /// State root after executing the block
    pub state_root: H256,
    /// Transactions trie root
    pub transactions_root: H256,
    /// Receipts trie root
    pub receipts_root: H256,
    /// Logs bloom filter
    pub logs_bloom: Bloom,
    /// Proof-of-work difficulty
    pub difficulty: U256,
    /// Block number (height)
    pub number: u64,
    /// Gas limit for the block
    pub gas_limit: u64,
    /// Gas used by all transactions
    pub gas_used: u64,
    /// Block timestamp (Unix seconds)
    pub timestamp: u64,
    /// Extra data, at most 32 bytes
    pub extra_data: Bytes,
    /// Proof-of-work mix hash
    pub mix_hash: H256,
    /// Proof-of-work nonce
    pub nonce: [u8; 8],
    /// Base fee per gas (EIP-1559, London onwards)
    pub base_fee_per_gas: Option<U256>,
}

/// Complete block: header, transactions and ommer headers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Block header
    pub header: BlockHeader,
    /// Transactions in execution order
    pub transactions: Vec<SignedTransaction>,
    /// Ommer (uncle) headers
    pub ommers: Vec<BlockHeader>,
}

/// Logs bloom filter (2048 bits = 256 bytes)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Bloom(pub [u8; 256]);

impl Default for Bloom {
    fn default() -> Self {
        Self([0u8; 256])
    }
}

impl std::fmt::Debug for Bloom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "Bloom(empty)")
        } else {
            write!(f, "Bloom({} bits)", self.0.iter().map(|b| b.count_ones()).sum::<u32>())
        }
    }
}

/// Bit positions set by `input`: three 11-bit values from the first six hash bytes
fn bloom_bits(input: &[u8]) -> [(usize, u8); 3] {
    let hash = keccak256(input);
    let hash_bytes = hash.as_bytes();
    let mut bits = [(0usize, 0u8); 3];
    for (i, bit) in bits.iter_mut().enumerate() {
        let bit_index =
            ((hash_bytes[i * 2] as usize) << 8 | hash_bytes[i * 2 + 1] as usize) & 0x7FF;
        *bit = (255 - bit_index / 8, 1 << (bit_index % 8));
    }
    bits
}

impl Bloom {
    /// Empty bloom filter
    pub const ZERO: Bloom = Bloom([0u8; 256]);

    /// Create bloom from bytes
    pub fn from_bytes(bytes: [u8; 256]) -> Self {
        Self(bytes)
    }

    /// Check if bloom filter is empty
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Add data to bloom filter
    pub fn accrue(&mut self, input: &[u8]) {
        for (byte_index, mask) in bloom_bits(input) {
            self.0[byte_index] |= mask;
        }
    }

    /// Check if bloom might contain the input
    pub fn contains(&self, input: &[u8]) -> bool {
        bloom_bits(input)
            .iter()
            .all(|&(byte_index, mask)| self.0[byte_index] & mask != 0)
    }

    /// Combine with another bloom filter (OR)
    pub fn accrue_bloom(&mut self, other: &Bloom) {
        for i in 0..256 {
            self.0[i] |= other.0[i];
        }
    }
}

impl Encodable for Bloom {
    fn rlp_append(&self, s: &mut RlpStream) {
        write_bytes(s, &self.0);
    }
}

/// Empty ommers hash (keccak256 of empty RLP list)
pub const EMPTY_OMMERS_HASH: H256 = H256::from_bytes([
    0x1d, 0xcc, 0x4d, 0xe8, 0xde, 0xc7, 0x5d, 0x7a,
    0xab, 0x85, 0xb5, 0x67, 0xb6, 0xcc, 0xd4, 0x1a,
    0xd3, 0x12, 0x45, 0x1b, 0x94, 0x8a, 0x74, 0x13,
    0xf0, 0xa1, 0x42, 0xfd, 0x40, 0xd4, 0x93, 0x47,
]);

/// keccak of the RLP list of `ommers`
pub fn compute_ommers_hash(ommers: &[BlockHeader]) -> H256 {
    keccak256(&encode_list(ommers))
}

impl BlockHeader {
    /// Number of RLP fields before London
    pub const LEGACY_FIELDS: usize = 15;

    /// Block hash: keccak of the RLP-encoded header
    pub fn hash(&self) -> H256 {
        keccak256(&encode(self))
    }

    /// Convert a decoded RLP item into a header
    pub fn decode_item(item: &RlpItem) -> Result<Self, RlpError> {
        let fields = item.as_list()?;
        if fields.len() != Self::LEGACY_FIELDS && fields.len() != Self::LEGACY_FIELDS + 1 {
            return Err(RlpError::ListLength {
                expected: Self::LEGACY_FIELDS,
                got: fields.len(),
            });
        }

        Ok(Self {
            parent_hash: fields[0].as_h256()?,
            ommers_hash: fields[1].as_h256()?,
            coinbase: fields[2].as_address()?,
            state_root: fields[3].as_h256()?,
            transactions_root: fields[4].as_h256()?,
            receipts_root: fields[5].as_h256()?,
            logs_bloom: Bloom(fields[6].as_fixed::<256>()?),
            difficulty: fields[7].as_u256()?,
            number: fields[8].as_u64()?,
            gas_limit: fields[9].as_u64()?,
            gas_used: fields[10].as_u64()?,
            timestamp: fields[11].as_u64()?,
            extra_data: fields[12].to_bytes()?,
            mix_hash: fields[13].as_h256()?,
            nonce: fields[14].as_fixed::<8>()?,
            base_fee_per_gas: fields.get(15).map(RlpItem::as_u256).transpose()?,
        })
    }

    /// Decode an RLP-encoded header
    pub fn decode(data: &[u8]) -> Result<Self, RlpError> {
        decode_with(data, Self::decode_item)
    }
}

impl Encodable for BlockHeader {
    fn rlp_append(&self, s: &mut RlpStream) {
        let fields = Self::LEGACY_FIELDS + usize::from(self.base_fee_per_gas.is_some());
        s.begin_list(fields);
        s.append(&self.parent_hash);
        s.append(&self.ommers_hash);
        s.append(&self.coinbase);
        s.append(&self.state_root);
        s.append(&self.transactions_root);
        s.append(&self.receipts_root);
        s.append(&self.logs_bloom);
        s.append(&self.difficulty);
        s.append(&self.number);
        s.append(&self.gas_limit);
        s.append(&self.gas_used);
        s.append(&self.timestamp);
        append_bytes(s, &self.extra_data);
        s.append(&self.mix_hash);
        append_bytes(s, &self.nonce);
        if let Some(base_fee) = &self.base_fee_per_gas {
            s.append(base_fee);
        }
    }
}

impl Block {
    /// Create a new block
    pub fn new(
        header: BlockHeader,
        transactions: Vec<SignedTransaction>,
        ommers: Vec<BlockHeader>,
    ) -> Self {
        Self {
            header,
            transactions,
            ommers,
        }
    }

    /// Get block number
    pub fn number(&self) -> u64 {
        self.header.number
    }

    /// Block hash
    pub fn hash(&self) -> H256 {
        self.header.hash()
    }

    /// Get transaction count
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Root of the transaction trie built from this block's transactions
    pub fn compute_transactions_root(&self) -> H256 {
        ordered_trie_root(self.transactions.iter().map(SignedTransaction::encoded))
    }

    /// keccak of the RLP list of this block's ommers
    pub fn compute_ommers_hash(&self) -> H256 {
        compute_ommers_hash(&self.ommers)
    }

    /// Convert a decoded RLP item into a block
    pub fn decode_item(item: &RlpItem) -> Result<Self, RlpError> {
        let fields = item.as_list_of_len(3)?;
        let header = BlockHeader::decode_item(&fields[0])?;
        let transactions = fields[1]
            .as_list()?
            .iter()
            .map(SignedTransaction::decode_item)
            .collect::<Result<Vec<_>, _>>()?;
        let ommers = fields[2]
            .as_list()?
            .iter()
            .map(BlockHeader::decode_item)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            header,
            transactions,
            ommers,
        })
    }

    /// Decode an RLP-encoded block
    pub fn decode(data: &[u8]) -> Result<Self, RlpError> {
        decode_with(data, Self::decode_item)
    }

    /// RLP encoding of the block
    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }
}

impl Encodable for Block {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.header);
        s.begin_list(self.transactions.len());
        for tx in &self.transactions {
            s.append(tx);
        }
        s.begin_list(self.ommers.len());
        for ommer in &self.ommers {
            s.append(ommer);
        }
    }
}
