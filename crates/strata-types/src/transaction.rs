//! Transaction types

use bytes::Bytes;
use strata_crypto::{keccak256, recover_address, CryptoError, Signature};
use strata_primitives::{Address, H256, U256};
use strata_rlp::{
    append_bytes, decode_with, write_bytes, write_raw, Encodable, RlpError, RlpItem, RlpStream,
};

/// Transaction type identifier (EIP-2718)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TxType {
    /// Legacy transaction (pre-EIP-2718)
    #[default]
    Legacy = 0,
    /// EIP-2930 access list transaction
    AccessList = 1,
    /// EIP-1559 dynamic fee transaction
    DynamicFee = 2,
}

impl TryFrom<u8> for TxType {
    type Error = RlpError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TxType::AccessList),
            2 => Ok(TxType::DynamicFee),
            other => Err(RlpError::Custom(format!(
                "unsupported transaction type 0x{other:02x}"
            ))),
        }
    }
}

/// Legacy transaction (Type 0)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTx {
    /// Transaction nonce
    pub nonce: u64,
    /// Gas price in wei
    pub gas_price: U256,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient address (None for contract creation)
    pub to: Option<Address>,
    /// Value to transfer in wei
    pub value: U256,
    /// Input data
    pub data: Bytes,
}

/// EIP-2930 access list transaction (Type 1)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessListTx {
    /// Chain ID
    pub chain_id: u64,
    /// Transaction nonce
    pub nonce: u64,
    /// Gas price in wei
    pub gas_price: U256,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient address (None for contract creation)
    pub to: Option<Address>,
    /// Value to transfer in wei
    pub value: U256,
    /// Input data
    pub data: Bytes,
    /// Access list
    pub access_list: Vec<AccessListItem>,
}

/// EIP-1559 dynamic fee transaction (Type 2)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicFeeTx {
    /// Chain ID
    pub chain_id: u64,
    /// Transaction nonce
    pub nonce: u64,
    /// Max priority fee per gas (tip)
    pub max_priority_fee_per_gas: U256,
    /// Max fee per gas
    pub max_fee_per_gas: U256,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient address (None for contract creation)
    pub to: Option<Address>,
    /// Value to transfer in wei
    pub value: U256,
    /// Input data
    pub data: Bytes,
    /// Access list
    pub access_list: Vec<AccessListItem>,
}

/// Access list item (address + storage keys)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessListItem {
    /// Account address
    pub address: Address,
    /// Storage keys
    pub storage_keys: Vec<H256>,
}

impl AccessListItem {
    fn decode_item(item: &RlpItem) -> Result<Self, RlpError> {
        let fields = item.as_list_of_len(2)?;
        Ok(Self {
            address: fields[0].as_address()?,
            storage_keys: fields[1]
                .as_list()?
                .iter()
                .map(RlpItem::as_h256)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl Encodable for AccessListItem {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.address);
        s.begin_list(self.storage_keys.len());
        for key in &self.storage_keys {
            s.append(key);
        }
    }
}

/// Signature components.
///
/// For legacy transactions `v` is 27/28 or `chain_id * 2 + 35/36` (EIP-155).
/// For typed transactions it is the y-parity, 0 or 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxSignature {
    /// Recovery value
    pub v: u64,
    /// R component
    pub r: U256,
    /// S component
    pub s: U256,
}

impl TxSignature {
    /// Create a new signature
    pub fn new(v: u64, r: U256, s: U256) -> Self {
        Self { v, r, s }
    }
}

/// Transaction body (unsigned)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionBody {
    /// Legacy transaction
    Legacy(LegacyTx),
    /// EIP-2930 transaction
    AccessList(AccessListTx),
    /// EIP-1559 transaction
    DynamicFee(DynamicFeeTx),
}

/// Signed transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Transaction body
    pub tx: TransactionBody,
    /// Signature
    pub signature: TxSignature,
}

fn append_to(s: &mut RlpStream, to: &Option<Address>) {
    match to {
        Some(address) => {
            s.append(address);
        }
        None => {
            s.append_empty_data();
        }
    }
}

fn append_access_list(s: &mut RlpStream, access_list: &[AccessListItem]) {
    s.begin_list(access_list.len());
    for item in access_list {
        s.append(item);
    }
}

fn decode_access_list(item: &RlpItem) -> Result<Vec<AccessListItem>, RlpError> {
    item.as_list()?
        .iter()
        .map(AccessListItem::decode_item)
        .collect()
}

impl TransactionBody {
    /// Number of unsigned fields
    fn field_count(&self) -> usize {
        match self {
            TransactionBody::Legacy(_) => 6,
            TransactionBody::AccessList(_) => 8,
            TransactionBody::DynamicFee(_) => 9,
        }
    }

    /// Append the unsigned fields (no list header)
    fn append_fields(&self, s: &mut RlpStream) {
        match self {
            TransactionBody::Legacy(tx) => {
                s.append(&tx.nonce);
                s.append(&tx.gas_price);
                s.append(&tx.gas_limit);
                append_to(s, &tx.to);
                s.append(&tx.value);
                append_bytes(s, &tx.data);
            }
            TransactionBody::AccessList(tx) => {
                s.append(&tx.chain_id);
                s.append(&tx.nonce);
                s.append(&tx.gas_price);
                s.append(&tx.gas_limit);
                append_to(s, &tx.to);
                s.append(&tx.value);
                append_bytes(s, &tx.data);
                append_access_list(s, &tx.access_list);
            }
            TransactionBody::DynamicFee(tx) => {
                s.append(&tx.chain_id);
                s.append(&tx.nonce);
                s.append(&tx.max_priority_fee_per_gas);
                s.append(&tx.max_fee_per_gas);
                s.append(&tx.gas_limit);
                append_to(s, &tx.to);
                s.append(&tx.value);
                append_bytes(s, &tx.data);
                append_access_list(s, &tx.access_list);
            }
        }
    }
}

impl SignedTransaction {
    /// Combine a body and its signature
    pub fn new(tx: TransactionBody, signature: TxSignature) -> Self {
        Self { tx, signature }
    }

    /// Transaction type
    pub fn tx_type(&self) -> TxType {
        match &self.tx {
            TransactionBody::Legacy(_) => TxType::Legacy,
            TransactionBody::AccessList(_) => TxType::AccessList,
            TransactionBody::DynamicFee(_) => TxType::DynamicFee,
        }
    }

    /// Get transaction nonce
    pub fn nonce(&self) -> u64 {
        match &self.tx {
            TransactionBody::Legacy(tx) => tx.nonce,
            TransactionBody::AccessList(tx) => tx.nonce,
            TransactionBody::DynamicFee(tx) => tx.nonce,
        }
    }

    /// Get gas limit
    pub fn gas_limit(&self) -> u64 {
        match &self.tx {
            TransactionBody::Legacy(tx) => tx.gas_limit,
            TransactionBody::AccessList(tx) => tx.gas_limit,
            TransactionBody::DynamicFee(tx) => tx.gas_limit,
        }
    }

    /// Get recipient address
    pub fn to(&self) -> Option<Address> {
        match &self.tx {
            TransactionBody::Legacy(tx) => tx.to,
            TransactionBody::AccessList(tx) => tx.to,
            TransactionBody::DynamicFee(tx) => tx.to,
        }
    }

    /// Get transfer value
    pub fn value(&self) -> U256 {
        match &self.tx {
            TransactionBody::Legacy(tx) => tx.value,
            TransactionBody::AccessList(tx) => tx.value,
            TransactionBody::DynamicFee(tx) => tx.value,
        }
    }

    /// Get input data
    pub fn data(&self) -> &Bytes {
        match &self.tx {
            TransactionBody::Legacy(tx) => &tx.data,
            TransactionBody::AccessList(tx) => &tx.data,
            TransactionBody::DynamicFee(tx) => &tx.data,
        }
    }

    /// Access list (empty for legacy transactions)
    pub fn access_list(&self) -> &[AccessListItem] {
        match &self.tx {
            TransactionBody::Legacy(_) => &[],
            TransactionBody::AccessList(tx) => &tx.access_list,
            TransactionBody::DynamicFee(tx) => &tx.access_list,
        }
    }

    /// Check if this is a contract creation transaction
    pub fn is_contract_creation(&self) -> bool {
        self.to().is_none()
    }

    /// Chain id this transaction is bound to, if any.
    ///
    /// Legacy transactions carry it inside `v` (EIP-155); pre-EIP-155 ones
    /// are valid on every chain.
    pub fn chain_id(&self) -> Option<u64> {
        match &self.tx {
            TransactionBody::Legacy(_) if self.signature.v >= 35 => {
                Some((self.signature.v - 35) / 2)
            }
            TransactionBody::Legacy(_) => None,
            TransactionBody::AccessList(tx) => Some(tx.chain_id),
            TransactionBody::DynamicFee(tx) => Some(tx.chain_id),
        }
    }

    /// Raw recovery id (0 or 1) encoded in `v`, or `None` if `v` is malformed
    pub fn recovery_id(&self) -> Option<u8> {
        let v = self.signature.v;
        match &self.tx {
            TransactionBody::Legacy(_) => match v {
                27 | 28 => Some((v - 27) as u8),
                v if v >= 35 => Some(((v - 35) % 2) as u8),
                _ => None,
            },
            _ if v <= 1 => Some(v as u8),
            _ => None,
        }
    }

    /// Highest price per gas the sender agreed to pay
    pub fn max_fee_per_gas(&self) -> U256 {
        match &self.tx {
            TransactionBody::Legacy(tx) => tx.gas_price,
            TransactionBody::AccessList(tx) => tx.gas_price,
            TransactionBody::DynamicFee(tx) => tx.max_fee_per_gas,
        }
    }

    /// Highest tip per gas for the block producer
    pub fn max_priority_fee_per_gas(&self) -> U256 {
        match &self.tx {
            TransactionBody::Legacy(tx) => tx.gas_price,
            TransactionBody::AccessList(tx) => tx.gas_price,
            TransactionBody::DynamicFee(tx) => tx.max_priority_fee_per_gas,
        }
    }

    /// Get effective gas price for the given base fee
    ///
    /// Returns `None` if `base_fee > max_fee_per_gas` for EIP-1559 transactions
    /// (transaction cannot be included in block with this base fee).
    pub fn effective_gas_price(&self, base_fee: Option<U256>) -> Option<U256> {
        match (&self.tx, base_fee) {
            (TransactionBody::DynamicFee(tx), Some(base_fee)) => {
                if base_fee > tx.max_fee_per_gas {
                    return None;
                }
                let priority_fee = tx
                    .max_priority_fee_per_gas
                    .min(tx.max_fee_per_gas - base_fee);
                Some(base_fee + priority_fee)
            }
            (TransactionBody::DynamicFee(tx), None) => Some(tx.max_fee_per_gas),
            _ => Some(self.max_fee_per_gas()),
        }
    }

    /// Hash the sender signed
    pub fn signing_hash(&self) -> H256 {
        let mut s = RlpStream::new();
        match &self.tx {
            TransactionBody::Legacy(_) => match self.chain_id() {
                Some(chain_id) => {
                    s.begin_list(9);
                    self.tx.append_fields(&mut s);
                    s.append(&chain_id);
                    s.append(&0u8);
                    s.append(&0u8);
                }
                None => {
                    s.begin_list(6);
                    self.tx.append_fields(&mut s);
                }
            },
            typed => {
                s.begin_list(typed.field_count());
                typed.append_fields(&mut s);
            }
        }

        let payload = s.out();
        match self.tx_type() {
            TxType::Legacy => keccak256(&payload),
            tx_type => {
                let mut prefixed = Vec::with_capacity(payload.len() + 1);
                prefixed.push(tx_type as u8);
                prefixed.extend_from_slice(&payload);
                keccak256(&prefixed)
            }
        }
    }

    /// Recover the sender address from the signature.
    ///
    /// Accepts any `s` below the curve order; the low-s rule is a fork rule
    /// enforced by the caller.
    pub fn recover_sender(&self) -> Result<Address, CryptoError> {
        let v = self
            .recovery_id()
            .ok_or(CryptoError::InvalidRecoveryId(self.signature.v.min(255) as u8))?;
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        self.signature.r.to_big_endian(&mut r);
        self.signature.s.to_big_endian(&mut s);
        recover_address(&self.signing_hash(), &Signature::new(r, s, v))
    }

    /// EIP-2718 envelope: the RLP list for legacy transactions,
    /// `type || rlp(payload)` for typed ones.
    pub fn encoded(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(self.tx.field_count() + 3);
        self.tx.append_fields(&mut s);
        s.append(&self.signature.v);
        s.append(&self.signature.r);
        s.append(&self.signature.s);
        let payload = s.out();

        match self.tx_type() {
            TxType::Legacy => payload.to_vec(),
            tx_type => {
                let mut out = Vec::with_capacity(payload.len() + 1);
                out.push(tx_type as u8);
                out.extend_from_slice(&payload);
                out
            }
        }
    }

    /// Transaction hash: keccak of the envelope
    pub fn hash(&self) -> H256 {
        keccak256(&self.encoded())
    }

    /// Decode an EIP-2718 envelope
    pub fn decode(data: &[u8]) -> Result<Self, RlpError> {
        match data.first() {
            None => Err(RlpError::UnexpectedEnd),
            Some(&first) if first >= 0xc0 => decode_with(data, Self::decode_legacy),
            Some(&first) => {
                let tx_type = TxType::try_from(first)?;
                decode_with(&data[1..], |item| Self::decode_typed(tx_type, item))
            }
        }
    }

    /// Convert an entry of a block's transaction list: a list for legacy
    /// transactions, a byte string holding the envelope for typed ones.
    pub fn decode_item(item: &RlpItem) -> Result<Self, RlpError> {
        match item {
            RlpItem::List(_) => Self::decode_legacy(item),
            RlpItem::Bytes(envelope) => match envelope.first() {
                Some(&first) if first < 0xc0 => Self::decode(envelope),
                _ => Err(RlpError::Custom(
                    "legacy transaction wrapped in a byte string".to_string(),
                )),
            },
        }
    }

    fn decode_legacy(item: &RlpItem) -> Result<Self, RlpError> {
        let f = item.as_list_of_len(9)?;
        Ok(Self {
            tx: TransactionBody::Legacy(LegacyTx {
                nonce: f[0].as_u64()?,
                gas_price: f[1].as_u256()?,
                gas_limit: f[2].as_u64()?,
                to: f[3].as_optional_address()?,
                value: f[4].as_u256()?,
                data: f[5].to_bytes()?,
            }),
            signature: TxSignature::new(f[6].as_u64()?, f[7].as_u256()?, f[8].as_u256()?),
        })
    }

    fn decode_typed(tx_type: TxType, item: &RlpItem) -> Result<Self, RlpError> {
        match tx_type {
            TxType::AccessList => {
                let f = item.as_list_of_len(11)?;
                Ok(Self {
                    tx: TransactionBody::AccessList(AccessListTx {
                        chain_id: f[0].as_u64()?,
                        nonce: f[1].as_u64()?,
                        gas_price: f[2].as_u256()?,
                        gas_limit: f[3].as_u64()?,
                        to: f[4].as_optional_address()?,
                        value: f[5].as_u256()?,
                        data: f[6].to_bytes()?,
                        access_list: decode_access_list(&f[7])?,
                    }),
                    signature: TxSignature::new(
                        f[8].as_u64()?,
                        f[9].as_u256()?,
                        f[10].as_u256()?,
                    ),
                })
            }
            TxType::DynamicFee => {
                let f = item.as_list_of_len(12)?;
                Ok(Self {
                    tx: TransactionBody::DynamicFee(DynamicFeeTx {
                        chain_id: f[0].as_u64()?,
                        nonce: f[1].as_u64()?,
                        max_priority_fee_per_gas: f[2].as_u256()?,
                        max_fee_per_gas: f[3].as_u256()?,
                        gas_limit: f[4].as_u64()?,
                        to: f[5].as_optional_address()?,
                        value: f[6].as_u256()?,
                        data: f[7].to_bytes()?,
                        access_list: decode_access_list(&f[8])?,
                    }),
                    signature: TxSignature::new(
                        f[9].as_u64()?,
                        f[10].as_u256()?,
                        f[11].as_u256()?,
                    ),
                })
            }
            TxType::Legacy => Self::decode_legacy(item),
        }
    }
}

/// Block-body encoding: legacy transactions inline, typed ones as a byte string
impl Encodable for SignedTransaction {
    fn rlp_append(&self, s: &mut RlpStream) {
        match self.tx_type() {
            TxType::Legacy => write_raw(s, &self.encoded()),
            _ => write_bytes(s, &self.encoded()),
        }
    }
}

impl Default for LegacyTx {
    fn default() -> Self {
        Self {
            nonce: 0,
            gas_price: U256::zero(),
            gas_limit: 21000,
            to: None,
            value: U256::zero(),
            data: Bytes::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_crypto::{sign, PrivateKey};
    use strata_primitives::decode_hex;

    // EIP-155 example transaction
    const EIP155_TX: &str = "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83";

    fn test_key() -> PrivateKey {
        let bytes =
            decode_hex("45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8").unwrap();
        PrivateKey::from_slice(&bytes).unwrap()
    }

    fn test_address() -> Address {
        Address::from_hex("0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b").unwrap()
    }

    fn signed(body: TransactionBody, legacy_chain_id: Option<u64>) -> SignedTransaction {
        let unsigned = SignedTransaction::new(
            body,
            TxSignature::new(legacy_chain_id.map_or(27, |id| id * 2 + 35), U256::zero(), U256::zero()),
        );
        let sig = sign(&unsigned.signing_hash(), &test_key()).unwrap();
        let v = match (unsigned.tx_type(), legacy_chain_id) {
            (TxType::Legacy, Some(id)) => id * 2 + 35 + sig.v as u64,
            (TxType::Legacy, None) => 27 + sig.v as u64,
            _ => sig.v as u64,
        };
        SignedTransaction::new(
            unsigned.tx,
            TxSignature::new(v, U256::from_big_endian(&sig.r), U256::from_big_endian(&sig.s)),
        )
    }

    // ==================== TxType tests ====================

    #[test]
    fn test_tx_type_values() {
        assert_eq!(TxType::Legacy as u8, 0);
        assert_eq!(TxType::AccessList as u8, 1);
        assert_eq!(TxType::DynamicFee as u8, 2);
        assert!(TxType::try_from(3).is_err());
    }

    // ==================== EIP-155 vector ====================

    #[test]
    fn test_eip155_vector() {
        let raw = decode_hex(EIP155_TX).unwrap();
        let tx = SignedTransaction::decode(&raw).unwrap();

        assert_eq!(tx.tx_type(), TxType::Legacy);
        assert_eq!(tx.nonce(), 9);
        assert_eq!(tx.chain_id(), Some(1));
        assert_eq!(tx.recovery_id(), Some(0));
        assert_eq!(
            tx.signing_hash().to_hex(),
            "0xdaf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
        assert_eq!(
            tx.recover_sender().unwrap(),
            Address::from_hex("0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f").unwrap()
        );
        assert_eq!(tx.encoded(), raw);
        assert_eq!(
            tx.hash().to_hex(),
            "0x33469b22e9f636356c4160a87eb19df52b7412e8eac32a4a55ffe88ea8350788"
        );
    }

    // ==================== Signing and recovery ====================

    #[test]
    fn test_pre_eip155_recovery() {
        let tx = signed(
            TransactionBody::Legacy(LegacyTx {
                to: Some(Address::from_bytes([0x11; 20])),
                value: U256::from(10),
                ..Default::default()
            }),
            None,
        );
        assert_eq!(tx.chain_id(), None);
        assert_eq!(tx.recover_sender().unwrap(), test_address());
    }

    #[test]
    fn test_legacy_with_calldata_recovery() {
        let tx = signed(
            TransactionBody::Legacy(LegacyTx {
                nonce: 7,
                gas_price: U256::from(1),
                gas_limit: 100_000,
                to: Some(Address::from_bytes([0x11; 20])),
                value: U256::zero(),
                data: Bytes::from_static(b"\xa9\x05\x9c\xbb transfer calldata"),
            }),
            Some(1),
        );
        assert_eq!(tx.chain_id(), Some(1));
        assert_eq!(tx.recover_sender().unwrap(), test_address());
        assert_eq!(SignedTransaction::decode(&tx.encoded()).unwrap(), tx);
    }

    #[test]
    fn test_dynamic_fee_envelope_and_recovery() {
        let tx = signed(
            TransactionBody::DynamicFee(DynamicFeeTx {
                chain_id: 1,
                nonce: 3,
                max_priority_fee_per_gas: U256::from(2),
                max_fee_per_gas: U256::from(100),
                gas_limit: 50_000,
                to: None,
                value: U256::zero(),
                data: Bytes::from_static(&[0x60, 0x00]),
                access_list: vec![AccessListItem {
                    address: Address::from_bytes([0x42; 20]),
                    storage_keys: vec![H256::from_bytes([0x01; 32])],
                }],
            }),
            None,
        );

        let envelope = tx.encoded();
        assert_eq!(envelope[0], 0x02);
        let decoded = SignedTransaction::decode(&envelope).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.recover_sender().unwrap(), test_address());

        // Inside a block the envelope is wrapped in a byte string
        let in_block = strata_rlp::encode(&tx);
        let item = RlpItem::decode(&in_block).unwrap();
        assert!(!item.is_list());
        assert_eq!(SignedTransaction::decode_item(&item).unwrap(), tx);
    }

    #[test]
    fn test_access_list_tx_recovery() {
        let tx = signed(
            TransactionBody::AccessList(AccessListTx {
                chain_id: 1,
                nonce: 0,
                gas_price: U256::from(10),
                gas_limit: 30_000,
                to: Some(Address::from_bytes([0x01; 20])),
                value: U256::zero(),
                data: Bytes::new(),
                access_list: vec![],
            }),
            None,
        );
        assert_eq!(tx.encoded()[0], 0x01);
        assert_eq!(tx.recover_sender().unwrap(), test_address());
    }

    #[test]
    fn test_malformed_v_has_no_recovery_id() {
        let tx = SignedTransaction::new(
            TransactionBody::Legacy(LegacyTx::default()),
            TxSignature::new(29, U256::one(), U256::one()),
        );
        assert_eq!(tx.recovery_id(), None);
        assert!(tx.recover_sender().is_err());
    }

    // ==================== Fees ====================

    #[test]
    fn test_effective_gas_price() {
        let tx = SignedTransaction::new(
            TransactionBody::DynamicFee(DynamicFeeTx {
                chain_id: 1,
                nonce: 0,
                max_priority_fee_per_gas: U256::from(5),
                max_fee_per_gas: U256::from(100),
                gas_limit: 21_000,
                to: None,
                value: U256::zero(),
                data: Bytes::new(),
                access_list: vec![],
            }),
            TxSignature::new(0, U256::one(), U256::one()),
        );
        assert_eq!(tx.effective_gas_price(Some(U256::from(50))), Some(U256::from(55)));
        assert_eq!(tx.effective_gas_price(Some(U256::from(98))), Some(U256::from(100)));
        assert_eq!(tx.effective_gas_price(Some(U256::from(101))), None);

        let legacy = SignedTransaction::new(
            TransactionBody::Legacy(LegacyTx {
                gas_price: U256::from(7),
                ..Default::default()
            }),
            TxSignature::new(27, U256::one(), U256::one()),
        );
        assert_eq!(legacy.effective_gas_price(Some(U256::from(3))), Some(U256::from(7)));
    }

    // ==================== Decoding errors ====================

    #[test]
    fn test_rejects_unknown_type_and_wrapped_legacy() {
        assert!(SignedTransaction::decode(&[0x03, 0xc0]).is_err());
        let raw = decode_hex(EIP155_TX).unwrap();
        let wrapped = RlpItem::Bytes(Bytes::from(raw));
        assert!(SignedTransaction::decode_item(&wrapped).is_err());
    }
}
