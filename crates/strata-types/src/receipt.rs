//! Transaction receipt types

use bytes::Bytes;
use strata_primitives::{Address, H256};
use strata_rlp::{append_bytes, decode_with, Encodable, RlpError, RlpItem, RlpStream};

use crate::block::Bloom;
use crate::transaction::TxType;

/// Transaction execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Transaction failed
    Failure = 0,
    /// Transaction succeeded
    Success = 1,
}

impl From<bool> for TxStatus {
    fn from(success: bool) -> Self {
        if success {
            TxStatus::Success
        } else {
            TxStatus::Failure
        }
    }
}

impl From<TxStatus> for bool {
    fn from(status: TxStatus) -> Self {
        match status {
            TxStatus::Success => true,
            TxStatus::Failure => false,
        }
    }
}

/// First receipt field: the intermediate state root before Byzantium,
/// a status code afterwards (EIP-658).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiptOutcome {
    /// State root after the transaction
    StateRoot(H256),
    /// Execution status
    Status(TxStatus),
}

/// Log entry emitted during transaction execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    /// Contract address that emitted the log
    pub address: Address,
    /// Log topics (indexed parameters)
    pub topics: Vec<H256>,
    /// Log data (non-indexed parameters)
    pub data: Bytes,
}

impl Log {
    /// Create a new log entry
    pub fn new(address: Address, topics: Vec<H256>, data: Bytes) -> Self {
        Self {
            address,
            topics,
            data,
        }
    }

    /// Get the first topic (usually the event signature)
    pub fn topic0(&self) -> Option<&H256> {
        self.topics.first()
    }

    /// Create bloom filter for this log
    pub fn bloom(&self) -> Bloom {
        let mut bloom = Bloom::default();
        bloom.accrue(self.address.as_bytes());
        for topic in &self.topics {
            bloom.accrue(topic.as_bytes());
        }
        bloom
    }

    /// Convert a decoded RLP item into a log
    pub fn decode_item(item: &RlpItem) -> Result<Self, RlpError> {
        let fields = item.as_list_of_len(3)?;
        Ok(Self {
            address: fields[0].as_address()?,
            topics: fields[1]
                .as_list()?
                .iter()
                .map(RlpItem::as_h256)
                .collect::<Result<Vec<_>, _>>()?,
            data: fields[2].to_bytes()?,
        })
    }
}

impl Encodable for Log {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.address);
        s.begin_list(self.topics.len());
        for topic in &self.topics {
            s.append(topic);
        }
        append_bytes(s, &self.data);
    }
}

/// Bloom of every log in `logs`
pub fn logs_bloom<'a>(logs: impl IntoIterator<Item = &'a Log>) -> Bloom {
    let mut bloom = Bloom::default();
    for log in logs {
        bloom.accrue_bloom(&log.bloom());
    }
    bloom
}

/// Transaction receipt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Type of the transaction this receipt belongs to
    pub tx_type: TxType,
    /// Status code or intermediate state root
    pub outcome: ReceiptOutcome,
    /// Cumulative gas used in the block up to this transaction
    pub cumulative_gas_used: u64,
    /// Bloom filter for the logs
    pub logs_bloom: Bloom,
    /// Logs emitted by this transaction
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Create a new receipt
    pub fn new(
        tx_type: TxType,
        outcome: ReceiptOutcome,
        cumulative_gas_used: u64,
        logs: Vec<Log>,
    ) -> Self {
        Self {
            tx_type,
            outcome,
            cumulative_gas_used,
            logs_bloom: logs_bloom(&logs),
            logs,
        }
    }

    /// Check if transaction succeeded. Pre-Byzantium receipts carry no status.
    pub fn is_success(&self) -> Option<bool> {
        match self.outcome {
            ReceiptOutcome::Status(status) => Some(status.into()),
            ReceiptOutcome::StateRoot(_) => None,
        }
    }

    /// Get number of logs
    pub fn log_count(&self) -> usize {
        self.logs.len()
    }

    /// Trie value: the RLP list, prefixed with the type byte for typed transactions
    pub fn encoded(&self) -> Vec<u8> {
        let payload = strata_rlp::encode(self);
        match self.tx_type {
            TxType::Legacy => payload,
            tx_type => {
                let mut out = Vec::with_capacity(payload.len() + 1);
                out.push(tx_type as u8);
                out.extend_from_slice(&payload);
                out
            }
        }
    }

    /// Decode a receipt trie value
    pub fn decode(data: &[u8]) -> Result<Self, RlpError> {
        match data.first() {
            None => Err(RlpError::UnexpectedEnd),
            Some(&first) if first >= 0xc0 => {
                decode_with(data, |item| Self::decode_payload(TxType::Legacy, item))
            }
            Some(&first) => {
                let tx_type = TxType::try_from(first)?;
                decode_with(&data[1..], |item| Self::decode_payload(tx_type, item))
            }
        }
    }

    fn decode_payload(tx_type: TxType, item: &RlpItem) -> Result<Self, RlpError> {
        let fields = item.as_list_of_len(4)?;
        let status = fields[0].as_bytes()?;
        let outcome = match status {
            [] => ReceiptOutcome::Status(TxStatus::Failure),
            [1] => ReceiptOutcome::Status(TxStatus::Success),
            _ => ReceiptOutcome::StateRoot(fields[0].as_h256()?),
        };
        Ok(Self {
            tx_type,
            outcome,
            cumulative_gas_used: fields[1].as_u64()?,
            logs_bloom: Bloom(fields[2].as_fixed::<256>()?),
            logs: fields[3]
                .as_list()?
                .iter()
                .map(Log::decode_item)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

/// RLP list without the type prefix
impl Encodable for Receipt {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        match self.outcome {
            ReceiptOutcome::StateRoot(root) => {
                s.append(&root);
            }
            ReceiptOutcome::Status(TxStatus::Success) => {
                s.append(&1u8);
            }
            ReceiptOutcome::Status(TxStatus::Failure) => {
                s.append_empty_data();
            }
        }
        s.append(&self.cumulative_gas_used);
        s.append(&self.logs_bloom);
        s.begin_list(self.logs.len());
        for log in &self.logs {
            s.append(log);
        }
    }
}
