//! Untyped RLP tree and schema conversions

use crate::RlpError;
use bytes::Bytes;
use rlp::{Encodable, RlpStream};
use strata_primitives::{Address, H256, U256};

/// A decoded RLP value before any schema is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    /// Byte string
    Bytes(Bytes),
    /// List of items
    List(Vec<RlpItem>),
}

/// Header of the next item: (is_list, header length, payload length)
fn read_header(data: &[u8]) -> Result<(bool, usize, usize), RlpError> {
    let first = *data.first().ok_or(RlpError::UnexpectedEnd)?;
    match first {
        0x00..=0x7f => Ok((false, 0, 1)),
        0x80..=0xb7 => {
            let len = (first - 0x80) as usize;
            if len == 1 {
                let byte = *data.get(1).ok_or(RlpError::UnexpectedEnd)?;
                if byte < 0x80 {
                    return Err(RlpError::NonCanonicalSingleByte);
                }
            }
            Ok((false, 1, len))
        }
        0xb8..=0xbf => {
            let len_of_len = (first - 0xb7) as usize;
            let len = read_long_length(&data[1..], len_of_len)?;
            Ok((false, 1 + len_of_len, len))
        }
        0xc0..=0xf7 => Ok((true, 1, (first - 0xc0) as usize)),
        0xf8..=0xff => {
            let len_of_len = (first - 0xf7) as usize;
            let len = read_long_length(&data[1..], len_of_len)?;
            Ok((true, 1 + len_of_len, len))
        }
    }
}

fn read_long_length(data: &[u8], len_of_len: usize) -> Result<usize, RlpError> {
    let bytes = data.get(..len_of_len).ok_or(RlpError::UnexpectedEnd)?;
    if bytes[0] == 0 {
        return Err(RlpError::NonCanonicalLength);
    }
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(RlpError::UnexpectedEnd);
    }
    let len = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
    if len < 56 {
        return Err(RlpError::NonCanonicalLength);
    }
    Ok(len)
}

impl RlpItem {
    /// Decode exactly one item spanning all of `data`.
    pub fn decode(data: &[u8]) -> Result<Self, RlpError> {
        let (item, consumed) = Self::decode_prefix(data)?;
        if consumed != data.len() {
            return Err(RlpError::TrailingBytes(data.len() - consumed));
        }
        Ok(item)
    }

    /// Decode the first item of `data`, returning it and the bytes consumed.
    pub fn decode_prefix(data: &[u8]) -> Result<(Self, usize), RlpError> {
        let (is_list, header_len, payload_len) = read_header(data)?;
        let end = header_len
            .checked_add(payload_len)
            .ok_or(RlpError::UnexpectedEnd)?;
        let payload = data.get(header_len..end).ok_or(RlpError::UnexpectedEnd)?;

        if !is_list {
            return Ok((RlpItem::Bytes(Bytes::copy_from_slice(payload)), end));
        }

        let mut items = Vec::new();
        let mut offset = 0;
        while offset < payload.len() {
            let (item, used) = Self::decode_prefix(&payload[offset..])?;
            items.push(item);
            offset += used;
        }
        Ok((RlpItem::List(items), end))
    }

    /// Whether this is a list
    pub fn is_list(&self) -> bool {
        matches!(self, RlpItem::List(_))
    }

    /// Byte-string payload
    pub fn as_bytes(&self) -> Result<&[u8], RlpError> {
        match self {
            RlpItem::Bytes(b) => Ok(b),
            RlpItem::List(_) => Err(RlpError::ExpectedBytes),
        }
    }

    /// Byte-string payload as owned `Bytes`
    pub fn to_bytes(&self) -> Result<Bytes, RlpError> {
        match self {
            RlpItem::Bytes(b) => Ok(b.clone()),
            RlpItem::List(_) => Err(RlpError::ExpectedBytes),
        }
    }

    /// List items
    pub fn as_list(&self) -> Result<&[RlpItem], RlpError> {
        match self {
            RlpItem::List(items) => Ok(items),
            RlpItem::Bytes(_) => Err(RlpError::ExpectedList),
        }
    }

    /// List items, requiring exactly `len` of them
    pub fn as_list_of_len(&self, len: usize) -> Result<&[RlpItem], RlpError> {
        let items = self.as_list()?;
        if items.len() != len {
            return Err(RlpError::ListLength {
                expected: len,
                got: items.len(),
            });
        }
        Ok(items)
    }

    /// Minimal big-endian integer payload, at most `max_len` bytes
    fn integer_bytes(&self, max_len: usize) -> Result<&[u8], RlpError> {
        let bytes = self.as_bytes()?;
        if bytes.first() == Some(&0) {
            return Err(RlpError::LeadingZero);
        }
        if bytes.len() > max_len {
            return Err(RlpError::IntegerOverflow(bytes.len()));
        }
        Ok(bytes)
    }

    /// Scalar as `u64`
    pub fn as_u64(&self) -> Result<u64, RlpError> {
        let bytes = self.integer_bytes(8)?;
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    /// Scalar as `U256`
    pub fn as_u256(&self) -> Result<U256, RlpError> {
        let bytes = self.integer_bytes(32)?;
        Ok(U256::from_big_endian(bytes))
    }

    /// Exactly `N` bytes
    pub fn as_fixed<const N: usize>(&self) -> Result<[u8; N], RlpError> {
        let bytes = self.as_bytes()?;
        if bytes.len() != N {
            return Err(RlpError::FixedLength {
                expected: N,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// 20-byte address
    pub fn as_address(&self) -> Result<Address, RlpError> {
        self.as_fixed::<20>().map(Address::from_bytes)
    }

    /// 32-byte hash
    pub fn as_h256(&self) -> Result<H256, RlpError> {
        self.as_fixed::<32>().map(H256::from_bytes)
    }

    /// Empty string for `None`, 20-byte address otherwise (transaction `to`)
    pub fn as_optional_address(&self) -> Result<Option<Address>, RlpError> {
        if self.as_bytes()?.is_empty() {
            return Ok(None);
        }
        self.as_address().map(Some)
    }
}

impl Encodable for RlpItem {
    fn rlp_append(&self, s: &mut RlpStream) {
        match self {
            RlpItem::Bytes(b) => {
                crate::write_bytes(s, b);
            }
            RlpItem::List(items) => {
                s.begin_list(items.len());
                for item in items {
                    s.append(item);
                }
            }
        }
    }
}
