//! RLP decoding errors

use thiserror::Error;

/// RLP decoding / schema error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RlpError {
    /// Input ended before the announced payload
    #[error("unexpected end of input")]
    UnexpectedEnd,

    /// Bytes left after the top-level item
    #[error("{0} trailing bytes after rlp item")]
    TrailingBytes(usize),

    /// A single byte below 0x80 was wrapped in a string header
    #[error("non-canonical single byte encoding")]
    NonCanonicalSingleByte,

    /// Long-form length used for a short payload, or length with leading zeros
    #[error("non-canonical length prefix")]
    NonCanonicalLength,

    /// Integer with leading zero bytes
    #[error("integer has leading zero bytes")]
    LeadingZero,

    /// Integer does not fit the target width
    #[error("integer overflow: {0} bytes")]
    IntegerOverflow(usize),

    /// Expected a byte string, found a list
    #[error("expected byte string, found list")]
    ExpectedBytes,

    /// Expected a list, found a byte string
    #[error("expected list, found byte string")]
    ExpectedList,

    /// List has the wrong number of items
    #[error("expected list of {expected} items, got {got}")]
    ListLength {
        /// Items required by the schema
        expected: usize,
        /// Items present
        got: usize,
    },

    /// Fixed-width field has the wrong length
    #[error("expected {expected} bytes, got {got}")]
    FixedLength {
        /// Width required by the schema
        expected: usize,
        /// Width present
        got: usize,
    },

    /// Record-specific schema violation
    #[error("{0}")]
    Custom(String),
}
