//! Errors from parsing textual primitives

use thiserror::Error;

/// Failure to parse a hex blob or a numeric quantity, as found in JSON
/// allocations and chain configs
#[derive(Debug, Error)]
pub enum PrimitiveError {
    /// Malformed hex string
    #[error("invalid hex string: {0}")]
    Hex(String),

    /// Neither a `0x` hex quantity nor a decimal integer, or wider than 256 bits
    #[error("invalid quantity: {0}")]
    Quantity(String),
}
