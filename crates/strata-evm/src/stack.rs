//! EVM stack and 256-bit word arithmetic

use crate::error::ExceptionalHalt;
use crate::gas::cost::MAX_STACK_SIZE;
use primitive_types::U512;
use strata_primitives::{Address, H256, U256};

/// EVM stack (max 1024 items, 256-bit each)
#[derive(Clone, Debug)]
pub struct Stack {
    data: Vec<U256>,
}

impl Stack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(32),
        }
    }

    /// Push a value onto the stack
    pub fn push(&mut self, value: U256) -> Result<(), ExceptionalHalt> {
        if self.data.len() >= MAX_STACK_SIZE {
            return Err(ExceptionalHalt::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Push a boolean as 0 or 1
    pub fn push_bool(&mut self, value: bool) -> Result<(), ExceptionalHalt> {
        self.push(if value { U256::one() } else { U256::zero() })
    }

    /// Push an address as a right-aligned word
    pub fn push_address(&mut self, address: &Address) -> Result<(), ExceptionalHalt> {
        self.push(address.to_word())
    }

    /// Pop a value from the stack
    pub fn pop(&mut self) -> Result<U256, ExceptionalHalt> {
        self.data.pop().ok_or(ExceptionalHalt::StackUnderflow)
    }

    /// Pop a word and take its low 160 bits as an address
    pub fn pop_address(&mut self) -> Result<Address, ExceptionalHalt> {
        self.pop().map(Address::from_word)
    }

    /// Pop a word as a 32-byte storage key or topic
    pub fn pop_h256(&mut self) -> Result<H256, ExceptionalHalt> {
        self.pop().map(H256::from_word)
    }

    /// Peek at a specific depth (0 = top)
    pub fn peek_at(&self, depth: usize) -> Result<&U256, ExceptionalHalt> {
        if depth >= self.data.len() {
            return Err(ExceptionalHalt::StackUnderflow);
        }
        Ok(&self.data[self.data.len() - 1 - depth])
    }

    /// Swap top with item at depth (1 = swap with second item)
    pub fn swap(&mut self, depth: usize) -> Result<(), ExceptionalHalt> {
        if depth == 0 || depth >= self.data.len() {
            return Err(ExceptionalHalt::StackUnderflow);
        }
        let len = self.data.len();
        self.data.swap(len - 1, len - 1 - depth);
        Ok(())
    }

    /// Duplicate item at depth to top (1 = dup top)
    pub fn dup(&mut self, depth: usize) -> Result<(), ExceptionalHalt> {
        if depth == 0 || depth > self.data.len() {
            return Err(ExceptionalHalt::StackUnderflow);
        }
        let value = self.data[self.data.len() - depth];
        self.push(value)
    }

    /// Get current stack size
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Signed arithmetic ====================

/// Check if a value is negative in two's complement
fn is_negative(v: &U256) -> bool {
    v.bit(255)
}

/// Two's complement negation: ~v + 1
fn twos_complement(v: U256) -> U256 {
    (!v).overflowing_add(U256::one()).0
}

fn abs(v: U256) -> U256 {
    if is_negative(&v) {
        twos_complement(v)
    } else {
        v
    }
}

/// Signed division, truncating toward zero; division by zero yields zero
pub fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let quotient = abs(a) / abs(b);
    if is_negative(&a) != is_negative(&b) {
        twos_complement(quotient)
    } else {
        quotient
    }
}

/// Signed modulo taking the sign of the dividend
pub fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let remainder = abs(a) % abs(b);
    if is_negative(&a) {
        twos_complement(remainder)
    } else {
        remainder
    }
}

/// Signed less than (two's complement)
pub fn slt(a: &U256, b: &U256) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

// ==================== Modular arithmetic ====================

fn narrow(v: U512) -> U256 {
    // Callers reduce modulo a 256-bit value first
    U256::try_from(v).unwrap_or_default()
}

/// (a + b) % n without overflow on the intermediate sum
pub fn addmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    narrow((U512::from(a) + U512::from(b)) % U512::from(n))
}

/// (a * b) % n with a 512-bit intermediate product
pub fn mulmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    narrow(a.full_mul(b) % U512::from(n))
}

/// base^exp mod 2^256
pub fn exp(base: U256, exponent: U256) -> U256 {
    base.overflowing_pow(exponent).0
}

// ==================== Byte and bit operations ====================

/// SIGNEXTEND: extend the sign bit of byte `b` (0 = least significant)
pub fn signextend(b: U256, x: U256) -> U256 {
    if b >= U256::from(31) {
        return x;
    }
    let bit = b.low_u32() as usize * 8 + 7;
    let mask = (U256::one() << bit) - U256::one();
    if x.bit(bit) {
        x | !mask
    } else {
        x & mask
    }
}

/// BYTE: byte `i` of `x` counting from the most significant
pub fn byte(i: U256, x: U256) -> U256 {
    if i >= U256::from(32) {
        return U256::zero();
    }
    U256::from(x.byte(31 - i.low_u32() as usize))
}

/// SHL: value << shift
pub fn shl(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        return U256::zero();
    }
    value << shift.low_u32() as usize
}

/// SHR: logical value >> shift
pub fn shr(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        return U256::zero();
    }
    value >> shift.low_u32() as usize
}

/// SAR: arithmetic value >> shift, preserving the sign
pub fn sar(shift: U256, value: U256) -> U256 {
    let negative = is_negative(&value);
    if shift >= U256::from(256) {
        return if negative { U256::MAX } else { U256::zero() };
    }
    let shift = shift.low_u32() as usize;
    let shifted = value >> shift;
    if negative && shift > 0 {
        shifted | (U256::MAX << (256 - shift))
    } else {
        shifted
    }
}

/// Word as usize, if it fits
pub fn to_usize(value: &U256) -> Option<usize> {
    if value.bits() > 64 {
        return None;
    }
    usize::try_from(value.low_u64()).ok()
}
