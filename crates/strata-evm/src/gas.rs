//! Gas cost calculations
//!
//! Prices that changed between forks live in
//! [`GasSchedule`](strata_forks::GasSchedule); this module holds the ones
//! that never did and the formulas combining them.

use crate::error::ExceptionalHalt;
use crate::opcode::Opcode;
use strata_forks::ForkRules;
use strata_primitives::U256;

/// Gas costs for EVM operations
pub mod cost {
    /// Zero gas
    pub const ZERO: u64 = 0;
    /// Jump dest gas
    pub const JUMPDEST: u64 = 1;
    /// Base gas
    pub const BASE: u64 = 2;
    /// Very low gas
    pub const VERYLOW: u64 = 3;
    /// Low gas
    pub const LOW: u64 = 5;
    /// Mid gas
    pub const MID: u64 = 8;
    /// High gas
    pub const HIGH: u64 = 10;

    /// Exp gas
    pub const EXP: u64 = 10;
    /// SHA3 base gas
    pub const SHA3: u64 = 30;
    /// SHA3 word gas
    pub const SHA3_WORD: u64 = 6;
    /// BLOCKHASH gas
    pub const BLOCKHASH: u64 = 20;

    /// Log gas
    pub const LOG: u64 = 375;
    /// Log topic gas
    pub const LOG_TOPIC: u64 = 375;
    /// Log data gas (per byte)
    pub const LOG_DATA: u64 = 8;

    /// Create gas
    pub const CREATE: u64 = 32000;
    /// Code deposit gas (per byte)
    pub const CODE_DEPOSIT: u64 = 200;
    /// Call value transfer gas
    pub const CALL_VALUE: u64 = 9000;
    /// Call or selfdestruct into a new account
    pub const NEW_ACCOUNT: u64 = 25000;
    /// Call stipend
    pub const CALL_STIPEND: u64 = 2300;

    /// Memory gas per word
    pub const MEMORY: u64 = 3;
    /// Copy gas per word
    pub const COPY: u64 = 3;

    /// Transaction gas
    pub const TX: u64 = 21000;
    /// Transaction data zero byte
    pub const TX_DATA_ZERO: u64 = 4;
    /// Access list address gas
    pub const ACCESS_LIST_ADDRESS: u64 = 2400;
    /// Access list storage key gas
    pub const ACCESS_LIST_STORAGE_KEY: u64 = 1900;

    /// ecrecover precompile
    pub const ECRECOVER: u64 = 3000;
    /// sha256 precompile base
    pub const SHA256: u64 = 60;
    /// sha256 precompile per word
    pub const SHA256_WORD: u64 = 12;
    /// ripemd160 precompile base
    pub const RIPEMD160: u64 = 600;
    /// ripemd160 precompile per word
    pub const RIPEMD160_WORD: u64 = 120;
    /// identity precompile base
    pub const IDENTITY: u64 = 15;
    /// identity precompile per word
    pub const IDENTITY_WORD: u64 = 3;
    /// blake2f precompile per round
    pub const BLAKE2_ROUND: u64 = 1;

    /// Max call depth
    pub const MAX_CALL_DEPTH: usize = 1024;
    /// Max stack size
    pub const MAX_STACK_SIZE: usize = 1024;
}

/// Fork-independent part of an opcode's cost. Opcodes priced by the
/// [`GasSchedule`](strata_forks::GasSchedule) or by access sets are charged
/// in their handlers and report zero here.
pub fn static_gas(opcode: Opcode) -> u64 {
    match opcode {
        Opcode::STOP | Opcode::RETURN | Opcode::REVERT | Opcode::INVALID => cost::ZERO,

        Opcode::ADDRESS | Opcode::ORIGIN | Opcode::CALLER | Opcode::CALLVALUE |
        Opcode::CALLDATASIZE | Opcode::CODESIZE | Opcode::GASPRICE |
        Opcode::COINBASE | Opcode::TIMESTAMP | Opcode::NUMBER |
        Opcode::DIFFICULTY | Opcode::GASLIMIT | Opcode::CHAINID |
        Opcode::RETURNDATASIZE | Opcode::POP | Opcode::PC |
        Opcode::MSIZE | Opcode::GAS | Opcode::BASEFEE => cost::BASE,

        Opcode::ADD | Opcode::SUB | Opcode::NOT | Opcode::LT | Opcode::GT |
        Opcode::SLT | Opcode::SGT | Opcode::EQ | Opcode::ISZERO |
        Opcode::AND | Opcode::OR | Opcode::XOR | Opcode::BYTE |
        Opcode::SHL | Opcode::SHR | Opcode::SAR |
        Opcode::CALLDATALOAD | Opcode::MLOAD | Opcode::MSTORE | Opcode::MSTORE8 |
        Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => cost::VERYLOW,

        Opcode::MUL | Opcode::DIV | Opcode::SDIV | Opcode::MOD |
        Opcode::SMOD | Opcode::SIGNEXTEND | Opcode::SELFBALANCE => cost::LOW,

        Opcode::ADDMOD | Opcode::MULMOD | Opcode::JUMP => cost::MID,

        Opcode::JUMPI => cost::HIGH,

        Opcode::JUMPDEST => cost::JUMPDEST,

        Opcode::EXP => cost::EXP,
        Opcode::KECCAK256 => cost::SHA3,
        Opcode::BLOCKHASH => cost::BLOCKHASH,
        Opcode::CREATE | Opcode::CREATE2 => cost::CREATE,

        Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
            cost::LOG + cost::LOG_TOPIC * opcode.log_topics() as u64
        }

        Opcode::BALANCE | Opcode::EXTCODESIZE | Opcode::EXTCODECOPY |
        Opcode::EXTCODEHASH | Opcode::SLOAD | Opcode::SSTORE |
        Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL |
        Opcode::STATICCALL | Opcode::SELFDESTRUCT => cost::ZERO,

        _ if opcode.is_push() || opcode.dup_depth() > 0 || opcode.swap_depth() > 0 => {
            cost::VERYLOW
        }
        _ => cost::ZERO,
    }
}

/// Number of 32-byte words covering `size` bytes
pub fn words(size: usize) -> u64 {
    size.div_ceil(32) as u64
}

/// Outcome of sizing memory for an access
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryExpansion {
    /// Gas for growing memory
    pub cost: u64,
    /// Memory size in bytes after growth (word aligned)
    pub new_size: usize,
}

fn memory_cost(words: u128) -> u128 {
    cost::MEMORY as u128 * words + words * words / 512
}

/// Cost of growing memory from `current_size` to cover every `(offset, size)`
/// extent. Zero-sized extents never grow memory, whatever their offset.
pub fn memory_expansion(
    current_size: usize,
    extents: &[(U256, U256)],
) -> Result<MemoryExpansion, ExceptionalHalt> {
    let mut new_size = current_size as u128;
    for (offset, size) in extents {
        if size.is_zero() {
            continue;
        }
        if offset.bits() > 64 || size.bits() > 64 {
            return Err(ExceptionalHalt::OutOfGas);
        }
        let end = offset.low_u64() as u128 + size.low_u64() as u128;
        new_size = new_size.max(end.div_ceil(32) * 32);
    }
    if new_size <= current_size as u128 {
        return Ok(MemoryExpansion {
            cost: 0,
            new_size: current_size,
        });
    }

    let cost = memory_cost(new_size / 32) - memory_cost((current_size as u128).div_ceil(32));
    let cost = u64::try_from(cost).map_err(|_| ExceptionalHalt::OutOfGas)?;
    let new_size = usize::try_from(new_size).map_err(|_| ExceptionalHalt::OutOfGas)?;
    Ok(MemoryExpansion { cost, new_size })
}

/// Per-word copy cost for the *COPY opcodes
pub fn copy_gas(size: usize) -> u64 {
    cost::COPY * words(size)
}

/// EXP: base plus a per-byte charge on the exponent's length
pub fn exp_gas(exponent: &U256, exp_byte: u64) -> u64 {
    let byte_size = exponent.bits().div_ceil(8) as u64;
    cost::EXP + exp_byte * byte_size
}

/// KECCAK256 cost excluding memory
pub fn sha3_gas(size: usize) -> u64 {
    cost::SHA3 + cost::SHA3_WORD * words(size)
}

/// LOGn cost excluding memory
pub fn log_gas(topics: usize, data_size: usize) -> u64 {
    cost::LOG + cost::LOG_TOPIC * topics as u64 + cost::LOG_DATA * data_size as u64
}

/// EIP-150: all but one 64th of the available gas
pub fn max_message_call_gas(gas: u64) -> u64 {
    gas - gas / 64
}

/// Gas charged for a CALL-family opcode and gas handed to the callee
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageCallGas {
    /// Charged to the caller, excluding memory
    pub cost: u64,
    /// Given to the callee, including any stipend
    pub stipend: u64,
}

/// Split the requested `gas` of a call between charge and forwarded gas.
///
/// Before EIP-150 the request is forwarded as is; afterwards it is capped at
/// all but one 64th of what remains once `memory_cost` and `extra_gas` are
/// paid.
pub fn message_call_gas(
    rules: &ForkRules,
    value: &U256,
    gas: U256,
    gas_left: u64,
    memory_cost: u64,
    extra_gas: u64,
) -> Result<MessageCallGas, ExceptionalHalt> {
    let stipend = if value.is_zero() { 0 } else { cost::CALL_STIPEND };
    let upfront = extra_gas.saturating_add(memory_cost);

    let gas = if rules.all_but_one_64th && gas_left >= upfront {
        let cap = max_message_call_gas(gas_left - upfront);
        if gas > U256::from(cap) {
            cap
        } else {
            gas.low_u64()
        }
    } else {
        if gas.bits() > 64 {
            return Err(ExceptionalHalt::OutOfGas);
        }
        gas.low_u64()
    };

    Ok(MessageCallGas {
        cost: gas.checked_add(extra_gas).ok_or(ExceptionalHalt::OutOfGas)?,
        stipend: gas + stipend,
    })
}
