//! Opcodes defined up to London

use std::fmt;

macro_rules! opcodes {
    ($($byte:literal => $name:ident,)*) => {
        /// An EVM instruction. Availability per fork is decided by `ForkRules`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        #[allow(missing_docs, clippy::upper_case_acronyms)]
        pub enum Opcode {
            $($name = $byte,)*
        }

        const OPCODES: [Option<Opcode>; 256] = {
            let mut table = [None; 256];
            $(table[$byte] = Some(Opcode::$name);)*
            table
        };

        impl Opcode {
            /// Mnemonic
            pub const fn name(self) -> &'static str {
                match self {
                    $(Opcode::$name => stringify!($name),)*
                }
            }
        }
    };
}

opcodes! {
    // arithmetic
    0x00 => STOP, 0x01 => ADD, 0x02 => MUL, 0x03 => SUB, 0x04 => DIV, 0x05 => SDIV, 0x06 => MOD,
    0x07 => SMOD, 0x08 => ADDMOD, 0x09 => MULMOD, 0x0a => EXP, 0x0b => SIGNEXTEND,
    // comparison and bitwise
    0x10 => LT, 0x11 => GT, 0x12 => SLT, 0x13 => SGT, 0x14 => EQ, 0x15 => ISZERO, 0x16 => AND,
    0x17 => OR, 0x18 => XOR, 0x19 => NOT, 0x1a => BYTE, 0x1b => SHL, 0x1c => SHR, 0x1d => SAR,
    // hashing
    0x20 => KECCAK256,
    // environment
    0x30 => ADDRESS, 0x31 => BALANCE, 0x32 => ORIGIN, 0x33 => CALLER, 0x34 => CALLVALUE,
    0x35 => CALLDATALOAD, 0x36 => CALLDATASIZE, 0x37 => CALLDATACOPY, 0x38 => CODESIZE,
    0x39 => CODECOPY, 0x3a => GASPRICE, 0x3b => EXTCODESIZE, 0x3c => EXTCODECOPY,
    0x3d => RETURNDATASIZE, 0x3e => RETURNDATACOPY, 0x3f => EXTCODEHASH,
    // block
    0x40 => BLOCKHASH, 0x41 => COINBASE, 0x42 => TIMESTAMP, 0x43 => NUMBER, 0x44 => DIFFICULTY,
    0x45 => GASLIMIT, 0x46 => CHAINID, 0x47 => SELFBALANCE, 0x48 => BASEFEE,
    // stack, memory, storage and flow
    0x50 => POP, 0x51 => MLOAD, 0x52 => MSTORE, 0x53 => MSTORE8, 0x54 => SLOAD, 0x55 => SSTORE,
    0x56 => JUMP, 0x57 => JUMPI, 0x58 => PC, 0x59 => MSIZE, 0x5a => GAS, 0x5b => JUMPDEST,
    // push
    0x60 => PUSH1, 0x61 => PUSH2, 0x62 => PUSH3, 0x63 => PUSH4, 0x64 => PUSH5, 0x65 => PUSH6,
    0x66 => PUSH7, 0x67 => PUSH8, 0x68 => PUSH9, 0x69 => PUSH10, 0x6a => PUSH11, 0x6b => PUSH12,
    0x6c => PUSH13, 0x6d => PUSH14, 0x6e => PUSH15, 0x6f => PUSH16, 0x70 => PUSH17,
    0x71 => PUSH18, 0x72 => PUSH19, 0x73 => PUSH20, 0x74 => PUSH21, 0x75 => PUSH22,
    0x76 => PUSH23, 0x77 => PUSH24, 0x78 => PUSH25, 0x79 => PUSH26, 0x7a => PUSH27,
    0x7b => PUSH28, 0x7c => PUSH29, 0x7d => PUSH30, 0x7e => PUSH31, 0x7f => PUSH32,
    // dup
    0x80 => DUP1, 0x81 => DUP2, 0x82 => DUP3, 0x83 => DUP4, 0x84 => DUP5, 0x85 => DUP6,
    0x86 => DUP7, 0x87 => DUP8, 0x88 => DUP9, 0x89 => DUP10, 0x8a => DUP11, 0x8b => DUP12,
    0x8c => DUP13, 0x8d => DUP14, 0x8e => DUP15, 0x8f => DUP16,
    // swap
    0x90 => SWAP1, 0x91 => SWAP2, 0x92 => SWAP3, 0x93 => SWAP4, 0x94 => SWAP5, 0x95 => SWAP6,
    0x96 => SWAP7, 0x97 => SWAP8, 0x98 => SWAP9, 0x99 => SWAP10, 0x9a => SWAP11, 0x9b => SWAP12,
    0x9c => SWAP13, 0x9d => SWAP14, 0x9e => SWAP15, 0x9f => SWAP16,
    // logging
    0xa0 => LOG0, 0xa1 => LOG1, 0xa2 => LOG2, 0xa3 => LOG3, 0xa4 => LOG4,
    // system
    0xf0 => CREATE, 0xf1 => CALL, 0xf2 => CALLCODE, 0xf3 => RETURN, 0xf4 => DELEGATECALL,
    0xf5 => CREATE2, 0xfa => STATICCALL, 0xfd => REVERT, 0xfe => INVALID, 0xff => SELFDESTRUCT,
}

impl Opcode {
    /// Decode a byte; `None` for bytes with no instruction up to London
    pub const fn from_byte(byte: u8) -> Option<Self> {
        OPCODES[byte as usize]
    }

    /// Immediate bytes following a PUSH1..PUSH32, 0 otherwise
    pub fn push_size(self) -> usize {
        match self as u8 {
            byte @ 0x60..=0x7f => usize::from(byte - 0x5f),
            _ => 0,
        }
    }

    /// Whether this is PUSH1..PUSH32
    pub fn is_push(self) -> bool {
        self.push_size() != 0
    }

    /// Stack item duplicated by DUPn, 0 otherwise
    pub fn dup_depth(self) -> usize {
        match self as u8 {
            byte @ 0x80..=0x8f => usize::from(byte - 0x7f),
            _ => 0,
        }
    }

    /// Stack item exchanged with the top by SWAPn, 0 otherwise
    pub fn swap_depth(self) -> usize {
        match self as u8 {
            byte @ 0x90..=0x9f => usize::from(byte - 0x8f),
            _ => 0,
        }
    }

    /// Topic count of LOGn, 0 otherwise
    pub fn log_topics(self) -> usize {
        match self as u8 {
            byte @ 0xa0..=0xa4 => usize::from(byte - 0xa0),
            _ => 0,
        }
    }

    /// Whether the opcode may modify state, and so is forbidden in a static
    /// context. CALL is checked separately since only a non-zero value writes.
    pub fn is_state_modifying(self) -> bool {
        matches!(
            self,
            Opcode::SSTORE
                | Opcode::LOG0
                | Opcode::LOG1
                | Opcode::LOG2
                | Opcode::LOG3
                | Opcode::LOG4
                | Opcode::CREATE
                | Opcode::CREATE2
                | Opcode::SELFDESTRUCT
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Decoding ====================

    #[test]
    fn test_every_defined_byte_roundtrips() {
        let defined: Vec<Opcode> = (0..=255u8).filter_map(Opcode::from_byte).collect();
        assert_eq!(defined.len(), 143);
        for opcode in defined {
            assert_eq!(Opcode::from_byte(opcode as u8), Some(opcode));
        }
    }

    #[test]
    fn test_post_london_bytes_are_undefined() {
        // transient storage, MCOPY and PUSH0
        for byte in 0x5c..=0x5fu8 {
            assert_eq!(Opcode::from_byte(byte), None);
        }
        assert_eq!(Opcode::from_byte(0x49), None);
        assert_eq!(Opcode::from_byte(0x21), None);
        assert_eq!(Opcode::from_byte(0xa5), None);
        assert_eq!(Opcode::from_byte(0xf6), None);
        assert_eq!(Opcode::from_byte(0xfb), None);
    }

    #[test]
    fn test_selected_encodings() {
        assert_eq!(Opcode::from_byte(0x20), Some(Opcode::KECCAK256));
        assert_eq!(Opcode::from_byte(0x44), Some(Opcode::DIFFICULTY));
        assert_eq!(Opcode::from_byte(0x47), Some(Opcode::SELFBALANCE));
        assert_eq!(Opcode::from_byte(0x48), Some(Opcode::BASEFEE));
        assert_eq!(Opcode::from_byte(0xfa), Some(Opcode::STATICCALL));
        assert_eq!(Opcode::from_byte(0xfe), Some(Opcode::INVALID));
    }

    #[test]
    fn test_names() {
        assert_eq!(Opcode::PUSH32.name(), "PUSH32");
        assert_eq!(Opcode::SWAP16.to_string(), "SWAP16");
        assert_eq!(format!("{}", Opcode::SELFDESTRUCT), "SELFDESTRUCT");
    }

    // ==================== Operand families ====================

    #[test]
    fn test_push_sizes() {
        for (i, byte) in (0x60..=0x7fu8).enumerate() {
            let opcode = Opcode::from_byte(byte).unwrap();
            assert!(opcode.is_push());
            assert_eq!(opcode.push_size(), i + 1);
        }
        assert!(!Opcode::JUMPDEST.is_push());
        assert_eq!(Opcode::DUP1.push_size(), 0);
    }

    #[test]
    fn test_dup_swap_depths() {
        for i in 0..16u8 {
            let dup = Opcode::from_byte(0x80 + i).unwrap();
            let swap = Opcode::from_byte(0x90 + i).unwrap();
            assert_eq!(dup.dup_depth(), usize::from(i) + 1);
            assert_eq!(swap.swap_depth(), usize::from(i) + 1);
            assert_eq!(dup.swap_depth(), 0);
            assert_eq!(swap.dup_depth(), 0);
        }
        assert_eq!(Opcode::PUSH32.dup_depth(), 0);
    }

    #[test]
    fn test_log_topics() {
        assert_eq!(Opcode::LOG0.log_topics(), 0);
        assert_eq!(Opcode::LOG4.log_topics(), 4);
        assert_eq!(Opcode::SSTORE.log_topics(), 0);
    }

    #[test]
    fn test_state_modifying() {
        assert!(Opcode::SSTORE.is_state_modifying());
        assert!(Opcode::LOG2.is_state_modifying());
        assert!(Opcode::CREATE2.is_state_modifying());
        assert!(Opcode::SELFDESTRUCT.is_state_modifying());
        assert!(!Opcode::CALL.is_state_modifying());
        assert!(!Opcode::SLOAD.is_state_modifying());
    }
}
