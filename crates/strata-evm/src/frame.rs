//! Call frames

use crate::context::Message;
use crate::error::{ExceptionalHalt, FrameError};
use crate::gas;
use crate::memory::Memory;
use crate::opcode::Opcode;
use crate::stack::Stack;
use bytes::Bytes;
use std::collections::{BTreeSet, HashSet};
use strata_primitives::{Address, H256, U256};
use strata_types::Log;

/// Execution state of one message: the machine plus everything the frame
/// hands back to its parent when it finishes.
#[derive(Debug)]
pub struct Frame {
    /// Program counter
    pub pc: usize,
    /// Operand stack
    pub stack: Stack,
    /// Frame memory
    pub memory: Memory,
    /// Code being executed
    pub code: Bytes,
    /// Gas remaining
    pub gas_left: u64,
    /// The message this frame runs
    pub message: Message,
    /// RETURN / REVERT data
    pub output: Bytes,
    /// Output of the most recent sub-call
    pub return_data: Bytes,
    /// Logs emitted by this frame and its successful children
    pub logs: Vec<Log>,
    /// Refund counter; may go negative inside a frame
    pub refund_counter: i64,
    /// SELFDESTRUCTed accounts
    pub accounts_to_delete: BTreeSet<Address>,
    /// Accounts touched for EIP-161 clearing
    pub touched_accounts: BTreeSet<Address>,
    /// Warm addresses
    pub accessed_addresses: HashSet<Address>,
    /// Warm storage slots
    pub accessed_storage_keys: HashSet<(Address, H256)>,
    /// False once STOP, RETURN, SELFDESTRUCT or an error ends execution
    pub running: bool,
    /// Why the frame failed, if it did
    pub error: Option<FrameError>,
    jump_destinations: HashSet<usize>,
}

impl Frame {
    /// Fresh frame for `message`, taking over its access and deletion sets
    pub fn new(mut message: Message) -> Self {
        let accessed_addresses = std::mem::take(&mut message.accessed_addresses);
        let accessed_storage_keys = std::mem::take(&mut message.accessed_storage_keys);
        let accounts_to_delete = std::mem::take(&mut message.accounts_to_delete);
        let code = message.code.clone();
        Self {
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            jump_destinations: analyze_jump_destinations(&code),
            code,
            gas_left: message.gas,
            message,
            output: Bytes::new(),
            return_data: Bytes::new(),
            logs: Vec::new(),
            refund_counter: 0,
            accounts_to_delete,
            touched_accounts: BTreeSet::new(),
            accessed_addresses,
            accessed_storage_keys,
            running: true,
            error: None,
        }
    }

    /// Deduct `amount` gas
    pub fn charge(&mut self, amount: u64) -> Result<(), ExceptionalHalt> {
        if self.gas_left < amount {
            return Err(ExceptionalHalt::OutOfGas);
        }
        self.gas_left -= amount;
        Ok(())
    }

    /// Charge `extra` plus the cost of growing memory over `extents`, then
    /// grow it.
    pub fn charge_with_memory(
        &mut self,
        extra: u64,
        extents: &[(U256, U256)],
    ) -> Result<(), ExceptionalHalt> {
        let expansion = gas::memory_expansion(self.memory.size(), extents)?;
        self.charge(extra.saturating_add(expansion.cost))?;
        self.memory.resize(expansion.new_size);
        Ok(())
    }

    /// Read a memory region already sized by [`Frame::charge_with_memory`]
    pub fn memory_read(&self, offset: U256, size: U256) -> Vec<u8> {
        if size.is_zero() {
            return Vec::new();
        }
        self.memory
            .load_slice(offset.low_u64() as usize, size.low_u64() as usize)
    }

    /// Write into a memory region already sized by [`Frame::charge_with_memory`]
    pub fn memory_write(&mut self, offset: U256, data: &[u8]) {
        if !data.is_empty() {
            self.memory.store_slice(offset.low_u64() as usize, data);
        }
    }

    /// Whether `dest` is a JUMPDEST outside PUSH data
    pub fn is_valid_jump(&self, dest: usize) -> bool {
        self.jump_destinations.contains(&dest)
    }

    /// Record an exceptional halt: gas and output are forfeited.
    pub fn halt(&mut self, halt: ExceptionalHalt) {
        self.gas_left = 0;
        self.output = Bytes::new();
        self.running = false;
        self.error = Some(FrameError::Halt(halt));
    }

    /// Whether the frame finished without error
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Positions of JUMPDEST bytes that are opcodes rather than PUSH data
fn analyze_jump_destinations(code: &[u8]) -> HashSet<usize> {
    let mut dests = HashSet::new();
    let mut i = 0;

    while i < code.len() {
        let byte = code[i];
        if byte == Opcode::JUMPDEST as u8 {
            dests.insert(i);
        }
        if (0x60..=0x7F).contains(&byte) {
            i += (byte - 0x5F) as usize;
        }
        i += 1;
    }

    dests
}

/// What a finished top-level message leaves for the transaction processor
#[derive(Clone, Debug, Default)]
pub struct MessageCallOutput {
    /// Gas not consumed
    pub gas_left: u64,
    /// Accumulated refund, clamped at zero
    pub refund_counter: u64,
    /// Logs of a successful execution
    pub logs: Vec<Log>,
    /// Accounts to delete at the end of the transaction
    pub accounts_to_delete: BTreeSet<Address>,
    /// Touched accounts subject to EIP-161 clearing
    pub touched_accounts: BTreeSet<Address>,
    /// Return or revert data
    pub output: Bytes,
    /// Why execution failed, if it did
    pub error: Option<FrameError>,
}

impl MessageCallOutput {
    /// Whether the message executed successfully
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
