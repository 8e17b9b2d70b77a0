//! Opcode handlers other than calls and creations

use crate::error::{ExceptionalHalt, VmError, VmResult};
use crate::frame::Frame;
use crate::gas::{self, cost};
use crate::interpreter::Evm;
use crate::memory::buffer_read;
use crate::opcode::Opcode;
use crate::stack::{self, to_usize};
use bytes::Bytes;
use strata_crypto::keccak256;
use strata_primitives::{Address, U256};
use strata_types::Log;

fn bool_word(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

fn unary(frame: &mut Frame, f: impl FnOnce(U256) -> U256) -> VmResult<()> {
    let a = frame.stack.pop()?;
    frame.stack.push(f(a))?;
    Ok(())
}

fn binary(frame: &mut Frame, f: impl FnOnce(U256, U256) -> U256) -> VmResult<()> {
    let a = frame.stack.pop()?;
    let b = frame.stack.pop()?;
    frame.stack.push(f(a, b))?;
    Ok(())
}

fn ternary(frame: &mut Frame, f: impl FnOnce(U256, U256, U256) -> U256) -> VmResult<()> {
    let a = frame.stack.pop()?;
    let b = frame.stack.pop()?;
    let c = frame.stack.pop()?;
    frame.stack.push(f(a, b, c))?;
    Ok(())
}

/// `per_word` gas for every 32-byte word of `size`, saturating
pub(crate) fn word_cost(per_word: u64, size: &U256) -> u64 {
    match to_usize(size) {
        Some(size) => per_word.saturating_mul(gas::words(size)),
        None => u64::MAX,
    }
}

/// Pop `dest offset size` and copy `source[offset..]` into memory at `dest`
fn copy_to_memory(frame: &mut Frame, source: &[u8]) -> VmResult<()> {
    let dest = frame.stack.pop()?;
    let offset = frame.stack.pop()?;
    let size = frame.stack.pop()?;
    frame.charge_with_memory(word_cost(cost::COPY, &size), &[(dest, size)])?;
    if !size.is_zero() {
        let data = buffer_read(source, offset, size.low_u64() as usize);
        frame.memory_write(dest, &data);
    }
    Ok(())
}

impl Evm<'_> {
    /// EIP-2929 account access: `warm` when already accessed (or before
    /// Berlin), the cold surcharge the first time.
    pub(crate) fn account_access_cost(&self, frame: &mut Frame, address: Address, warm: u64) -> u64 {
        if self.rules.access_lists && frame.accessed_addresses.insert(address) {
            self.rules.gas.cold_account_access
        } else {
            warm
        }
    }

    pub(crate) fn execute(&mut self, opcode: Opcode, frame: &mut Frame) -> VmResult<()> {
        match opcode {
            Opcode::STOP => frame.running = false,

            // Arithmetic
            Opcode::ADD => binary(frame, |a, b| a.overflowing_add(b).0)?,
            Opcode::MUL => binary(frame, |a, b| a.overflowing_mul(b).0)?,
            Opcode::SUB => binary(frame, |a, b| a.overflowing_sub(b).0)?,
            Opcode::DIV => binary(frame, |a, b| if b.is_zero() { b } else { a / b })?,
            Opcode::SDIV => binary(frame, stack::sdiv)?,
            Opcode::MOD => binary(frame, |a, b| if b.is_zero() { b } else { a % b })?,
            Opcode::SMOD => binary(frame, stack::smod)?,
            Opcode::ADDMOD => ternary(frame, stack::addmod)?,
            Opcode::MULMOD => ternary(frame, stack::mulmod)?,
            Opcode::EXP => {
                let base = frame.stack.pop()?;
                let exponent = frame.stack.pop()?;
                frame.charge(gas::exp_gas(&exponent, self.rules.gas.exp_byte) - cost::EXP)?;
                frame.stack.push(stack::exp(base, exponent))?;
            }
            Opcode::SIGNEXTEND => binary(frame, stack::signextend)?,

            // Comparison and bitwise
            Opcode::LT => binary(frame, |a, b| bool_word(a < b))?,
            Opcode::GT => binary(frame, |a, b| bool_word(a > b))?,
            Opcode::SLT => binary(frame, |a, b| bool_word(stack::slt(&a, &b)))?,
            Opcode::SGT => binary(frame, |a, b| bool_word(stack::slt(&b, &a)))?,
            Opcode::EQ => binary(frame, |a, b| bool_word(a == b))?,
            Opcode::ISZERO => unary(frame, |a| bool_word(a.is_zero()))?,
            Opcode::AND => binary(frame, |a, b| a & b)?,
            Opcode::OR => binary(frame, |a, b| a | b)?,
            Opcode::XOR => binary(frame, |a, b| a ^ b)?,
            Opcode::NOT => unary(frame, |a| !a)?,
            Opcode::BYTE => binary(frame, stack::byte)?,
            Opcode::SHL => binary(frame, stack::shl)?,
            Opcode::SHR => binary(frame, stack::shr)?,
            Opcode::SAR => binary(frame, stack::sar)?,

            Opcode::KECCAK256 => {
                let offset = frame.stack.pop()?;
                let size = frame.stack.pop()?;
                frame.charge_with_memory(word_cost(cost::SHA3_WORD, &size), &[(offset, size)])?;
                let hash = keccak256(&frame.memory_read(offset, size));
                frame.stack.push(hash.to_word())?;
            }

            // Environment
            Opcode::ADDRESS => frame.stack.push_address(&frame.message.current_target)?,
            Opcode::BALANCE => {
                let address = frame.stack.pop_address()?;
                let gas = self.account_access_cost(frame, address, self.rules.gas.balance);
                frame.charge(gas)?;
                frame.stack.push(self.state.balance(&address))?;
            }
            Opcode::ORIGIN => frame.stack.push_address(&self.env.tx.origin)?,
            Opcode::CALLER => frame.stack.push_address(&frame.message.caller)?,
            Opcode::CALLVALUE => frame.stack.push(frame.message.value)?,
            Opcode::CALLDATALOAD => {
                let offset = frame.stack.pop()?;
                let word = buffer_read(&frame.message.data, offset, 32);
                frame.stack.push(U256::from_big_endian(&word))?;
            }
            Opcode::CALLDATASIZE => frame.stack.push(U256::from(frame.message.data.len()))?,
            Opcode::CALLDATACOPY => {
                let data = frame.message.data.clone();
                copy_to_memory(frame, &data)?;
            }
            Opcode::CODESIZE => frame.stack.push(U256::from(frame.code.len()))?,
            Opcode::CODECOPY => {
                let code = frame.code.clone();
                copy_to_memory(frame, &code)?;
            }
            Opcode::GASPRICE => frame.stack.push(self.env.tx.gas_price)?,
            Opcode::EXTCODESIZE => {
                let address = frame.stack.pop_address()?;
                let gas = self.account_access_cost(frame, address, self.rules.gas.ext_code);
                frame.charge(gas)?;
                frame.stack.push(U256::from(self.state.code(&address).len()))?;
            }
            Opcode::EXTCODECOPY => {
                let address = frame.stack.pop_address()?;
                let dest = frame.stack.pop()?;
                let offset = frame.stack.pop()?;
                let size = frame.stack.pop()?;
                let access = self.account_access_cost(frame, address, self.rules.gas.ext_code);
                frame.charge_with_memory(
                    access.saturating_add(word_cost(cost::COPY, &size)),
                    &[(dest, size)],
                )?;
                if !size.is_zero() {
                    let code = self.state.code(&address);
                    frame.memory_write(dest, &buffer_read(&code, offset, size.low_u64() as usize));
                }
            }
            Opcode::RETURNDATASIZE => frame.stack.push(U256::from(frame.return_data.len()))?,
            Opcode::RETURNDATACOPY => {
                let dest = frame.stack.pop()?;
                let offset = frame.stack.pop()?;
                let size = frame.stack.pop()?;
                frame.charge_with_memory(word_cost(cost::COPY, &size), &[(dest, size)])?;
                let end = offset.checked_add(size).ok_or(ExceptionalHalt::OutOfBounds)?;
                if end > U256::from(frame.return_data.len()) {
                    return Err(ExceptionalHalt::OutOfBounds.into());
                }
                if !size.is_zero() {
                    let start = offset.low_u64() as usize;
                    let data = frame.return_data.slice(start..end.low_u64() as usize);
                    frame.memory_write(dest, &data);
                }
            }
            Opcode::EXTCODEHASH => {
                let address = frame.stack.pop_address()?;
                let gas = self.account_access_cost(frame, address, self.rules.gas.ext_code_hash);
                frame.charge(gas)?;
                let hash = match self.state.account(&address) {
                    Some(account) if !account.is_empty() => account.code_hash.to_word(),
                    _ => U256::zero(),
                };
                frame.stack.push(hash)?;
            }

            // Block
            Opcode::BLOCKHASH => {
                let number = frame.stack.pop()?;
                frame.stack.push(self.env.block.block_hash(number).to_word())?;
            }
            Opcode::COINBASE => frame.stack.push_address(&self.env.block.coinbase)?,
            Opcode::TIMESTAMP => frame.stack.push(U256::from(self.env.block.timestamp))?,
            Opcode::NUMBER => frame.stack.push(U256::from(self.env.block.number))?,
            Opcode::DIFFICULTY => frame.stack.push(self.env.block.difficulty)?,
            Opcode::GASLIMIT => frame.stack.push(U256::from(self.env.block.gas_limit))?,
            Opcode::CHAINID => frame.stack.push(U256::from(self.env.block.chain_id))?,
            Opcode::SELFBALANCE => {
                frame.stack.push(self.state.balance(&frame.message.current_target))?;
            }
            Opcode::BASEFEE => frame.stack.push(self.env.block.base_fee.unwrap_or_default())?,

            // Stack, memory, storage and flow
            Opcode::POP => {
                frame.stack.pop()?;
            }
            Opcode::MLOAD => {
                let offset = frame.stack.pop()?;
                frame.charge_with_memory(0, &[(offset, U256::from(32))])?;
                let value = frame.memory.load(offset.low_u64() as usize);
                frame.stack.push(value)?;
            }
            Opcode::MSTORE => {
                let offset = frame.stack.pop()?;
                let value = frame.stack.pop()?;
                frame.charge_with_memory(0, &[(offset, U256::from(32))])?;
                frame.memory.store(offset.low_u64() as usize, &value);
            }
            Opcode::MSTORE8 => {
                let offset = frame.stack.pop()?;
                let value = frame.stack.pop()?;
                frame.charge_with_memory(0, &[(offset, U256::one())])?;
                frame.memory.store8(offset.low_u64() as usize, value.byte(0));
            }
            Opcode::SLOAD => self.sload(frame)?,
            Opcode::SSTORE => self.sstore(frame)?,
            Opcode::JUMP => {
                let dest = frame.stack.pop()?;
                jump(frame, dest)?;
            }
            Opcode::JUMPI => {
                let dest = frame.stack.pop()?;
                let condition = frame.stack.pop()?;
                if !condition.is_zero() {
                    jump(frame, dest)?;
                }
            }
            Opcode::PC => frame.stack.push(U256::from(frame.pc - 1))?,
            Opcode::MSIZE => frame.stack.push(U256::from(frame.memory.size()))?,
            Opcode::GAS => frame.stack.push(U256::from(frame.gas_left))?,
            Opcode::JUMPDEST => {}

            Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
                let offset = frame.stack.pop()?;
                let size = frame.stack.pop()?;
                let topics = (0..opcode.log_topics())
                    .map(|_| frame.stack.pop_h256())
                    .collect::<Result<Vec<_>, _>>()?;
                let data_gas = to_usize(&size)
                    .map_or(u64::MAX, |size| cost::LOG_DATA.saturating_mul(size as u64));
                frame.charge_with_memory(data_gas, &[(offset, size)])?;
                let data = Bytes::from(frame.memory_read(offset, size));
                frame
                    .logs
                    .push(Log::new(frame.message.current_target, topics, data));
            }

            // System
            Opcode::CREATE => self.create(frame, false)?,
            Opcode::CREATE2 => self.create(frame, true)?,
            Opcode::CALL => self.call(frame)?,
            Opcode::CALLCODE => self.callcode(frame)?,
            Opcode::DELEGATECALL => self.delegatecall(frame)?,
            Opcode::STATICCALL => self.staticcall(frame)?,
            Opcode::RETURN => {
                let offset = frame.stack.pop()?;
                let size = frame.stack.pop()?;
                frame.charge_with_memory(0, &[(offset, size)])?;
                frame.output = Bytes::from(frame.memory_read(offset, size));
                frame.running = false;
            }
            Opcode::REVERT => {
                let offset = frame.stack.pop()?;
                let size = frame.stack.pop()?;
                frame.charge_with_memory(0, &[(offset, size)])?;
                frame.output = Bytes::from(frame.memory_read(offset, size));
                return Err(VmError::Revert);
            }
            Opcode::SELFDESTRUCT => self.selfdestruct(frame)?,

            op if op.is_push() => {
                let size = op.push_size();
                let data = buffer_read(&frame.code, U256::from(frame.pc), size);
                frame.stack.push(U256::from_big_endian(&data))?;
                frame.pc += size;
            }
            op if op.dup_depth() > 0 => frame.stack.dup(op.dup_depth())?,
            op if op.swap_depth() > 0 => frame.stack.swap(op.swap_depth())?,

            op => return Err(ExceptionalHalt::InvalidOpcode(op as u8).into()),
        }
        Ok(())
    }

    fn sload(&mut self, frame: &mut Frame) -> VmResult<()> {
        let key = frame.stack.pop_h256()?;
        let address = frame.message.current_target;
        let gas = if self.rules.access_lists && frame.accessed_storage_keys.insert((address, key)) {
            self.rules.gas.cold_sload
        } else {
            self.rules.gas.sload
        };
        frame.charge(gas)?;
        frame.stack.push(self.state.storage(&address, &key))?;
        Ok(())
    }

    fn sstore(&mut self, frame: &mut Frame) -> VmResult<()> {
        let key = frame.stack.pop_h256()?;
        let new = frame.stack.pop()?;
        if self.rules.sstore_sentry && frame.gas_left <= cost::CALL_STIPEND {
            return Err(ExceptionalHalt::OutOfGas.into());
        }

        let address = frame.message.current_target;
        let current = self.state.storage(&address, &key);
        let schedule = &self.rules.gas;
        let clear_refund = schedule.sstore_clear_refund as i64;
        let mut gas = 0;
        let mut refund = 0i64;

        if self.rules.access_lists && frame.accessed_storage_keys.insert((address, key)) {
            gas += schedule.cold_sload;
        }

        if self.rules.sstore_net_metering {
            let original = self.state.original_storage(&address, &key);
            gas += if original == current && current != new {
                if original.is_zero() {
                    schedule.sstore_set
                } else {
                    schedule.sstore_reset
                }
            } else {
                schedule.sload
            };

            if current != new {
                if !original.is_zero() && !current.is_zero() && new.is_zero() {
                    refund += clear_refund;
                }
                if !original.is_zero() && current.is_zero() {
                    refund -= clear_refund;
                }
                if original == new {
                    refund += if original.is_zero() {
                        (schedule.sstore_set - schedule.sload) as i64
                    } else {
                        (schedule.sstore_reset - schedule.sload) as i64
                    };
                }
            }
        } else {
            gas += if current.is_zero() && !new.is_zero() {
                schedule.sstore_set
            } else {
                schedule.sstore_reset
            };
            if !current.is_zero() && new.is_zero() {
                refund += clear_refund;
            }
        }

        frame.charge(gas)?;
        frame.refund_counter += refund;
        self.state.set_storage(address, key, new);
        Ok(())
    }
}

fn jump(frame: &mut Frame, dest: U256) -> VmResult<()> {
    match to_usize(&dest) {
        Some(dest) if frame.is_valid_jump(dest) => {
            frame.pc = dest;
            Ok(())
        }
        _ => Err(ExceptionalHalt::InvalidJump(dest.low_u64() as usize).into()),
    }
}
