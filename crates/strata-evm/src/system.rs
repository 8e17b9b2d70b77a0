//! Calls, creations and SELFDESTRUCT

use crate::context::Message;
use crate::error::{ExceptionalHalt, VmResult};
use crate::frame::Frame;
use crate::gas::{self, cost};
use crate::instructions::word_cost;
use crate::interpreter::Evm;
use bytes::Bytes;
use strata_crypto::keccak256;
use strata_primitives::{Address, H256, U256};
use strata_rlp::RlpStream;

/// RIPEMD-160 precompile, whose touch survives a failed call (mainnet
/// block 2675119 quirk)
const RIPEMD160_ADDRESS: Address = Address::from_low_u64(3);

/// CREATE address: `keccak256(rlp([sender, nonce]))[12..]`
pub fn compute_contract_address(sender: &Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(sender);
    stream.append(&nonce);
    Address::from_hash(&keccak256(&stream.out()))
}

/// CREATE2 address: `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))[12..]`
pub fn compute_create2_address(sender: &Address, salt: &H256, init_code: &[u8]) -> Address {
    let mut preimage = Vec::with_capacity(85);
    preimage.push(0xff);
    preimage.extend_from_slice(sender.as_bytes());
    preimage.extend_from_slice(salt.as_bytes());
    preimage.extend_from_slice(keccak256(init_code).as_bytes());
    Address::from_hash(&keccak256(&preimage))
}

/// Where a CALL-family opcode sends its message
struct CallTarget {
    gas: u64,
    value: U256,
    caller: Address,
    to: Address,
    code_address: Address,
    should_transfer_value: bool,
    is_static: bool,
    input: (U256, U256),
    output: (U256, U256),
}

impl Evm<'_> {
    fn child_message(&self, frame: &Frame) -> Message {
        Message {
            depth: frame.message.depth + 1,
            accessed_addresses: frame.accessed_addresses.clone(),
            accessed_storage_keys: frame.accessed_storage_keys.clone(),
            accounts_to_delete: frame.accounts_to_delete.clone(),
            ..Default::default()
        }
    }

    fn incorporate_child_on_success(&self, frame: &mut Frame, child: Frame) {
        frame.gas_left += child.gas_left;
        frame.logs.extend(child.logs);
        frame.refund_counter += child.refund_counter;
        frame.accounts_to_delete.extend(child.accounts_to_delete);
        frame.touched_accounts.extend(child.touched_accounts);
        if self.rules.state_clearing
            && self.state.account_exists_and_is_empty(&child.message.current_target)
        {
            frame.touched_accounts.insert(child.message.current_target);
        }
        frame.accessed_addresses.extend(child.accessed_addresses);
        frame.accessed_storage_keys.extend(child.accessed_storage_keys);
    }

    fn incorporate_child_on_error(&self, frame: &mut Frame, child: &Frame) {
        if self.rules.state_clearing
            && (child.touched_accounts.contains(&RIPEMD160_ADDRESS)
                || (child.message.current_target == RIPEMD160_ADDRESS
                    && self.state.account_exists_and_is_empty(&RIPEMD160_ADDRESS)))
        {
            frame.touched_accounts.insert(RIPEMD160_ADDRESS);
        }
        frame.gas_left += child.gas_left;
    }

    // ==================== Creation ====================

    pub(crate) fn create(&mut self, frame: &mut Frame, with_salt: bool) -> VmResult<()> {
        let endowment = frame.stack.pop()?;
        let offset = frame.stack.pop()?;
        let size = frame.stack.pop()?;
        let sender = frame.message.current_target;

        let contract_address = if with_salt {
            let salt = frame.stack.pop_h256()?;
            frame.charge_with_memory(word_cost(cost::SHA3_WORD, &size), &[(offset, size)])?;
            let init_code = frame.memory_read(offset, size);
            compute_create2_address(&sender, &salt, &init_code)
        } else {
            frame.charge_with_memory(0, &[(offset, size)])?;
            let nonce = self.state.account_or_default(&sender).nonce;
            compute_contract_address(&sender, nonce)
        };

        frame.accessed_addresses.insert(contract_address);
        let create_gas = if self.rules.all_but_one_64th {
            gas::max_message_call_gas(frame.gas_left)
        } else {
            frame.gas_left
        };
        frame.gas_left -= create_gas;
        frame.return_data = Bytes::new();

        let sender_account = self.state.account_or_default(&sender);
        if sender_account.balance < endowment
            || sender_account.nonce == u64::MAX
            || frame.message.depth + 1 > cost::MAX_CALL_DEPTH
        {
            frame.gas_left += create_gas;
            frame.stack.push(U256::zero())?;
            return Ok(());
        }

        if self.state.account_has_code_or_nonce(&contract_address) {
            self.state.increment_nonce(&sender)?;
            frame.stack.push(U256::zero())?;
            return Ok(());
        }

        let init_code = Bytes::from(frame.memory_read(offset, size));
        self.state.increment_nonce(&sender)?;

        let message = Message {
            caller: sender,
            is_create: true,
            current_target: contract_address,
            code_address: None,
            gas: create_gas,
            value: endowment,
            code: init_code,
            should_transfer_value: true,
            ..self.child_message(frame)
        };
        let child = self.process_create_message(message)?;

        if child.is_success() {
            self.incorporate_child_on_success(frame, child);
            frame.stack.push_address(&contract_address)?;
        } else {
            self.incorporate_child_on_error(frame, &child);
            frame.return_data = child.output;
            frame.stack.push(U256::zero())?;
        }
        Ok(())
    }

    // ==================== Calls ====================

    /// New-account surcharge for a value-bearing CALL to `to`
    fn new_account_cost(&self, to: &Address, value: &U256) -> u64 {
        let charge = if self.rules.state_clearing {
            !value.is_zero() && !self.state.is_account_alive(to)
        } else {
            !self.state.account_exists(to)
        };
        if charge {
            cost::NEW_ACCOUNT
        } else {
            0
        }
    }

    fn pop_memory_ranges(frame: &mut Frame) -> VmResult<((U256, U256), (U256, U256))> {
        let input = (frame.stack.pop()?, frame.stack.pop()?);
        let output = (frame.stack.pop()?, frame.stack.pop()?);
        Ok((input, output))
    }

    /// Charge for a call and return the gas to forward
    fn charge_call(
        &self,
        frame: &mut Frame,
        gas: U256,
        value: &U256,
        extents: &[(U256, U256)],
        extra_gas: u64,
    ) -> VmResult<u64> {
        let expansion = gas::memory_expansion(frame.memory.size(), extents)?;
        let call_gas = gas::message_call_gas(
            &self.rules,
            value,
            gas,
            frame.gas_left,
            expansion.cost,
            extra_gas,
        )?;
        frame.charge(call_gas.cost.saturating_add(expansion.cost))?;
        frame.memory.resize(expansion.new_size);
        Ok(call_gas.stipend)
    }

    pub(crate) fn call(&mut self, frame: &mut Frame) -> VmResult<()> {
        let gas = frame.stack.pop()?;
        let to = frame.stack.pop_address()?;
        let value = frame.stack.pop()?;
        let (input, output) = Self::pop_memory_ranges(frame)?;

        let access = self.account_access_cost(frame, to, self.rules.gas.call);
        let transfer = if value.is_zero() { 0 } else { cost::CALL_VALUE };
        let extra = access + self.new_account_cost(&to, &value) + transfer;
        let stipend = self.charge_call(frame, gas, &value, &[input, output], extra)?;
        if frame.message.is_static && !value.is_zero() {
            return Err(ExceptionalHalt::WriteInStaticContext.into());
        }

        let sender = frame.message.current_target;
        if self.state.balance(&sender) < value {
            frame.stack.push(U256::zero())?;
            frame.return_data = Bytes::new();
            frame.gas_left += stipend;
            return Ok(());
        }
        self.generic_call(
            frame,
            CallTarget {
                gas: stipend,
                value,
                caller: sender,
                to,
                code_address: to,
                should_transfer_value: true,
                is_static: false,
                input,
                output,
            },
        )
    }

    pub(crate) fn callcode(&mut self, frame: &mut Frame) -> VmResult<()> {
        let gas = frame.stack.pop()?;
        let code_address = frame.stack.pop_address()?;
        let value = frame.stack.pop()?;
        let (input, output) = Self::pop_memory_ranges(frame)?;

        let access = self.account_access_cost(frame, code_address, self.rules.gas.call);
        let transfer = if value.is_zero() { 0 } else { cost::CALL_VALUE };
        let stipend = self.charge_call(frame, gas, &value, &[input, output], access + transfer)?;

        let sender = frame.message.current_target;
        if self.state.balance(&sender) < value {
            frame.stack.push(U256::zero())?;
            frame.return_data = Bytes::new();
            frame.gas_left += stipend;
            return Ok(());
        }
        self.generic_call(
            frame,
            CallTarget {
                gas: stipend,
                value,
                caller: sender,
                to: sender,
                code_address,
                should_transfer_value: true,
                is_static: false,
                input,
                output,
            },
        )
    }

    pub(crate) fn delegatecall(&mut self, frame: &mut Frame) -> VmResult<()> {
        let gas = frame.stack.pop()?;
        let code_address = frame.stack.pop_address()?;
        let (input, output) = Self::pop_memory_ranges(frame)?;

        let access = self.account_access_cost(frame, code_address, self.rules.gas.call);
        let stipend = self.charge_call(frame, gas, &U256::zero(), &[input, output], access)?;

        let target = CallTarget {
            gas: stipend,
            value: frame.message.value,
            caller: frame.message.caller,
            to: frame.message.current_target,
            code_address,
            should_transfer_value: false,
            is_static: false,
            input,
            output,
        };
        self.generic_call(frame, target)
    }

    pub(crate) fn staticcall(&mut self, frame: &mut Frame) -> VmResult<()> {
        let gas = frame.stack.pop()?;
        let to = frame.stack.pop_address()?;
        let (input, output) = Self::pop_memory_ranges(frame)?;

        let access = self.account_access_cost(frame, to, self.rules.gas.call);
        let stipend = self.charge_call(frame, gas, &U256::zero(), &[input, output], access)?;

        let target = CallTarget {
            gas: stipend,
            value: U256::zero(),
            caller: frame.message.current_target,
            to,
            code_address: to,
            should_transfer_value: true,
            is_static: true,
            input,
            output,
        };
        self.generic_call(frame, target)
    }

    fn generic_call(&mut self, frame: &mut Frame, target: CallTarget) -> VmResult<()> {
        frame.return_data = Bytes::new();
        if frame.message.depth + 1 > cost::MAX_CALL_DEPTH {
            frame.gas_left += target.gas;
            frame.stack.push(U256::zero())?;
            return Ok(());
        }

        let message = Message {
            caller: target.caller,
            current_target: target.to,
            code_address: Some(target.code_address),
            gas: target.gas,
            value: target.value,
            data: Bytes::from(frame.memory_read(target.input.0, target.input.1)),
            code: self.state.code(&target.code_address),
            should_transfer_value: target.should_transfer_value,
            is_static: target.is_static || frame.message.is_static,
            ..self.child_message(frame)
        };
        let mut child = self.process_message(message)?;
        let output = std::mem::take(&mut child.output);

        if child.is_success() {
            self.incorporate_child_on_success(frame, child);
            frame.stack.push(U256::one())?;
        } else {
            self.incorporate_child_on_error(frame, &child);
            frame.stack.push(U256::zero())?;
        }

        let (out_offset, out_size) = target.output;
        let copied = output.len().min(out_size.low_u64() as usize);
        if !out_size.is_zero() {
            frame.memory_write(out_offset, &output[..copied]);
        }
        frame.return_data = output;
        Ok(())
    }

    // ==================== SELFDESTRUCT ====================

    pub(crate) fn selfdestruct(&mut self, frame: &mut Frame) -> VmResult<()> {
        let beneficiary = frame.stack.pop_address()?;
        let originator = frame.message.current_target;
        let mut gas = self.rules.gas.selfdestruct;

        if self.rules.access_lists && frame.accessed_addresses.insert(beneficiary) {
            gas += self.rules.gas.cold_account_access;
        }
        let needs_new_account = if self.rules.state_clearing {
            !self.state.is_account_alive(&beneficiary)
                && !self.state.balance(&originator).is_zero()
        } else {
            self.rules.all_but_one_64th && !self.state.account_exists(&beneficiary)
        };
        if needs_new_account {
            gas += cost::NEW_ACCOUNT;
        }
        frame.charge(gas)?;

        if !frame.accounts_to_delete.contains(&originator) {
            frame.refund_counter += self.rules.gas.selfdestruct_refund as i64;
        }

        let balance = self.state.balance(&originator);
        self.state.add_balance(&beneficiary, balance)?;
        self.state.set_balance(&originator, U256::zero());

        frame.accounts_to_delete.insert(originator);
        if self.rules.state_clearing && self.state.account_exists_and_is_empty(&beneficiary) {
            frame.touched_accounts.insert(beneficiary);
        }
        frame.running = false;
        Ok(())
    }
}
