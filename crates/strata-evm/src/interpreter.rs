//! Message processing and the interpreter loop

use crate::context::{Environment, Message};
use crate::error::{ExceptionalHalt, FrameError, VmError, VmResult};
use crate::frame::{Frame, MessageCallOutput};
use crate::gas::{self, cost};
use crate::opcode::Opcode;
use crate::precompiles;
use strata_forks::ForkRules;
use strata_state::{StateResult, WorldState};
use tracing::trace;

/// EVM bound to one transaction's environment and the world state it mutates.
///
/// Every call or creation runs in its own [`Frame`] behind a state
/// checkpoint; a failing frame rolls its checkpoint back. Errors returned by
/// the methods here are world-state invariant violations, never execution
/// failures, which are reported on the frame instead.
pub struct Evm<'a> {
    pub(crate) env: &'a Environment,
    pub(crate) rules: ForkRules,
    pub(crate) state: &'a mut WorldState,
}

impl<'a> Evm<'a> {
    /// Create an EVM over `state`
    pub fn new(env: &'a Environment, rules: ForkRules, state: &'a mut WorldState) -> Self {
        Self { env, rules, state }
    }

    /// Execution environment
    pub fn env(&self) -> &Environment {
        self.env
    }

    /// Fork rules in force
    pub fn rules(&self) -> &ForkRules {
        &self.rules
    }

    /// World state
    pub fn state(&self) -> &WorldState {
        self.state
    }

    /// Run a transaction's top-level message
    pub fn process_message_call(&mut self, message: Message) -> StateResult<MessageCallOutput> {
        let frame = if message.is_create {
            if self.state.account_has_code_or_nonce(&message.current_target) {
                return Ok(MessageCallOutput {
                    error: Some(ExceptionalHalt::AddressCollision.into()),
                    ..Default::default()
                });
            }
            self.process_create_message(message)?
        } else {
            let target = message.current_target;
            let mut frame = self.process_message(message)?;
            if self.rules.state_clearing && self.state.account_exists_and_is_empty(&target) {
                frame.touched_accounts.insert(target);
            }
            frame
        };

        if frame.error.is_some() {
            return Ok(MessageCallOutput {
                gas_left: frame.gas_left,
                output: frame.output,
                error: frame.error,
                ..Default::default()
            });
        }
        Ok(MessageCallOutput {
            gas_left: frame.gas_left,
            refund_counter: frame.refund_counter.max(0) as u64,
            logs: frame.logs,
            accounts_to_delete: frame.accounts_to_delete,
            touched_accounts: frame.touched_accounts,
            output: frame.output,
            error: None,
        })
    }

    /// Run a creation message and deposit the returned code
    pub fn process_create_message(&mut self, message: Message) -> StateResult<Frame> {
        let target = message.current_target;
        self.state.checkpoint();
        self.state.destroy_storage(&target);
        self.state.mark_account_created(target);
        if self.rules.state_clearing {
            self.state.increment_nonce(&target)?;
        }

        let mut frame = self.process_message(message)?;
        if frame.error.is_some() {
            self.state.revert_to_checkpoint()?;
            return Ok(frame);
        }

        let code = std::mem::take(&mut frame.output);
        match self.check_code_deposit(&mut frame, &code) {
            Ok(()) => {
                self.state.set_code(&target, code);
                self.state.commit_checkpoint()?;
            }
            Err(_) if !self.rules.create_deposit_oog_fails => {
                self.state.commit_checkpoint()?;
            }
            Err(halt) => {
                self.state.revert_to_checkpoint()?;
                frame.halt(halt);
            }
        }
        Ok(frame)
    }

    fn check_code_deposit(&self, frame: &mut Frame, code: &[u8]) -> Result<(), ExceptionalHalt> {
        if self.rules.reject_ef_code && code.first() == Some(&0xEF) {
            return Err(ExceptionalHalt::InvalidContractPrefix);
        }
        frame.charge(cost::CODE_DEPOSIT.saturating_mul(code.len() as u64))?;
        if self.rules.max_code_size.is_some_and(|max| code.len() > max) {
            return Err(ExceptionalHalt::OutOfGas);
        }
        Ok(())
    }

    /// Run a message behind its own checkpoint, moving value first
    pub fn process_message(&mut self, message: Message) -> StateResult<Frame> {
        self.state.checkpoint();
        self.state.touch_account(&message.current_target);
        if message.should_transfer_value && !message.value.is_zero() {
            self.state
                .transfer(&message.caller, &message.current_target, message.value)?;
        }

        let frame = self.execute_code(message)?;
        if frame.error.is_some() {
            self.state.revert_to_checkpoint()?;
        } else {
            self.state.commit_checkpoint()?;
        }
        Ok(frame)
    }

    /// Execute a message's code, or the precompile it addresses
    pub fn execute_code(&mut self, message: Message) -> StateResult<Frame> {
        trace!(
            depth = message.depth,
            address = %message.current_target,
            gas = message.gas,
            create = message.is_create,
            "entering frame"
        );
        let mut frame = Frame::new(message);

        let result = match frame.message.code_address {
            Some(address) if self.rules.is_precompile(&address) => {
                precompiles::execute(address.as_bytes()[19], &self.rules, &mut frame)
                    .map_err(VmError::from)
            }
            _ => self.run(&mut frame),
        };

        match result {
            Ok(()) => {}
            Err(VmError::Halt(halt)) => frame.halt(halt),
            Err(VmError::Revert) => {
                frame.running = false;
                frame.error = Some(FrameError::Revert);
            }
            Err(VmError::State(err)) => return Err(err),
        }

        trace!(
            depth = frame.message.depth,
            gas_left = frame.gas_left,
            error = ?frame.error,
            "leaving frame"
        );
        Ok(frame)
    }

    fn run(&mut self, frame: &mut Frame) -> VmResult<()> {
        while frame.running && frame.pc < frame.code.len() {
            let byte = frame.code[frame.pc];
            let opcode = Opcode::from_byte(byte)
                .filter(|_| self.rules.is_opcode_enabled(byte))
                .ok_or(ExceptionalHalt::InvalidOpcode(byte))?;
            trace!(pc = frame.pc, op = opcode.name(), gas_left = frame.gas_left, "step");

            frame.charge(gas::static_gas(opcode))?;
            if frame.message.is_static && opcode.is_state_modifying() {
                return Err(ExceptionalHalt::WriteInStaticContext.into());
            }

            frame.pc += 1;
            self.execute(opcode, frame)?;
        }
        Ok(())
    }
}
