//! Transaction validation, execution and settlement

use crate::error::TransactionRejection;
use std::collections::HashSet;
use strata_crypto::SECP256K1_N_DIV_2;
use strata_evm::gas::cost;
use strata_evm::{
    compute_contract_address, BlockContext, Environment, Evm, FrameError, Message, TxContext,
};
use strata_forks::ForkRules;
use strata_primitives::{Address, U256};
use strata_state::WorldState;
use strata_types::{Log, SignedTransaction};
use tracing::debug;

/// Block-level inputs shared by every transaction in the block
#[derive(Clone, Debug)]
pub struct BlockEnv {
    /// Rules of the fork the block belongs to
    pub rules: ForkRules,
    /// Values visible to the EVM
    pub block: BlockContext,
}

/// What executing an included transaction produced
#[derive(Clone, Debug)]
pub struct TransactionOutcome {
    /// Recovered sender
    pub sender: Address,
    /// Gas charged after the refund
    pub gas_used: u64,
    /// Logs of a successful execution, empty otherwise
    pub logs: Vec<Log>,
    /// Why execution failed, if it did
    pub error: Option<FrameError>,
    /// Address of the deployed contract for creations
    pub contract_address: Option<Address>,
}

impl TransactionOutcome {
    /// Whether execution succeeded
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Gas charged before any code runs
pub fn intrinsic_gas(tx: &SignedTransaction, rules: &ForkRules) -> u64 {
    let data = tx.data();
    let zeros = data.iter().filter(|&&b| b == 0).count() as u64;
    let non_zeros = data.len() as u64 - zeros;

    let mut gas = cost::TX
        + zeros * cost::TX_DATA_ZERO
        + non_zeros * rules.gas.tx_data_nonzero;
    if tx.is_contract_creation() {
        gas += rules.gas.tx_create;
    }
    for item in tx.access_list() {
        gas += cost::ACCESS_LIST_ADDRESS
            + item.storage_keys.len() as u64 * cost::ACCESS_LIST_STORAGE_KEY;
    }
    gas
}

/// Price per gas the sender pays, after the fee-market checks
fn effective_gas_price(
    tx: &SignedTransaction,
    base_fee: Option<U256>,
) -> Result<U256, TransactionRejection> {
    let max_fee = tx.max_fee_per_gas();
    let priority = tx.max_priority_fee_per_gas();
    if priority > max_fee {
        return Err(TransactionRejection::PriorityFeeAboveMax { priority, max_fee });
    }
    let Some(base_fee) = base_fee else {
        return Ok(max_fee);
    };
    if max_fee < base_fee {
        return Err(TransactionRejection::FeeBelowBaseFee { max_fee, base_fee });
    }
    Ok(base_fee + priority.min(max_fee - base_fee))
}

/// Recover the sender, enforcing the chain id and the fork's signature rules
pub fn recover_sender(
    tx: &SignedTransaction,
    rules: &ForkRules,
    chain_id: u64,
) -> Result<Address, TransactionRejection> {
    let tx_type = tx.tx_type() as u8;
    if !rules.supports_tx_type(tx_type) {
        return Err(TransactionRejection::UnsupportedType(tx_type));
    }

    match tx.chain_id() {
        Some(id) if id != chain_id || !rules.replay_protection => {
            return Err(TransactionRejection::WrongChainId {
                expected: chain_id,
                got: Some(id),
            });
        }
        _ => {}
    }

    if rules.low_s_signatures && tx.signature.s > U256::from_big_endian(&SECP256K1_N_DIV_2) {
        return Err(TransactionRejection::HighS);
    }
    Ok(tx.recover_sender()?)
}

/// Validate `tx` against `state` and execute it.
///
/// `gas_available` is what the block has left. A rejection leaves `state`
/// untouched; a failed execution is an outcome, not a rejection.
pub fn process_transaction(
    env: &BlockEnv,
    state: &mut WorldState,
    tx: &SignedTransaction,
    gas_available: u64,
) -> Result<TransactionOutcome, TransactionRejection> {
    let rules = &env.rules;
    let sender = recover_sender(tx, rules, env.block.chain_id)?;

    let gas_limit = tx.gas_limit();
    let intrinsic = intrinsic_gas(tx, rules);
    if intrinsic > gas_limit {
        return Err(TransactionRejection::IntrinsicGas {
            intrinsic,
            gas_limit,
        });
    }
    if gas_limit > gas_available {
        return Err(TransactionRejection::BlockGasExceeded {
            gas_limit,
            available: gas_available,
        });
    }

    let gas_price = effective_gas_price(tx, env.block.base_fee)?;

    let account = state.account_or_default(&sender);
    if account.nonce != tx.nonce() {
        return Err(TransactionRejection::NonceMismatch {
            expected: account.nonce,
            got: tx.nonce(),
        });
    }
    if account.nonce == u64::MAX {
        return Err(TransactionRejection::NonceMax);
    }

    let gas = U256::from(gas_limit);
    let required = gas
        .checked_mul(tx.max_fee_per_gas())
        .and_then(|fee| fee.checked_add(tx.value()));
    match required {
        Some(required) if required <= account.balance => {}
        required => {
            return Err(TransactionRejection::InsufficientFunds {
                required: required.unwrap_or(U256::MAX),
                available: account.balance,
            })
        }
    }
    if account.code_hash != strata_state::EMPTY_CODE_HASH {
        return Err(TransactionRejection::SenderHasCode(sender));
    }

    // Validation done; from here on the transaction is included.
    state.begin_transaction();
    state.increment_nonce(&sender)?;
    state.sub_balance(&sender, gas * gas_price)?;

    let message = prepare_message(state, rules, tx, sender, gas_limit - intrinsic);
    let contract_address = message.is_create.then_some(message.current_target);

    let evm_env = Environment::new(
        env.block.clone(),
        TxContext {
            origin: sender,
            gas_price,
        },
    );
    let output = Evm::new(&evm_env, *rules, state).process_message_call(message)?;

    let gas_used = gas_limit - output.gas_left;
    let refund = (gas_used / rules.refund_quotient).min(output.refund_counter);
    let charged = gas_used - refund;

    state.add_balance(&sender, U256::from(output.gas_left + refund) * gas_price)?;

    let priority_fee = match env.block.base_fee {
        Some(base_fee) => gas_price - base_fee,
        None => gas_price,
    };
    let coinbase = env.block.coinbase;
    let fee = U256::from(charged) * priority_fee;
    if !rules.state_clearing || !fee.is_zero() {
        state.add_balance(&coinbase, fee)?;
    } else if state.account_exists_and_is_empty(&coinbase) {
        state.destroy_account(&coinbase);
    }

    for address in &output.accounts_to_delete {
        state.destroy_account(address);
    }
    if rules.state_clearing {
        for address in &output.touched_accounts {
            if state.account_exists_and_is_empty(address) {
                state.destroy_account(address);
            }
        }
    }

    let success = output.is_success();
    debug!(
        "Transaction {} from {}: gas_used={}, refund={}, success={}",
        tx.hash(),
        sender,
        charged,
        refund,
        success
    );

    Ok(TransactionOutcome {
        sender,
        gas_used: charged,
        logs: output.logs,
        error: output.error,
        contract_address: contract_address.filter(|_| success),
    })
}

/// Top-level message for `tx`, with the EIP-2929 access sets pre-warmed
fn prepare_message(
    state: &WorldState,
    rules: &ForkRules,
    tx: &SignedTransaction,
    sender: Address,
    gas: u64,
) -> Message {
    let mut message = Message {
        caller: sender,
        gas,
        value: tx.value(),
        should_transfer_value: true,
        ..Default::default()
    };

    match tx.to() {
        Some(to) => {
            message.current_target = to;
            message.code_address = Some(to);
            message.data = tx.data().clone();
            message.code = state.code(&to);
        }
        None => {
            // The nonce was already incremented for this transaction.
            let nonce = state.account_or_default(&sender).nonce - 1;
            message.is_create = true;
            message.current_target = compute_contract_address(&sender, nonce);
            message.code = tx.data().clone();
        }
    }

    if rules.access_lists {
        let mut addresses: HashSet<Address> = rules.precompiles().collect();
        addresses.insert(sender);
        addresses.insert(message.current_target);
        for item in tx.access_list() {
            addresses.insert(item.address);
            for key in &item.storage_keys {
                message.accessed_storage_keys.insert((item.address, *key));
            }
        }
        message.accessed_addresses = addresses;
    }
    message
}
