//! Block executor implementation

use crate::error::{BlockError, BlockRejection, BlockResult, TransactionRejection};
use crate::ommers::pay_rewards;
use crate::transaction::{process_transaction, BlockEnv};
use strata_primitives::H256;
use strata_state::WorldState;
use strata_trie::ordered_trie_root;
use strata_types::{Block, Bloom, Receipt, ReceiptOutcome, SignedTransaction, TxStatus};
use tracing::debug;

/// Block execution result
#[derive(Debug, Clone)]
pub struct BlockExecutionResult {
    /// Transaction receipts
    pub receipts: Vec<Receipt>,
    /// Total gas used in block
    pub gas_used: u64,
    /// Logs bloom filter
    pub logs_bloom: Bloom,
    /// Root of the block's transactions
    pub transactions_root: H256,
    /// Root of the receipts
    pub receipts_root: H256,
    /// State root after execution and rewards
    pub state_root: H256,
}

/// Runs a block's transactions and rewards over a world state
pub struct BlockExecutor<'a> {
    env: BlockEnv,
    state: &'a mut WorldState,
}

impl<'a> BlockExecutor<'a> {
    /// Create an executor for the block described by `env`
    pub fn new(env: BlockEnv, state: &'a mut WorldState) -> Self {
        Self { env, state }
    }

    /// Execute a block
    pub fn execute_block(&mut self, block: &Block) -> BlockResult<BlockExecutionResult> {
        let mut receipts = Vec::with_capacity(block.tx_count());
        let mut cumulative_gas = 0u64;

        for (index, tx) in block.transactions.iter().enumerate() {
            let receipt = self
                .execute_transaction(tx, cumulative_gas)
                .map_err(|rejection| BlockError::transaction(index, rejection))?;
            cumulative_gas = receipt.cumulative_gas_used;
            receipts.push(receipt);
        }

        pay_rewards(self.state, &self.env.rules, &block.header, &block.ommers)?;

        let mut logs_bloom = Bloom::default();
        for receipt in &receipts {
            logs_bloom.accrue_bloom(&receipt.logs_bloom);
        }

        let result = BlockExecutionResult {
            transactions_root: block.compute_transactions_root(),
            receipts_root: ordered_trie_root(receipts.iter().map(Receipt::encoded)),
            state_root: self.state.state_root(),
            receipts,
            gas_used: cumulative_gas,
            logs_bloom,
        };
        debug!(
            "Executed block {}: {} transactions, gas_used={}, state_root={}",
            block.number(),
            block.tx_count(),
            result.gas_used,
            result.state_root
        );
        Ok(result)
    }

    /// Execute a single transaction and build its receipt
    pub fn execute_transaction(
        &mut self,
        tx: &SignedTransaction,
        cumulative_gas: u64,
    ) -> Result<Receipt, TransactionRejection> {
        let available = self.env.block.gas_limit.saturating_sub(cumulative_gas);
        let outcome = process_transaction(&self.env, self.state, tx, available)?;

        let status = if self.env.rules.status_receipts {
            ReceiptOutcome::Status(TxStatus::from(outcome.is_success()))
        } else {
            ReceiptOutcome::StateRoot(self.state.state_root())
        };
        Ok(Receipt::new(
            tx.tx_type(),
            status,
            cumulative_gas + outcome.gas_used,
            outcome.logs,
        ))
    }

    /// Get current state reference
    pub fn state(&self) -> &WorldState {
        self.state
    }
}

/// Compare execution output with the commitments in the block header
pub fn check_execution_result(
    block: &Block,
    result: &BlockExecutionResult,
) -> Result<(), BlockRejection> {
    let header = &block.header;
    if header.gas_used != result.gas_used {
        return Err(BlockRejection::GasUsed {
            header: header.gas_used,
            computed: result.gas_used,
        });
    }
    if header.transactions_root != result.transactions_root {
        return Err(BlockRejection::TransactionsRoot {
            header: header.transactions_root,
            computed: result.transactions_root,
        });
    }
    if header.receipts_root != result.receipts_root {
        return Err(BlockRejection::ReceiptsRoot {
            header: header.receipts_root,
            computed: result.receipts_root,
        });
    }
    if header.logs_bloom != result.logs_bloom {
        return Err(BlockRejection::LogsBloom {
            header: header.logs_bloom,
            computed: result.logs_bloom,
        });
    }
    if header.state_root != result.state_root {
        return Err(BlockRejection::StateRoot {
            header: header.state_root,
            computed: result.state_root,
        });
    }
    Ok(())
}
