//! Test harness for block processing
//!
//! Builds chains whose blocks carry correct header commitments, so tests can
//! focus on the behaviour under test instead of assembling roots by hand.

#![allow(dead_code)]

use bytes::Bytes;
use k256::ecdsa::SigningKey;
use strata_core::header::{calculate_base_fee, calculate_difficulty, INITIAL_BASE_FEE};
use strata_core::{BlockChain, BlockExecutionResult, BlockExecutor, Genesis};
use strata_crypto::{public_key_to_address, sign};
use strata_forks::{ChainConfig, Fork};
use strata_primitives::{Address, H256, U256};
use strata_state::WorldState;
use strata_types::{
    compute_ommers_hash, Block, BlockHeader, DynamicFeeTx, LegacyTx, SignedTransaction,
    TransactionBody, TxSignature,
};

/// Default miner of harness blocks
pub const MINER: Address = Address::from_low_u64(0xc0ffee);

/// Seconds between harness blocks
pub const BLOCK_TIME: u64 = 13;

/// One ether in wei
pub fn ether(n: u64) -> U256 {
    U256::exp10(18) * U256::from(n)
}

/// Externally owned account with a signing key
pub struct TestAccount {
    pub key: SigningKey,
    pub address: Address,
    pub nonce: u64,
}

impl TestAccount {
    pub fn random() -> Self {
        let key = SigningKey::random(&mut rand::thread_rng());
        let address = public_key_to_address(key.verifying_key());
        Self {
            key,
            address,
            nonce: 0,
        }
    }

    /// Pre-EIP-155 legacy transaction, valid in every fork
    pub fn legacy(
        &mut self,
        to: Option<Address>,
        value: U256,
        data: &[u8],
        gas_limit: u64,
        gas_price: U256,
    ) -> SignedTransaction {
        let body = TransactionBody::Legacy(LegacyTx {
            nonce: self.next_nonce(),
            gas_price,
            gas_limit,
            to,
            value,
            data: Bytes::copy_from_slice(data),
        });
        self.sign(body, 27)
    }

    /// EIP-1559 transaction
    pub fn dynamic_fee(
        &mut self,
        chain_id: u64,
        to: Option<Address>,
        value: U256,
        gas_limit: u64,
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    ) -> SignedTransaction {
        let body = TransactionBody::DynamicFee(DynamicFeeTx {
            chain_id,
            nonce: self.next_nonce(),
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to,
            value,
            data: Bytes::new(),
            access_list: Vec::new(),
        });
        self.sign(body, 0)
    }

    fn next_nonce(&mut self) -> u64 {
        let nonce = self.nonce;
        self.nonce += 1;
        nonce
    }

    fn sign(&self, body: TransactionBody, v_base: u64) -> SignedTransaction {
        let mut tx = SignedTransaction::new(body, TxSignature::new(v_base, U256::zero(), U256::zero()));
        let sig = sign(&tx.signing_hash(), &self.key).expect("signing succeeds");
        tx.signature = TxSignature::new(
            v_base + sig.v as u64,
            U256::from_big_endian(&sig.r),
            U256::from_big_endian(&sig.s),
        );
        tx
    }
}

/// Genesis state builder
#[derive(Default)]
pub struct GenesisAlloc {
    state: WorldState,
}

impl GenesisAlloc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fund(mut self, address: Address, balance: U256) -> Self {
        self.state.set_balance(&address, balance);
        self
    }

    pub fn contract(mut self, address: Address, code: &[u8]) -> Self {
        self.state.set_code(&address, Bytes::copy_from_slice(code));
        self
    }

    pub fn chain(self, config: ChainConfig) -> BlockChain {
        BlockChain::from_genesis(config, &Genesis::default(), self.state)
    }
}

/// Valid header of a child of `parent`, without execution commitments
pub fn child_header(
    chain: &BlockChain,
    parent: &BlockHeader,
    coinbase: Address,
    ommers: &[BlockHeader],
) -> BlockHeader {
    let number = parent.number + 1;
    let timestamp = parent.timestamp + BLOCK_TIME;
    let rules = chain.config().fork_for(number, timestamp);
    let london_activation = chain.config().is_activation_block(Fork::London, number);
    let base_fee_per_gas = match parent.base_fee_per_gas {
        _ if !rules.base_fee => None,
        Some(base_fee) if !london_activation => {
            Some(calculate_base_fee(parent.gas_limit, parent.gas_used, base_fee))
        }
        _ => Some(U256::from(INITIAL_BASE_FEE)),
    };
    // the gas target stays put across the London transition
    let gas_limit = if london_activation {
        parent.gas_limit * 2
    } else {
        parent.gas_limit
    };
    BlockHeader {
        parent_hash: parent.hash(),
        ommers_hash: compute_ommers_hash(ommers),
        coinbase,
        number,
        timestamp,
        gas_limit,
        difficulty: calculate_difficulty(&rules, number, timestamp, parent),
        base_fee_per_gas,
        ..Default::default()
    }
}

/// Fill the execution commitments of `header` by running the block on a copy
/// of the chain state
pub fn seal(
    chain: &BlockChain,
    mut header: BlockHeader,
    transactions: Vec<SignedTransaction>,
    ommers: Vec<BlockHeader>,
) -> (Block, BlockExecutionResult) {
    let mut state = chain.state().clone();
    let unsealed = Block::new(header.clone(), transactions.clone(), ommers.clone());
    let result = BlockExecutor::new(chain.block_env(&header), &mut state)
        .execute_block(&unsealed)
        .expect("block executes");

    header.gas_used = result.gas_used;
    header.transactions_root = result.transactions_root;
    header.receipts_root = result.receipts_root;
    header.logs_bloom = result.logs_bloom;
    header.state_root = result.state_root;
    (Block::new(header, transactions, ommers), result)
}

/// Sealed child of the chain head mined by [`MINER`]
pub fn next_block(chain: &BlockChain, transactions: Vec<SignedTransaction>) -> Block {
    next_block_with(chain, MINER, transactions, Vec::new()).0
}

/// Sealed child of the chain head with an explicit miner and ommers
pub fn next_block_with(
    chain: &BlockChain,
    coinbase: Address,
    transactions: Vec<SignedTransaction>,
    ommers: Vec<BlockHeader>,
) -> (Block, BlockExecutionResult) {
    let header = child_header(chain, &chain.head().header, coinbase, &ommers);
    seal(chain, header, transactions, ommers)
}

/// Sum of all balances in `state`
pub fn total_balance(state: &WorldState) -> U256 {
    state
        .accounts()
        .fold(U256::zero(), |total, (_, account)| total + account.balance)
}

/// Storage key holding the integer `n`
pub fn slot(n: u8) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[31] = n;
    H256::from_bytes(bytes)
}

/// Decode hex bytecode
pub fn code(hex_code: &str) -> Vec<u8> {
    hex::decode(hex_code).expect("valid hex")
}
