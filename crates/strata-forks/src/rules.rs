//! Rule table: the parameters that vary between forks

use crate::Fork;
use strata_primitives::{Address, U256};

/// Fork-dependent gas prices. Costs that never changed live with the
/// interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasSchedule {
    /// SLOAD; from Berlin the warm cost
    pub sload: u64,
    /// BALANCE; from Berlin the warm cost
    pub balance: u64,
    /// EXTCODESIZE / EXTCODECOPY base; from Berlin the warm cost
    pub ext_code: u64,
    /// EXTCODEHASH; from Berlin the warm cost
    pub ext_code_hash: u64,
    /// CALL family base; from Berlin the warm cost
    pub call: u64,
    /// SELFDESTRUCT base
    pub selfdestruct: u64,
    /// EXP cost per exponent byte
    pub exp_byte: u64,
    /// SSTORE from zero to non-zero
    pub sstore_set: u64,
    /// SSTORE of a non-zero slot
    pub sstore_reset: u64,
    /// Refund for clearing a slot
    pub sstore_clear_refund: u64,
    /// Refund per self-destructed account
    pub selfdestruct_refund: u64,
    /// EIP-2929 cold storage read surcharge
    pub cold_sload: u64,
    /// EIP-2929 cold account access
    pub cold_account_access: u64,
    /// Intrinsic cost of a contract-creating transaction on top of the base
    pub tx_create: u64,
    /// Intrinsic cost per non-zero data byte
    pub tx_data_nonzero: u64,
    /// alt_bn128 addition
    pub bn_add: u64,
    /// alt_bn128 scalar multiplication
    pub bn_mul: u64,
    /// alt_bn128 pairing base cost
    pub bn_pairing_base: u64,
    /// alt_bn128 pairing cost per point pair
    pub bn_pairing_per_pair: u64,
}

/// Block difficulty adjustment rule
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DifficultyRule {
    /// Step of 1/2048 depending on a 13 second threshold
    Frontier,
    /// EIP-2: proportional to the block time in 10 second buckets
    Homestead,
    /// EIP-100: counts ommers, 9 second buckets
    Byzantium,
}

/// Everything that depends on the active fork, computed once per block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForkRules {
    /// Active fork
    pub fork: Fork,
    /// Gas prices
    pub gas: GasSchedule,
    /// Base block reward in wei
    pub block_reward: U256,
    /// Difficulty bomb delay in blocks
    pub bomb_delay: u64,
    /// Difficulty formula
    pub difficulty: DifficultyRule,
    /// Highest precompile address
    pub precompile_count: u8,
    /// Divisor capping the gas refund
    pub refund_quotient: u64,
    /// EIP-170 code size limit
    pub max_code_size: Option<usize>,
    /// EIP-2: signatures need s <= n/2
    pub low_s_signatures: bool,
    /// EIP-2: code deposit out-of-gas fails the creation
    pub create_deposit_oog_fails: bool,
    /// EIP-150: calls forward at most 63/64 of the remaining gas
    pub all_but_one_64th: bool,
    /// EIP-155 replay-protected signatures are accepted
    pub replay_protection: bool,
    /// EIP-161: state clearing, new-account rules, contract nonce 1
    pub state_clearing: bool,
    /// EIP-658: receipts carry a status code
    pub status_receipts: bool,
    /// EIP-1283 / EIP-2200 net SSTORE metering
    pub sstore_net_metering: bool,
    /// EIP-2200: SSTORE needs more than the call stipend left
    pub sstore_sentry: bool,
    /// EIP-2929 / EIP-2930 access sets and access-list transactions
    pub access_lists: bool,
    /// EIP-2565 modexp pricing
    pub modexp_repriced: bool,
    /// EIP-1559 base fee and dynamic fee transactions
    pub base_fee: bool,
    /// EIP-3541: new code may not start with 0xEF
    pub reject_ef_code: bool,
    opcodes: [bool; 256],
}

const FRONTIER_OPCODES: &[std::ops::RangeInclusive<u8>] = &[
    0x00..=0x0b,
    0x10..=0x1a,
    0x20..=0x20,
    0x30..=0x3c,
    0x40..=0x45,
    0x50..=0x5b,
    0x60..=0xa4,
    0xf0..=0xf3,
    0xff..=0xff,
];

fn ether(amount: u64) -> U256 {
    U256::exp10(18) * amount
}

impl ForkRules {
    fn frontier() -> Self {
        let mut opcodes = [false; 256];
        for range in FRONTIER_OPCODES {
            for op in range.clone() {
                opcodes[op as usize] = true;
            }
        }

        Self {
            fork: Fork::Frontier,
            gas: GasSchedule {
                sload: 50,
                balance: 20,
                ext_code: 20,
                ext_code_hash: 400,
                call: 40,
                selfdestruct: 0,
                exp_byte: 10,
                sstore_set: 20000,
                sstore_reset: 5000,
                sstore_clear_refund: 15000,
                selfdestruct_refund: 24000,
                cold_sload: 0,
                cold_account_access: 0,
                tx_create: 0,
                tx_data_nonzero: 68,
                bn_add: 500,
                bn_mul: 40000,
                bn_pairing_base: 100000,
                bn_pairing_per_pair: 80000,
            },
            block_reward: ether(5),
            bomb_delay: 0,
            difficulty: DifficultyRule::Frontier,
            precompile_count: 4,
            refund_quotient: 2,
            max_code_size: None,
            low_s_signatures: false,
            create_deposit_oog_fails: false,
            all_but_one_64th: false,
            replay_protection: false,
            state_clearing: false,
            status_receipts: false,
            sstore_net_metering: false,
            sstore_sentry: false,
            access_lists: false,
            modexp_repriced: false,
            base_fee: false,
            reject_ef_code: false,
            opcodes,
        }
    }

    fn enable(&mut self, opcodes: &[u8]) {
        for &op in opcodes {
            self.opcodes[op as usize] = true;
        }
    }

    /// Apply the changes introduced by `upgrade`
    fn apply(&mut self, upgrade: Fork) {
        match upgrade {
            Fork::Frontier => {}
            Fork::Homestead => {
                self.difficulty = DifficultyRule::Homestead;
                self.gas.tx_create = 32000;
                self.low_s_signatures = true;
                self.create_deposit_oog_fails = true;
                // DELEGATECALL
                self.enable(&[0xf4]);
            }
            Fork::TangerineWhistle => {
                self.gas.sload = 200;
                self.gas.balance = 400;
                self.gas.ext_code = 700;
                self.gas.call = 700;
                self.gas.selfdestruct = 5000;
                self.all_but_one_64th = true;
            }
            Fork::SpuriousDragon => {
                self.gas.exp_byte = 50;
                self.replay_protection = true;
                self.state_clearing = true;
                self.max_code_size = Some(0x6000);
            }
            Fork::Byzantium => {
                self.block_reward = ether(3);
                self.bomb_delay = 3_000_000;
                self.difficulty = DifficultyRule::Byzantium;
                self.precompile_count = 8;
                self.status_receipts = true;
                // RETURNDATASIZE, RETURNDATACOPY, STATICCALL, REVERT
                self.enable(&[0x3d, 0x3e, 0xfa, 0xfd]);
            }
            Fork::Constantinople => {
                self.block_reward = ether(2);
                self.bomb_delay = 5_000_000;
                self.sstore_net_metering = true;
                // SHL, SHR, SAR, EXTCODEHASH, CREATE2
                self.enable(&[0x1b, 0x1c, 0x1d, 0x3f, 0xf5]);
            }
            Fork::Petersburg => {
                self.sstore_net_metering = false;
            }
            Fork::Istanbul => {
                self.gas.sload = 800;
                self.gas.balance = 700;
                self.gas.ext_code_hash = 700;
                self.gas.tx_data_nonzero = 16;
                self.gas.bn_add = 150;
                self.gas.bn_mul = 6000;
                self.gas.bn_pairing_base = 45000;
                self.gas.bn_pairing_per_pair = 34000;
                self.precompile_count = 9;
                self.sstore_net_metering = true;
                self.sstore_sentry = true;
                // CHAINID, SELFBALANCE
                self.enable(&[0x46, 0x47]);
            }
            Fork::MuirGlacier => {
                self.bomb_delay = 9_000_000;
            }
            Fork::Berlin => {
                let warm = 100;
                self.gas.sload = warm;
                self.gas.balance = warm;
                self.gas.ext_code = warm;
                self.gas.ext_code_hash = warm;
                self.gas.call = warm;
                self.gas.cold_sload = 2100;
                self.gas.cold_account_access = 2600;
                self.gas.sstore_reset = 5000 - 2100;
                self.access_lists = true;
                self.modexp_repriced = true;
            }
            Fork::London => {
                self.bomb_delay = 9_700_000;
                self.gas.sstore_clear_refund = 4800;
                self.gas.selfdestruct_refund = 0;
                self.refund_quotient = 5;
                self.base_fee = true;
                self.reject_ef_code = true;
                // BASEFEE
                self.enable(&[0x48]);
            }
            Fork::ArrowGlacier => {
                self.bomb_delay = 10_700_000;
            }
            Fork::GrayGlacier => {
                self.bomb_delay = 11_400_000;
            }
        }
    }

    /// Rules in force under `fork`
    pub fn for_fork(fork: Fork) -> Self {
        let mut rules = Self::frontier();
        for upgrade in Fork::ALL.into_iter().take_while(|f| *f <= fork) {
            rules.apply(upgrade);
        }
        rules.fork = fork;
        rules
    }

    /// Whether `opcode` is defined under these rules
    pub fn is_opcode_enabled(&self, opcode: u8) -> bool {
        self.opcodes[opcode as usize]
    }

    /// Whether `address` is an active precompile
    pub fn is_precompile(&self, address: &Address) -> bool {
        let bytes = address.as_bytes();
        bytes[..19].iter().all(|&b| b == 0)
            && bytes[19] >= 1
            && bytes[19] <= self.precompile_count
    }

    /// Active precompile addresses
    pub fn precompiles(&self) -> impl Iterator<Item = Address> {
        (1..=self.precompile_count as u64).map(Address::from_low_u64)
    }

    /// Whether EIP-2718 transactions of `tx_type` may be included
    pub fn supports_tx_type(&self, tx_type: u8) -> bool {
        match tx_type {
            0 => true,
            1 => self.access_lists,
            2 => self.base_fee,
            _ => false,
        }
    }

    /// Whether the fork is `fork` or later
    pub fn is_at_least(&self, fork: Fork) -> bool {
        self.fork >= fork
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Gas schedule ====================

    #[test]
    fn test_sload_repricing() {
        assert_eq!(ForkRules::for_fork(Fork::Frontier).gas.sload, 50);
        assert_eq!(ForkRules::for_fork(Fork::Homestead).gas.sload, 50);
        assert_eq!(ForkRules::for_fork(Fork::TangerineWhistle).gas.sload, 200);
        assert_eq!(ForkRules::for_fork(Fork::Istanbul).gas.sload, 800);
        assert_eq!(ForkRules::for_fork(Fork::Berlin).gas.sload, 100);
    }

    #[test]
    fn test_refund_parameters() {
        let berlin = ForkRules::for_fork(Fork::Berlin);
        assert_eq!(berlin.refund_quotient, 2);
        assert_eq!(berlin.gas.sstore_clear_refund, 15000);
        assert_eq!(berlin.gas.sstore_reset, 2900);

        let london = ForkRules::for_fork(Fork::London);
        assert_eq!(london.refund_quotient, 5);
        assert_eq!(london.gas.sstore_clear_refund, 4800);
        assert_eq!(london.gas.selfdestruct_refund, 0);
    }

    #[test]
    fn test_net_metering_toggles() {
        assert!(ForkRules::for_fork(Fork::Constantinople).sstore_net_metering);
        assert!(!ForkRules::for_fork(Fork::Petersburg).sstore_net_metering);
        let istanbul = ForkRules::for_fork(Fork::Istanbul);
        assert!(istanbul.sstore_net_metering && istanbul.sstore_sentry);
    }

    #[test]
    fn test_block_rewards() {
        assert_eq!(ForkRules::for_fork(Fork::Homestead).block_reward, ether(5));
        assert_eq!(ForkRules::for_fork(Fork::Byzantium).block_reward, ether(3));
        assert_eq!(ForkRules::for_fork(Fork::London).block_reward, ether(2));
    }

    // ==================== Opcode table ====================

    #[test]
    fn test_opcode_gating() {
        let frontier = ForkRules::for_fork(Fork::Frontier);
        assert!(frontier.is_opcode_enabled(0x01));
        assert!(frontier.is_opcode_enabled(0x7f));
        assert!(!frontier.is_opcode_enabled(0xf4));
        assert!(!frontier.is_opcode_enabled(0xfe));

        assert!(ForkRules::for_fork(Fork::Homestead).is_opcode_enabled(0xf4));
        assert!(!ForkRules::for_fork(Fork::SpuriousDragon).is_opcode_enabled(0xfd));
        assert!(ForkRules::for_fork(Fork::Byzantium).is_opcode_enabled(0xfd));
        assert!(!ForkRules::for_fork(Fork::Byzantium).is_opcode_enabled(0x1b));
        assert!(ForkRules::for_fork(Fork::Petersburg).is_opcode_enabled(0xf5));
        assert!(!ForkRules::for_fork(Fork::Berlin).is_opcode_enabled(0x48));
        assert!(ForkRules::for_fork(Fork::London).is_opcode_enabled(0x48));
        // PUSH0 is a later fork
        assert!(!ForkRules::for_fork(Fork::GrayGlacier).is_opcode_enabled(0x5f));
    }

    // ==================== Precompiles and tx types ====================

    #[test]
    fn test_precompile_ranges() {
        let homestead = ForkRules::for_fork(Fork::Homestead);
        assert!(homestead.is_precompile(&Address::from_low_u64(4)));
        assert!(!homestead.is_precompile(&Address::from_low_u64(5)));
        assert!(!homestead.is_precompile(&Address::ZERO));

        let istanbul = ForkRules::for_fork(Fork::Istanbul);
        assert!(istanbul.is_precompile(&Address::from_low_u64(9)));
        assert_eq!(istanbul.precompiles().count(), 9);
    }

    #[test]
    fn test_tx_type_support() {
        assert!(!ForkRules::for_fork(Fork::Istanbul).supports_tx_type(1));
        assert!(ForkRules::for_fork(Fork::Berlin).supports_tx_type(1));
        assert!(!ForkRules::for_fork(Fork::Berlin).supports_tx_type(2));
        assert!(ForkRules::for_fork(Fork::London).supports_tx_type(2));
        assert!(!ForkRules::for_fork(Fork::London).supports_tx_type(3));
    }
}
