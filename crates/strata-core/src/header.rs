//! Header validation against the parent header

use crate::error::HeaderError;
use strata_forks::{ChainConfig, DifficultyRule, Fork, ForkRules};
use strata_primitives::U256;
use strata_types::{BlockHeader, EMPTY_OMMERS_HASH};

/// Lowest difficulty any block may have
pub const MINIMUM_DIFFICULTY: u64 = 131_072;
/// Lowest gas limit any block may have
pub const GAS_LIMIT_MINIMUM: u64 = 5_000;
/// Divisor bounding the gas limit change per block
pub const GAS_LIMIT_ADJUSTMENT_FACTOR: u64 = 1_024;
/// Base fee of the first London block
pub const INITIAL_BASE_FEE: u64 = 1_000_000_000;
/// EIP-1559 gas target divisor
pub const ELASTICITY_MULTIPLIER: u64 = 2;
/// EIP-1559 base fee change divisor
pub const BASE_FEE_MAX_CHANGE_DENOMINATOR: u64 = 8;
/// Longest extra data
pub const MAX_EXTRA_DATA: usize = 32;

const DIFFICULTY_BOUND_DIVISOR: u64 = 2_048;
const BOMB_PERIOD: u64 = 100_000;

/// Check `header` against `parent` under the rules active at `header.number`
pub fn validate_header(
    config: &ChainConfig,
    header: &BlockHeader,
    parent: &BlockHeader,
) -> Result<(), HeaderError> {
    let rules = config.fork_for(header.number, header.timestamp);

    let parent_hash = parent.hash();
    if header.parent_hash != parent_hash {
        return Err(HeaderError::ParentHash {
            expected: parent_hash,
            got: header.parent_hash,
        });
    }
    let expected_number = parent.number + 1;
    if header.number != expected_number {
        return Err(HeaderError::Number {
            expected: expected_number,
            got: header.number,
        });
    }
    if header.gas_used > header.gas_limit {
        return Err(HeaderError::GasUsed {
            used: header.gas_used,
            limit: header.gas_limit,
        });
    }

    let london_activation = config.is_activation_block(Fork::London, header.number);
    let parent_gas_limit = if london_activation {
        parent.gas_limit * ELASTICITY_MULTIPLIER
    } else {
        parent.gas_limit
    };
    if !check_gas_limit(header.gas_limit, parent_gas_limit) {
        return Err(HeaderError::GasLimit {
            limit: header.gas_limit,
            parent: parent_gas_limit,
        });
    }

    if header.timestamp <= parent.timestamp {
        return Err(HeaderError::Timestamp {
            timestamp: header.timestamp,
            parent: parent.timestamp,
        });
    }
    if header.extra_data.len() > MAX_EXTRA_DATA {
        return Err(HeaderError::ExtraData(header.extra_data.len()));
    }

    let difficulty = calculate_difficulty(&rules, header.number, header.timestamp, parent);
    if header.difficulty != difficulty {
        return Err(HeaderError::Difficulty {
            expected: difficulty,
            got: header.difficulty,
        });
    }

    let expected_base_fee = match parent.base_fee_per_gas {
        _ if !rules.base_fee => None,
        Some(fee) if !london_activation => {
            Some(calculate_base_fee(parent_gas_limit, parent.gas_used, fee))
        }
        _ => Some(U256::from(INITIAL_BASE_FEE)),
    };
    if header.base_fee_per_gas != expected_base_fee {
        return Err(HeaderError::BaseFee {
            expected: expected_base_fee,
            got: header.base_fee_per_gas,
        });
    }

    Ok(())
}

/// Whether `gas_limit` is within 1/1024 of `parent_gas_limit` and above the minimum
pub fn check_gas_limit(gas_limit: u64, parent_gas_limit: u64) -> bool {
    let max_delta = parent_gas_limit / GAS_LIMIT_ADJUSTMENT_FACTOR;
    gas_limit < parent_gas_limit.saturating_add(max_delta)
        && gas_limit > parent_gas_limit.saturating_sub(max_delta)
        && gas_limit >= GAS_LIMIT_MINIMUM
}

/// EIP-1559 base fee of a child of a block with these values.
///
/// `parent_gas_limit` is already doubled at the London activation block.
pub fn calculate_base_fee(parent_gas_limit: u64, parent_gas_used: u64, parent_base_fee: U256) -> U256 {
    let target = parent_gas_limit / ELASTICITY_MULTIPLIER;
    if target == 0 || parent_gas_used == target {
        return parent_base_fee;
    }
    if parent_gas_used > target {
        let delta = parent_base_fee * U256::from(parent_gas_used - target)
            / U256::from(target)
            / U256::from(BASE_FEE_MAX_CHANGE_DENOMINATOR);
        parent_base_fee + delta.max(U256::one())
    } else {
        let delta = parent_base_fee * U256::from(target - parent_gas_used)
            / U256::from(target)
            / U256::from(BASE_FEE_MAX_CHANGE_DENOMINATOR);
        parent_base_fee.saturating_sub(delta)
    }
}

/// Expected difficulty of block `number` with `timestamp` on top of `parent`
pub fn calculate_difficulty(
    rules: &ForkRules,
    number: u64,
    timestamp: u64,
    parent: &BlockHeader,
) -> U256 {
    let elapsed = timestamp.saturating_sub(parent.timestamp);
    let factor: i64 = match rules.difficulty {
        DifficultyRule::Frontier => {
            if elapsed < 13 {
                1
            } else {
                -1
            }
        }
        DifficultyRule::Homestead => (1 - (elapsed / 10).min(1_000) as i64).max(-99),
        DifficultyRule::Byzantium => {
            let base = if parent.ommers_hash == EMPTY_OMMERS_HASH {
                1
            } else {
                2
            };
            (base - (elapsed / 9).min(1_000) as i64).max(-99)
        }
    };

    let step = parent.difficulty / U256::from(DIFFICULTY_BOUND_DIVISOR);
    let adjustment = step * U256::from(factor.unsigned_abs());
    let mut difficulty = if factor >= 0 {
        parent.difficulty.saturating_add(adjustment)
    } else {
        parent.difficulty.saturating_sub(adjustment)
    };

    let periods = number.saturating_sub(rules.bomb_delay) / BOMB_PERIOD;
    if periods >= 2 {
        difficulty = difficulty.saturating_add(U256::one() << (periods - 2) as usize);
    }
    difficulty.max(U256::from(MINIMUM_DIFFICULTY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn parent(difficulty: u64, timestamp: u64) -> BlockHeader {
        BlockHeader {
            number: 10,
            difficulty: U256::from(difficulty),
            timestamp,
            gas_limit: 1_000_000,
            ommers_hash: EMPTY_OMMERS_HASH,
            ..Default::default()
        }
    }

    fn child_of(config: &ChainConfig, parent: &BlockHeader, timestamp: u64) -> BlockHeader {
        let rules = config.fork_for(parent.number + 1, timestamp);
        BlockHeader {
            parent_hash: parent.hash(),
            number: parent.number + 1,
            gas_limit: parent.gas_limit,
            timestamp,
            difficulty: calculate_difficulty(&rules, parent.number + 1, timestamp, parent),
            ommers_hash: EMPTY_OMMERS_HASH,
            ..Default::default()
        }
    }

    // ==================== Difficulty ====================

    #[test]
    fn test_frontier_difficulty_step() {
        let rules = ForkRules::for_fork(Fork::Frontier);
        let p = parent(2_048_000, 100);
        assert_eq!(calculate_difficulty(&rules, 11, 112, &p), U256::from(2_049_000));
        assert_eq!(calculate_difficulty(&rules, 11, 113, &p), U256::from(2_047_000));
    }

    #[test]
    fn test_homestead_difficulty_buckets() {
        let rules = ForkRules::for_fork(Fork::Homestead);
        let p = parent(2_048_000, 100);
        assert_eq!(calculate_difficulty(&rules, 11, 109, &p), U256::from(2_049_000));
        assert_eq!(calculate_difficulty(&rules, 11, 115, &p), U256::from(2_048_000));
        assert_eq!(calculate_difficulty(&rules, 11, 125, &p), U256::from(2_047_000));
        // clamped at -99 steps
        assert_eq!(calculate_difficulty(&rules, 11, 100_000, &p), U256::from(2_048_000 - 99_000));
    }

    #[test]
    fn test_byzantium_counts_parent_ommers() {
        let rules = ForkRules::for_fork(Fork::Byzantium);
        let mut p = parent(2_048_000, 100);
        assert_eq!(calculate_difficulty(&rules, 11, 110, &p), U256::from(2_048_000));
        p.ommers_hash = strata_primitives::H256::from_word(U256::one());
        assert_eq!(calculate_difficulty(&rules, 11, 110, &p), U256::from(2_049_000));
    }

    #[test]
    fn test_difficulty_floor_and_bomb() {
        let rules = ForkRules::for_fork(Fork::Frontier);
        let p = parent(131_072, 100);
        assert_eq!(calculate_difficulty(&rules, 11, 200, &p), U256::from(MINIMUM_DIFFICULTY));
        // third bomb period adds 2^1
        let p = parent(2_048_000, 100);
        assert_eq!(
            calculate_difficulty(&rules, 300_000, 110, &p),
            U256::from(2_049_000 + 2)
        );
        // Byzantium delays the bomb by three million blocks
        let byzantium = ForkRules::for_fork(Fork::Byzantium);
        assert_eq!(
            calculate_difficulty(&byzantium, 3_000_000, 110, &p),
            U256::from(2_048_000)
        );
    }

    // ==================== Gas limit and base fee ====================

    #[test]
    fn test_gas_limit_bounds() {
        assert!(check_gas_limit(1_000_975, 1_000_000));
        assert!(!check_gas_limit(1_000_976, 1_000_000));
        assert!(check_gas_limit(999_025, 1_000_000));
        assert!(!check_gas_limit(999_024, 1_000_000));
        assert!(!check_gas_limit(4_999, 5_000));
    }

    #[test]
    fn test_base_fee_moves_toward_target() {
        let fee = U256::from(INITIAL_BASE_FEE);
        assert_eq!(calculate_base_fee(20_000_000, 10_000_000, fee), fee);
        assert_eq!(
            calculate_base_fee(20_000_000, 20_000_000, fee),
            U256::from(1_125_000_000u64)
        );
        assert_eq!(calculate_base_fee(20_000_000, 0, fee), U256::from(875_000_000u64));
        // increase is at least one wei
        assert_eq!(calculate_base_fee(20_000_000, 10_000_001, U256::from(8)), U256::from(9));
    }

    // ==================== Header checks ====================

    #[test]
    fn test_valid_child_header() {
        let config = ChainConfig::single(Fork::Byzantium);
        let p = parent(2_048_000, 100);
        let header = child_of(&config, &p, 110);
        assert_eq!(validate_header(&config, &header, &p), Ok(()));
    }

    #[test]
    fn test_rejects_bad_parent_hash_and_number() {
        let config = ChainConfig::single(Fork::Byzantium);
        let p = parent(2_048_000, 100);

        let mut header = child_of(&config, &p, 110);
        header.parent_hash = strata_primitives::H256::ZERO;
        assert!(matches!(
            validate_header(&config, &header, &p),
            Err(HeaderError::ParentHash { .. })
        ));

        let mut header = child_of(&config, &p, 110);
        header.number = 12;
        assert_eq!(
            validate_header(&config, &header, &p),
            Err(HeaderError::Number { expected: 11, got: 12 })
        );
    }

    #[test]
    fn test_rejects_timestamp_extra_data_and_difficulty() {
        let config = ChainConfig::single(Fork::Byzantium);
        let p = parent(2_048_000, 100);

        let mut header = child_of(&config, &p, 110);
        header.timestamp = 100;
        assert!(matches!(
            validate_header(&config, &header, &p),
            Err(HeaderError::Timestamp { .. })
        ));

        let mut header = child_of(&config, &p, 110);
        header.extra_data = Bytes::from(vec![0u8; 33]);
        assert_eq!(validate_header(&config, &header, &p), Err(HeaderError::ExtraData(33)));

        let mut header = child_of(&config, &p, 110);
        header.difficulty += U256::one();
        assert!(matches!(
            validate_header(&config, &header, &p),
            Err(HeaderError::Difficulty { .. })
        ));
    }

    #[test]
    fn test_rejects_gas_used_above_limit() {
        let config = ChainConfig::single(Fork::Byzantium);
        let p = parent(2_048_000, 100);
        let mut header = child_of(&config, &p, 110);
        header.gas_used = header.gas_limit + 1;
        assert!(matches!(
            validate_header(&config, &header, &p),
            Err(HeaderError::GasUsed { .. })
        ));
    }

    #[test]
    fn test_london_activation_block() {
        let config = ChainConfig {
            london_block: Some(11),
            ..ChainConfig::single(Fork::Berlin)
        };
        let p = parent(2_048_000, 100);
        let mut header = child_of(&config, &p, 110);
        // elasticity doubles the parent limit at the fork block
        header.gas_limit = 2_000_000;
        header.base_fee_per_gas = Some(U256::from(INITIAL_BASE_FEE));
        assert_eq!(validate_header(&config, &header, &p), Ok(()));

        // the empty parent does not lower the first base fee
        header.base_fee_per_gas = Some(U256::from(875_000_000u64));
        assert_eq!(
            validate_header(&config, &header, &p),
            Err(HeaderError::BaseFee {
                expected: Some(U256::from(INITIAL_BASE_FEE)),
                got: Some(U256::from(875_000_000u64)),
            })
        );

        header.base_fee_per_gas = None;
        assert!(matches!(
            validate_header(&config, &header, &p),
            Err(HeaderError::BaseFee { .. })
        ));
    }

    #[test]
    fn test_block_after_london_activation() {
        let config = ChainConfig {
            london_block: Some(11),
            ..ChainConfig::single(Fork::Berlin)
        };
        let mut p = parent(2_048_000, 100);
        p.number = 11;
        p.gas_limit = 2_000_000;
        p.base_fee_per_gas = Some(U256::from(INITIAL_BASE_FEE));

        let mut header = child_of(&config, &p, 110);
        // parent limit is no longer doubled
        header.gas_limit = 2_000_000;
        header.base_fee_per_gas = Some(U256::from(875_000_000u64));
        assert_eq!(validate_header(&config, &header, &p), Ok(()));

        header.base_fee_per_gas = Some(U256::from(INITIAL_BASE_FEE));
        assert_eq!(
            validate_header(&config, &header, &p),
            Err(HeaderError::BaseFee {
                expected: Some(U256::from(875_000_000u64)),
                got: Some(U256::from(INITIAL_BASE_FEE)),
            })
        );

        header.base_fee_per_gas = Some(U256::from(875_000_000u64));
        header.gas_limit = 4_000_000;
        assert!(matches!(
            validate_header(&config, &header, &p),
            Err(HeaderError::GasLimit { .. })
        ));
    }
}
