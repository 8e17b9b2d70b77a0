//! Ommer validation and block rewards

use crate::error::OmmerError;
use crate::header::validate_header;
use std::collections::HashSet;
use strata_forks::{ChainConfig, ForkRules};
use strata_primitives::{H256, U256};
use strata_state::{StateResult, WorldState};
use strata_types::{compute_ommers_hash, Block, BlockHeader};

/// Most ommers a block may include
pub const MAX_OMMERS: usize = 2;
/// Oldest ommer generation a block may include
pub const MAX_OMMER_DEPTH: u64 = 6;

/// Check `ommers` of the block with `header` against the recent canonical
/// blocks, oldest first and ending with the block's parent.
pub fn validate_ommers(
    config: &ChainConfig,
    recent: &[Block],
    header: &BlockHeader,
    ommers: &[BlockHeader],
) -> Result<(), OmmerError> {
    let ommers_hash = compute_ommers_hash(ommers);
    if ommers_hash != header.ommers_hash {
        return Err(OmmerError::Hash {
            expected: ommers_hash,
            got: header.ommers_hash,
        });
    }
    if ommers.is_empty() {
        return Ok(());
    }
    if ommers.len() > MAX_OMMERS {
        return Err(OmmerError::TooMany(ommers.len()));
    }

    let hashes: Vec<H256> = ommers.iter().map(BlockHeader::hash).collect();
    let mut seen = HashSet::new();
    for hash in &hashes {
        if !seen.insert(*hash) {
            return Err(OmmerError::Duplicate(*hash));
        }
    }

    let window = recent.len().saturating_sub(MAX_OMMER_DEPTH as usize + 1);
    let canonical = &recent[window..];
    let canonical_hashes: HashSet<H256> = canonical.iter().map(Block::hash).collect();
    let included: HashSet<H256> = canonical
        .iter()
        .flat_map(|block| block.ommers.iter().map(BlockHeader::hash))
        .collect();
    let block_hash = header.hash();

    for (ommer, hash) in ommers.iter().zip(hashes) {
        let age = header.number.saturating_sub(ommer.number);
        if ommer.number >= header.number || !(1..=MAX_OMMER_DEPTH).contains(&age) {
            return Err(OmmerError::Age { hash, age });
        }

        let parent = recent
            .len()
            .checked_sub(age as usize + 1)
            .map(|index| &recent[index].header)
            .ok_or(OmmerError::UnknownParent(hash))?;
        validate_header(config, ommer, parent)
            .map_err(|source| OmmerError::Header { hash, source })?;

        if hash == block_hash || canonical_hashes.contains(&hash) {
            return Err(OmmerError::Canonical(hash));
        }
        if included.contains(&hash) {
            return Err(OmmerError::AlreadyIncluded(hash));
        }
        if !canonical_hashes.contains(&ommer.parent_hash) {
            return Err(OmmerError::UnknownParent(hash));
        }
        if ommer.parent_hash == header.parent_hash {
            return Err(OmmerError::Sibling(hash));
        }
    }
    Ok(())
}

/// Reward of an ommer included `age` blocks later
pub fn ommer_reward(block_reward: U256, age: u64) -> U256 {
    block_reward * U256::from(8u64.saturating_sub(age)) / U256::from(8)
}

/// Credit the block and ommer rewards for the block with `header`
pub fn pay_rewards(
    state: &mut WorldState,
    rules: &ForkRules,
    header: &BlockHeader,
    ommers: &[BlockHeader],
) -> StateResult<()> {
    let reward = rules.block_reward;
    let miner_reward = reward + reward / U256::from(32) * U256::from(ommers.len());
    state.add_balance(&header.coinbase, miner_reward)?;

    for ommer in ommers {
        let age = header.number - ommer.number;
        state.add_balance(&ommer.coinbase, ommer_reward(reward, age))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::calculate_difficulty;
    use strata_forks::Fork;
    use strata_primitives::Address;
    use strata_types::EMPTY_OMMERS_HASH;

    fn child(config: &ChainConfig, parent: &BlockHeader, coinbase: u64) -> BlockHeader {
        let number = parent.number + 1;
        let timestamp = parent.timestamp + 10;
        BlockHeader {
            parent_hash: parent.hash(),
            coinbase: Address::from_low_u64(coinbase),
            number,
            timestamp,
            gas_limit: parent.gas_limit,
            ommers_hash: EMPTY_OMMERS_HASH,
            difficulty: calculate_difficulty(
                &config.fork_for(number, timestamp),
                number,
                timestamp,
                parent,
            ),
            ..Default::default()
        }
    }

    /// Canonical chain of `length` blocks on a fixed genesis
    fn chain(config: &ChainConfig, length: usize) -> Vec<Block> {
        let genesis = BlockHeader {
            gas_limit: 1_000_000,
            difficulty: U256::from(1_000_000),
            ommers_hash: EMPTY_OMMERS_HASH,
            ..Default::default()
        };
        let mut blocks = vec![Block::new(genesis, Vec::new(), Vec::new())];
        while blocks.len() < length {
            let parent = &blocks[blocks.len() - 1].header;
            let header = child(config, parent, 1);
            blocks.push(Block::new(header, Vec::new(), Vec::new()));
        }
        blocks
    }

    fn nephew(config: &ChainConfig, recent: &[Block], ommers: &[BlockHeader]) -> BlockHeader {
        let mut header = child(config, &recent[recent.len() - 1].header, 1);
        header.ommers_hash = compute_ommers_hash(ommers);
        header
    }

    // ==================== Validation ====================

    #[test]
    fn test_accepts_generation_two_ommer() {
        let config = ChainConfig::single(Fork::Byzantium);
        let recent = chain(&config, 4);
        // sibling of block 2, included by block 4
        let ommer = child(&config, &recent[1].header, 0xaa);
        let header = nephew(&config, &recent, std::slice::from_ref(&ommer));
        assert_eq!(validate_ommers(&config, &recent, &header, &[ommer]), Ok(()));
    }

    #[test]
    fn test_rejects_same_height_ommer() {
        let config = ChainConfig::single(Fork::Byzantium);
        let recent = chain(&config, 4);
        let ommer = child(&config, &recent[3].header, 0xaa);
        let header = nephew(&config, &recent, std::slice::from_ref(&ommer));
        assert!(matches!(
            validate_ommers(&config, &recent, &header, &[ommer]),
            Err(OmmerError::Age { age: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_canonical_block_as_ommer() {
        let config = ChainConfig::single(Fork::Byzantium);
        let recent = chain(&config, 4);
        let ommer = recent[2].header.clone();
        let header = nephew(&config, &recent, std::slice::from_ref(&ommer));
        assert!(matches!(
            validate_ommers(&config, &recent, &header, &[ommer]),
            Err(OmmerError::Canonical(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_and_too_many() {
        let config = ChainConfig::single(Fork::Byzantium);
        let recent = chain(&config, 4);
        let ommer = child(&config, &recent[1].header, 0xaa);
        let twice = vec![ommer.clone(), ommer.clone()];
        let header = nephew(&config, &recent, &twice);
        assert!(matches!(
            validate_ommers(&config, &recent, &header, &twice),
            Err(OmmerError::Duplicate(_))
        ));

        let three: Vec<_> = (0..3)
            .map(|i| child(&config, &recent[1].header, 0xa0 + i))
            .collect();
        let header = nephew(&config, &recent, &three);
        assert_eq!(
            validate_ommers(&config, &recent, &header, &three),
            Err(OmmerError::TooMany(3))
        );
    }

    #[test]
    fn test_rejects_ommers_hash_mismatch() {
        let config = ChainConfig::single(Fork::Byzantium);
        let recent = chain(&config, 4);
        let ommer = child(&config, &recent[1].header, 0xaa);
        let header = nephew(&config, &recent, &[]);
        assert!(matches!(
            validate_ommers(&config, &recent, &header, &[ommer]),
            Err(OmmerError::Hash { .. })
        ));
    }

    #[test]
    fn test_rejects_ommer_too_old() {
        let config = ChainConfig::single(Fork::Byzantium);
        let recent = chain(&config, 10);
        // a sibling of block 2 is eight generations back from block 10
        let ommer = child(&config, &recent[1].header, 0xaa);
        let header = nephew(&config, &recent, std::slice::from_ref(&ommer));
        assert!(matches!(
            validate_ommers(&config, &recent, &header, &[ommer]),
            Err(OmmerError::Age { age: 8, .. })
        ));
    }

    #[test]
    fn test_rejects_ommer_with_bad_header() {
        let config = ChainConfig::single(Fork::Byzantium);
        let recent = chain(&config, 4);
        let mut ommer = child(&config, &recent[1].header, 0xaa);
        ommer.difficulty += U256::one();
        let header = nephew(&config, &recent, std::slice::from_ref(&ommer));
        assert!(matches!(
            validate_ommers(&config, &recent, &header, &[ommer]),
            Err(OmmerError::Header { .. })
        ));
    }

    #[test]
    fn test_rejects_previously_included_ommer() {
        let config = ChainConfig::single(Fork::Byzantium);
        let mut recent = chain(&config, 3);
        let ommer = child(&config, &recent[1].header, 0xaa);
        let header = nephew(&config, &recent, std::slice::from_ref(&ommer));
        recent.push(Block::new(header, Vec::new(), vec![ommer.clone()]));

        let header = nephew(&config, &recent, std::slice::from_ref(&ommer));
        assert!(matches!(
            validate_ommers(&config, &recent, &header, &[ommer]),
            Err(OmmerError::AlreadyIncluded(_))
        ));
    }

    // ==================== Rewards ====================

    #[test]
    fn test_rewards() {
        let rules = ForkRules::for_fork(Fork::Byzantium);
        let header = BlockHeader {
            number: 10,
            coinbase: Address::from_low_u64(1),
            ..Default::default()
        };
        let ommer = BlockHeader {
            number: 8,
            coinbase: Address::from_low_u64(2),
            ..Default::default()
        };
        let mut state = WorldState::new();
        pay_rewards(&mut state, &rules, &header, &[ommer]).unwrap();

        let three_ether = U256::exp10(18) * 3;
        assert_eq!(
            state.balance(&Address::from_low_u64(1)),
            three_ether + three_ether / 32
        );
        assert_eq!(
            state.balance(&Address::from_low_u64(2)),
            three_ether * 6 / 8
        );
    }

    #[test]
    fn test_ommer_reward_by_age() {
        let reward = U256::exp10(18) * 5;
        assert_eq!(ommer_reward(reward, 1), reward * 7 / 8);
        assert_eq!(ommer_reward(reward, 6), reward * 2 / 8);
    }
}
