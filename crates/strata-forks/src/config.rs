//! Chain activation schedule

use crate::{Fork, ForkError, ForkRules};
use serde::{Deserialize, Serialize};

/// Chain id and the block at which each fork activates.
///
/// Uses the field names of a geth `genesis.json` `config` object, so such a
/// file can be loaded directly. A missing field means the fork never
/// activates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// EIP-155 chain id
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homestead_block: Option<u64>,
    #[serde(default, rename = "eip150Block", skip_serializing_if = "Option::is_none")]
    pub tangerine_whistle_block: Option<u64>,
    #[serde(default, rename = "eip158Block", skip_serializing_if = "Option::is_none")]
    pub spurious_dragon_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byzantium_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constantinople_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub petersburg_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub istanbul_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muir_glacier_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub berlin_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub london_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrow_glacier_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gray_glacier_block: Option<u64>,
}

fn default_chain_id() -> u64 {
    1
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::single(Fork::Frontier)
    }
}

impl ChainConfig {
    /// Ethereum mainnet
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            homestead_block: Some(1_150_000),
            tangerine_whistle_block: Some(2_463_000),
            spurious_dragon_block: Some(2_675_000),
            byzantium_block: Some(4_370_000),
            constantinople_block: Some(7_280_000),
            petersburg_block: Some(7_280_000),
            istanbul_block: Some(9_069_000),
            muir_glacier_block: Some(9_200_000),
            berlin_block: Some(12_244_000),
            london_block: Some(12_965_000),
            arrow_glacier_block: Some(13_773_000),
            gray_glacier_block: Some(15_050_000),
        }
    }

    /// `fork` and everything before it active from genesis
    pub fn single(fork: Fork) -> Self {
        let mut config = Self {
            chain_id: default_chain_id(),
            homestead_block: None,
            tangerine_whistle_block: None,
            spurious_dragon_block: None,
            byzantium_block: None,
            constantinople_block: None,
            petersburg_block: None,
            istanbul_block: None,
            muir_glacier_block: None,
            berlin_block: None,
            london_block: None,
            arrow_glacier_block: None,
            gray_glacier_block: None,
        };
        for upgrade in Fork::ALL.into_iter().take_while(|f| *f <= fork) {
            if let Some(slot) = config.activation_mut(upgrade) {
                *slot = Some(0);
            }
        }
        config
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ForkError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn activation_mut(&mut self, fork: Fork) -> Option<&mut Option<u64>> {
        Some(match fork {
            Fork::Frontier => return None,
            Fork::Homestead => &mut self.homestead_block,
            Fork::TangerineWhistle => &mut self.tangerine_whistle_block,
            Fork::SpuriousDragon => &mut self.spurious_dragon_block,
            Fork::Byzantium => &mut self.byzantium_block,
            Fork::Constantinople => &mut self.constantinople_block,
            Fork::Petersburg => &mut self.petersburg_block,
            Fork::Istanbul => &mut self.istanbul_block,
            Fork::MuirGlacier => &mut self.muir_glacier_block,
            Fork::Berlin => &mut self.berlin_block,
            Fork::London => &mut self.london_block,
            Fork::ArrowGlacier => &mut self.arrow_glacier_block,
            Fork::GrayGlacier => &mut self.gray_glacier_block,
        })
    }

    /// Block at which `fork` activates; Frontier is always active
    pub fn activation_block(&self, fork: Fork) -> Option<u64> {
        match fork {
            Fork::Frontier => Some(0),
            Fork::Homestead => self.homestead_block,
            Fork::TangerineWhistle => self.tangerine_whistle_block,
            Fork::SpuriousDragon => self.spurious_dragon_block,
            Fork::Byzantium => self.byzantium_block,
            Fork::Constantinople => self.constantinople_block,
            Fork::Petersburg => self.petersburg_block,
            Fork::Istanbul => self.istanbul_block,
            Fork::MuirGlacier => self.muir_glacier_block,
            Fork::Berlin => self.berlin_block,
            Fork::London => self.london_block,
            Fork::ArrowGlacier => self.arrow_glacier_block,
            Fork::GrayGlacier => self.gray_glacier_block,
        }
    }

    /// Activation blocks must not decrease along the fork sequence
    pub fn validate(&self) -> Result<(), ForkError> {
        let mut previous = (Fork::Frontier, 0);
        for fork in Fork::ALL.into_iter().skip(1) {
            if let Some(block) = self.activation_block(fork) {
                if block < previous.1 {
                    return Err(ForkError::OutOfOrder {
                        earlier: previous.0.name(),
                        earlier_block: previous.1,
                        later: fork.name(),
                        later_block: block,
                    });
                }
                previous = (fork, block);
            }
        }
        Ok(())
    }

    /// Latest fork active at block `number`
    pub fn fork_at(&self, number: u64) -> Fork {
        Fork::ALL
            .into_iter()
            .rev()
            .find(|fork| {
                self.activation_block(*fork)
                    .is_some_and(|block| block <= number)
            })
            .unwrap_or(Fork::Frontier)
    }

    /// Whether `number` is the first block of `fork`
    pub fn is_activation_block(&self, fork: Fork, number: u64) -> bool {
        self.activation_block(fork) == Some(number)
    }

    /// Rules for the block at `number`.
    ///
    /// `timestamp` is accepted for timestamp-scheduled forks; every fork in
    /// this table activates by block number.
    pub fn fork_for(&self, number: u64, _timestamp: u64) -> ForkRules {
        ForkRules::for_fork(self.fork_at(number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Mainnet schedule ====================

    #[test]
    fn test_mainnet_boundaries() {
        let mainnet = ChainConfig::mainnet();
        assert_eq!(mainnet.fork_at(0), Fork::Frontier);
        assert_eq!(mainnet.fork_at(1_149_999), Fork::Frontier);
        assert_eq!(mainnet.fork_at(1_150_000), Fork::Homestead);
        assert_eq!(mainnet.fork_at(2_463_000), Fork::TangerineWhistle);
        assert_eq!(mainnet.fork_at(7_280_000), Fork::Petersburg);
        assert_eq!(mainnet.fork_at(12_965_000), Fork::London);
        assert_eq!(mainnet.fork_at(20_000_000), Fork::GrayGlacier);
    }

    #[test]
    fn test_fork_for_boundary_sload() {
        let mainnet = ChainConfig::mainnet();
        assert_eq!(mainnet.fork_for(2_462_999, 0).gas.sload, 50);
        assert_eq!(mainnet.fork_for(2_463_000, 0).gas.sload, 200);
    }

    #[test]
    fn test_mainnet_is_valid() {
        assert!(ChainConfig::mainnet().validate().is_ok());
    }

    // ==================== Single-fork configs ====================

    #[test]
    fn test_single_fork() {
        let config = ChainConfig::single(Fork::Byzantium);
        assert_eq!(config.fork_at(0), Fork::Byzantium);
        assert_eq!(config.fork_at(1_000_000_000), Fork::Byzantium);
        assert_eq!(config.constantinople_block, None);
        assert_eq!(ChainConfig::default().fork_at(5), Fork::Frontier);
    }

    // ==================== JSON ====================

    #[test]
    fn test_from_geth_style_json() {
        let config = ChainConfig::from_json(
            r#"{"chainId": 5, "homesteadBlock": 0, "eip150Block": 10, "eip158Block": 10, "byzantiumBlock": 20}"#,
        )
        .unwrap();
        assert_eq!(config.chain_id, 5);
        assert_eq!(config.fork_at(9), Fork::Homestead);
        assert_eq!(config.fork_at(10), Fork::SpuriousDragon);
        assert_eq!(config.fork_at(25), Fork::Byzantium);
    }

    #[test]
    fn test_rejects_out_of_order() {
        let err = ChainConfig::from_json(r#"{"homesteadBlock": 10, "eip150Block": 5}"#).unwrap_err();
        assert!(matches!(err, ForkError::OutOfOrder { later_block: 5, .. }));
        assert!(matches!(
            ChainConfig::from_json("{not json"),
            Err(ForkError::Json(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let mainnet = ChainConfig::mainnet();
        let json = serde_json::to_string(&mainnet).unwrap();
        assert!(json.contains("\"eip150Block\":2463000"));
        assert_eq!(ChainConfig::from_json(&json).unwrap(), mainnet);
    }
}
