//! Input files: genesis allocation, chain config and blocks

use std::path::Path;

use strata_forks::{ChainConfig, Fork};
use strata_state::WorldState;
use strata_types::Block;

use crate::CliError;

/// Read a whole file, naming it in the error
pub fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a whole file, naming it in the error
pub fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    std::fs::write(path, contents).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a genesis allocation (address → balance, nonce, code, storage)
pub fn load_alloc(path: &Path) -> Result<WorldState, CliError> {
    Ok(WorldState::from_json(&read_file(path)?)?)
}

/// Fork schedule from a JSON file, a single fork from genesis, or mainnet
pub fn load_chain_config(path: Option<&Path>, fork: Option<Fork>) -> Result<ChainConfig, CliError> {
    match (path, fork) {
        (Some(path), _) => Ok(ChainConfig::from_json(&read_file(path)?)?),
        (None, Some(fork)) => Ok(ChainConfig::single(fork)),
        (None, None) => Ok(ChainConfig::mainnet()),
    }
}

/// Parse one hex-encoded RLP block per line. Blank lines and `#` comments
/// are skipped.
pub fn parse_blocks(contents: &str) -> Result<Vec<Block>, CliError> {
    let mut blocks = Vec::new();
    for (index, raw) in contents.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let text = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(text).map_err(|e| CliError::InvalidHex {
            line,
            reason: e.to_string(),
        })?;
        let block = Block::decode(&bytes).map_err(|source| CliError::InvalidBlock { line, source })?;
        blocks.push(block);
    }
    Ok(blocks)
}

/// Load a blocks file
pub fn load_blocks(path: &Path) -> Result<Vec<Block>, CliError> {
    parse_blocks(&read_file(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blocks_skips_comments() {
        let blocks = parse_blocks("# no blocks yet\n\n   \n").unwrap();
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_parse_blocks_reports_line() {
        let err = parse_blocks("# header\nzz\n").unwrap_err();
        assert!(matches!(err, CliError::InvalidHex { line: 2, .. }));

        let err = parse_blocks("0xc0\n").unwrap_err();
        assert!(matches!(err, CliError::InvalidBlock { line: 1, .. }));
    }

    #[test]
    fn test_chain_config_precedence() {
        let config = load_chain_config(None, Some(Fork::Berlin)).unwrap();
        assert_eq!(config.fork_for(0, 0).fork, Fork::Berlin);

        let config = load_chain_config(None, None).unwrap();
        assert_eq!(config, ChainConfig::mainnet());
    }
}
