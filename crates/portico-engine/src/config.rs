//! Engine configuration.

use std::path::Path;

use anyhow::Result;
use config::{Config, File};
use serde::Deserialize;
use starknet::core::types::Felt;

/// Largest batch accepted by [`crate::ImportEngine::import_batch`] unless
/// configured otherwise.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Engine configuration, usually expected in a `portico.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on records per batch.
    pub max_batch_size: usize,
    /// Chain identifier baked into nested-ownership account derivation.
    pub chain_id: Felt,
    /// Account implementation for nested-ownership imports. Records with a
    /// `nested_parent_tag` are rejected while this is unset.
    pub account_implementation: Option<Felt>,
    /// Salt baked into nested-ownership account derivation.
    pub account_salt: Felt,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            chain_id: Felt::ZERO,
            account_implementation: None,
            account_salt: Felt::ZERO,
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from a file.
    pub fn from_file(config_path: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(Path::new(config_path)))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
        assert_eq!(config.chain_id, Felt::ZERO);
        assert!(config.account_implementation.is_none());
    }
}
