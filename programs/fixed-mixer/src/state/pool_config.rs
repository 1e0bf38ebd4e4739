//! Pool configuration
//!
//! Fixed at construction: the tree depth, the denomination every deposit
//! and payout must equal, and how many previous roots a spend may still
//! reference. Loadable from TOML:
//!
//! ```toml
//! tree_depth = 8
//! denomination = 20000000000000000
//! root_history_size = 0
//! ```

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use super::merkle_tree::{MAX_TREE_DEPTH, MIN_TREE_DEPTH};
use crate::error::{MixerError, Result};

/// Default tree depth (256 coins)
pub const DEFAULT_TREE_DEPTH: u8 = 8;

/// Default denomination: 0.02 in 18-decimal base units
pub const DEFAULT_DENOMINATION: u64 = 20_000_000_000_000_000;

/// Upper bound on the accepted-root window
pub const MAX_ROOT_HISTORY_SIZE: u16 = 1024;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct MixerConfig {
    /// Merkle tree depth (immutable after init)
    pub tree_depth: u8,

    /// Fixed amount of every coin
    pub denomination: u64,

    /// Previous roots still accepted by spends; 0 = current root only
    pub root_history_size: u16,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            tree_depth: DEFAULT_TREE_DEPTH,
            denomination: DEFAULT_DENOMINATION,
            root_history_size: 0,
        }
    }
}

impl MixerConfig {
    pub fn new(tree_depth: u8, denomination: u64) -> Self {
        Self {
            tree_depth,
            denomination,
            root_history_size: 0,
        }
    }

    pub fn with_root_history(mut self, size: u16) -> Self {
        self.root_history_size = size;
        self
    }

    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| MixerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_TREE_DEPTH..=MAX_TREE_DEPTH).contains(&self.tree_depth) {
            return Err(MixerError::InvalidTreeDepth {
                depth: self.tree_depth,
                min: MIN_TREE_DEPTH,
                max: MAX_TREE_DEPTH,
            });
        }
        if self.denomination == 0 {
            return Err(MixerError::InvalidConfig(
                "denomination must be positive".into(),
            ));
        }
        if self.root_history_size > MAX_ROOT_HISTORY_SIZE {
            return Err(MixerError::InvalidConfig(format!(
                "root_history_size {} exceeds {MAX_ROOT_HISTORY_SIZE}",
                self.root_history_size
            )));
        }
        Ok(())
    }

    /// Number of coins the pool can ever hold.
    pub fn capacity(&self) -> u64 {
        1u64 << self.tree_depth
    }
}
