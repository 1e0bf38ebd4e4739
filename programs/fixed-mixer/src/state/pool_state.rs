//! Mutable pool state
//!
//! Everything a transaction reads or writes: the accumulator, the spent
//! set, the counters and the vault balance. The mixer owns exactly one of
//! these behind its lock; instruction handlers borrow it for the duration
//! of one atomic step.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::Serialize;

use super::merkle_tree::MerkleTree;
use super::nullifier_registry::NullifierRegistry;
use super::pool_config::MixerConfig;
use crate::crypto::{FieldHash, PublicInputs};
use crate::error::{MixerError, Result};

/// Counters and the vault balance.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, BorshSerialize, BorshDeserialize,
)]
pub struct PoolStats {
    pub total_deposits: u64,
    pub total_withdrawals: u64,
    pub total_forwards: u64,
    /// Funds held by the pool, in base units
    pub balance: u64,
}

pub struct PoolState<H> {
    pub config: MixerConfig,
    pub tree: MerkleTree<H>,
    pub nullifiers: NullifierRegistry,
    pub stats: PoolStats,

    /// Pool paused flag - blocks deposits and spends when true
    pub is_paused: bool,

    /// Count of accepted state-changing operations
    pub sequence: u64,
}

impl<H: FieldHash> PoolState<H> {
    pub fn new(config: MixerConfig, hasher: H) -> Result<Self> {
        config.validate()?;
        let tree = MerkleTree::new(
            hasher,
            config.tree_depth,
            usize::from(config.root_history_size),
        )?;
        Ok(Self {
            config,
            tree,
            nullifiers: NullifierRegistry::new(),
            stats: PoolStats::default(),
            is_paused: false,
            sequence: 0,
        })
    }

    pub fn require_not_paused(&self) -> Result<()> {
        if self.is_paused {
            return Err(MixerError::PoolPaused);
        }
        Ok(())
    }

    pub fn require_denomination(&self, amount: u64) -> Result<()> {
        if amount != self.config.denomination {
            return Err(MixerError::BadAmount {
                expected: self.config.denomination,
                got: amount,
            });
        }
        Ok(())
    }

    pub fn require_position(&self, expected: Option<u64>) -> Result<()> {
        match expected {
            Some(expected) if expected != self.tree.next_index() => {
                Err(MixerError::PositionMismatch {
                    expected,
                    actual: self.tree.next_index(),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn require_capacity(&self) -> Result<()> {
        if self.tree.is_full() {
            return Err(MixerError::TreeFull {
                capacity: self.tree.capacity(),
            });
        }
        Ok(())
    }

    /// Spend admission: live root first, then the nullifier.
    ///
    /// Runs once before verification and again right before commit.
    pub fn check_spend(&self, inputs: &PublicInputs) -> Result<()> {
        self.require_not_paused()?;
        self.require_denomination(inputs.amount)?;
        if !self.tree.is_known_root(&inputs.root) {
            return Err(MixerError::StaleRoot);
        }
        if self.nullifiers.is_spent(&inputs.nullifier_hash) {
            return Err(MixerError::DoubleSpend);
        }
        Ok(())
    }

    pub fn next_sequence(&self) -> Result<u64> {
        self.sequence
            .checked_add(1)
            .ok_or(MixerError::ArithmeticOverflow)
    }
}

impl PoolStats {
    /// Add a deposit to the counters (checked arithmetic).
    pub fn record_deposit(&self, amount: u64) -> Result<Self> {
        Ok(Self {
            total_deposits: checked_inc(self.total_deposits)?,
            balance: self
                .balance
                .checked_add(amount)
                .ok_or(MixerError::ArithmeticOverflow)?,
            ..*self
        })
    }

    pub fn record_withdrawal(&self, amount: u64) -> Result<Self> {
        if self.balance < amount {
            return Err(MixerError::InsufficientBalance {
                balance: self.balance,
                requested: amount,
            });
        }
        Ok(Self {
            total_withdrawals: checked_inc(self.total_withdrawals)?,
            balance: self.balance - amount,
            ..*self
        })
    }

    /// Forwarded funds never leave the vault.
    pub fn record_forward(&self) -> Result<Self> {
        Ok(Self {
            total_forwards: checked_inc(self.total_forwards)?,
            ..*self
        })
    }
}

fn checked_inc(counter: u64) -> Result<u64> {
    counter.checked_add(1).ok_or(MixerError::ArithmeticOverflow)
}
