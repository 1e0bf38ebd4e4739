//! Spent nullifier tracking
//!
//! One record per spent nullifier hash, keyed by the hash itself, so the
//! spent check and the insert are both O(1).
//!
//! # Anti-Double-Spend Mechanism
//! 1. The prover derives nullifier_hash = H(position, secret)
//! 2. On spend, the pool looks the hash up
//! 3. Present -> already spent -> reject
//! 4. Absent -> record it -> accept the spend
//!
//! Records are never removed.

use std::collections::hash_map::{Entry, HashMap};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::crypto::FieldElement;
use crate::error::{MixerError, Result};

/// Which operation consumed the coin.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum SpendKind {
    Withdraw,
    Forward,
}

/// Spent nullifier record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SpentNullifier {
    /// The nullifier hash that was spent
    pub nullifier_hash: FieldElement,

    pub kind: SpendKind,

    /// Pool operation counter at the time of the spend
    pub sequence: u64,
}

#[derive(Debug, Default)]
pub struct NullifierRegistry {
    spent: HashMap<FieldElement, SpentNullifier>,
}

impl NullifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_spent(&self, nullifier_hash: &FieldElement) -> bool {
        self.spent.contains_key(nullifier_hash)
    }

    /// Record a spend. Fails if the hash is already present; the existing
    /// record is left as is.
    pub fn mark_spent(
        &mut self,
        nullifier_hash: FieldElement,
        kind: SpendKind,
        sequence: u64,
    ) -> Result<()> {
        match self.spent.entry(nullifier_hash) {
            Entry::Occupied(_) => Err(MixerError::AlreadySpent(nullifier_hash.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(SpentNullifier {
                    nullifier_hash,
                    kind,
                    sequence,
                });
                Ok(())
            }
        }
    }

    pub fn get(&self, nullifier_hash: &FieldElement) -> Option<&SpentNullifier> {
        self.spent.get(nullifier_hash)
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }

    /// Records in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &SpentNullifier> {
        self.spent.values()
    }
}
