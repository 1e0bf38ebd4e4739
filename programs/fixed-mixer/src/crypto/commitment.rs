//! Commitment scheme
//!
//! # Formula
//! ```text
//! nullifier_hash = H(position, secret)
//! commitment     = H(nullifier_hash, secret)
//! leaf           = H(commitment, amount)
//! ```
//!
//! The depositor computes these off-chain; the pool only ever sees the
//! leaf at deposit time and the nullifier hash at spend time. Binding the
//! nullifier to the position means a coin is only spendable from the slot
//! it was derived for.
//!
//! Inputs are already canonical [`FieldElement`]s, so the only failure is
//! a hash backend error. Out-of-field values are rejected when parsed.

use std::fmt;

use super::field::FieldElement;
use super::poseidon::FieldHash;
use crate::error::Result;

pub fn nullifier_hash<H: FieldHash + ?Sized>(
    hasher: &H,
    position: u64,
    secret: &FieldElement,
) -> Result<FieldElement> {
    hasher.hash(&FieldElement::from_u64(position), secret)
}

pub fn commitment<H: FieldHash + ?Sized>(
    hasher: &H,
    nullifier_hash: &FieldElement,
    secret: &FieldElement,
) -> Result<FieldElement> {
    hasher.hash(nullifier_hash, secret)
}

pub fn leaf<H: FieldHash + ?Sized>(
    hasher: &H,
    commitment: &FieldElement,
    amount: &FieldElement,
) -> Result<FieldElement> {
    hasher.hash(commitment, amount)
}

/// Everything a holder derives for one coin.
#[derive(Clone, PartialEq, Eq)]
pub struct Note {
    pub position: u64,
    pub secret: FieldElement,
    pub nullifier_hash: FieldElement,
    pub commitment: FieldElement,
    pub leaf: FieldElement,
}

impl Note {
    pub fn derive<H: FieldHash + ?Sized>(
        hasher: &H,
        position: u64,
        secret: FieldElement,
        denomination: u64,
    ) -> Result<Self> {
        let nullifier_hash = nullifier_hash(hasher, position, &secret)?;
        let commitment = commitment(hasher, &nullifier_hash, &secret)?;
        let leaf = leaf(hasher, &commitment, &FieldElement::from_u64(denomination))?;
        Ok(Self {
            position,
            secret,
            nullifier_hash,
            commitment,
            leaf,
        })
    }
}

// the secret never goes to logs
impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("position", &self.position)
            .field("nullifier_hash", &self.nullifier_hash)
            .field("commitment", &self.commitment)
            .field("leaf", &self.leaf)
            .finish_non_exhaustive()
    }
}
