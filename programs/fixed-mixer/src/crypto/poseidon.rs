//! Field hash for the mixer
//!
//! # Hash Function Architecture
//!
//! One two-input compression function is used everywhere: tree nodes,
//! empty-subtree values, nullifier hashes, commitments and leaves. It must
//! be the same function, with the same operand order, in the accumulator,
//! in the off-line witness builder and inside the proof circuit.
//!
//! The concrete primitive is circomlib-compatible Poseidon:
//! - Field: BN254 scalar field
//! - t = 3 (2 inputs + 1 capacity)
//! - RF = 8, RP = 57
//!
//! `hash(left, right)` is `Poseidon([left, right])`. Swapping operands
//! yields a different value.

use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher as _};

use super::field::FieldElement;
use crate::error::Result;

/// Two-input one-way compression over the scalar field.
pub trait FieldHash: Send + Sync {
    fn hash(&self, left: &FieldElement, right: &FieldElement) -> Result<FieldElement>;
}

/// circomlib `poseidon([left, right])`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PoseidonHasher;

impl FieldHash for PoseidonHasher {
    fn hash(&self, left: &FieldElement, right: &FieldElement) -> Result<FieldElement> {
        let mut poseidon = Poseidon::<Fr>::new_circom(2)?;
        let out = poseidon.hash(&[*left.as_fr(), *right.as_fr()])?;
        Ok(FieldElement::from(out))
    }
}
