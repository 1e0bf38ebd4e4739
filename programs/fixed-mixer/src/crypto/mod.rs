//! Cryptographic primitives for the mixer
//!
//! Field arithmetic, the field hash, the commitment scheme and the shapes
//! exchanged with the external prover and verifier. The proving system
//! itself is not implemented here.

pub mod commitment;
pub mod curve_utils;
pub mod field;
pub mod groth16;
pub mod poseidon;
pub mod public_inputs;
pub mod witness;

pub use commitment::Note;
pub use field::FieldElement;
pub use groth16::{Groth16Proof, ProofVerifier, SnarkJsProof, PROOF_DATA_LEN};
pub use poseidon::{FieldHash, PoseidonHasher};
pub use public_inputs::{ForwardPublicInputs, PublicInputs};
pub use witness::WitnessInput;
