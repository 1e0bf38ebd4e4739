//! Fixed-denomination mixer
//!
//! Coins of one fixed denomination go in as leaves of an append-only
//! Merkle tree and come out through zero-knowledge spend proofs that do
//! not reveal which leaf is being spent. A one-time nullifier hash per
//! spend prevents reuse.
//!
//! ```text
//! nullifier_hash = H(position, secret)
//! commitment     = H(nullifier_hash, secret)
//! leaf           = H(commitment, denomination)
//! ```
//!
//! Spends are withdrawals (value leaves the pool) or forwards (value is
//! re-deposited under a new commitment). Proof verification is injected
//! through [`ProofVerifier`].

pub mod crypto;
pub mod error;
pub mod events;
pub mod instructions;
pub mod mixer;
pub mod state;


pub use crypto::{
    FieldElement, FieldHash, ForwardPublicInputs, Groth16Proof, Note, PoseidonHasher,
    ProofVerifier, PublicInputs, SnarkJsProof, WitnessInput,
};
pub use error::{MixerError, Result};
pub use events::{DepositEvent, ForwardEvent, PoolStatusEvent, WithdrawEvent};
pub use instructions::Recipient;
pub use mixer::Mixer;
pub use state::{MerklePath, MerkleTree, MixerConfig, MixerSnapshot, PoolStats, SpendKind};
