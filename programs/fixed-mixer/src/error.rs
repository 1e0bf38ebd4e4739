//! Unified error types for the fixed-denomination mixer
//!
//! Every rejection carries a distinguishable reason so a wallet can tell
//! "regenerate the proof" apart from "abandon this spend".

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = MixerError> = std::result::Result<T, E>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MixerError {
    // ========== Amount / Vault Errors ==========

    /// Payment or declared amount differs from the pool denomination
    #[error("invalid amount: expected the fixed denomination {expected}, got {got}")]
    BadAmount { expected: u64, got: u64 },

    /// Vault cannot cover a payout
    #[error("insufficient vault balance: {balance} available, {requested} requested")]
    InsufficientBalance { balance: u64, requested: u64 },

    /// Arithmetic overflow in counters or balances
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    // ========== Merkle Tree Errors ==========

    /// Accumulator has no free slot left
    #[error("merkle tree is full ({capacity} leaves)")]
    TreeFull { capacity: u64 },

    /// Path query for a slot that was never filled
    #[error("invalid position {position}: only {inserted} leaves inserted")]
    InvalidPosition { position: u64, inserted: u64 },

    /// Tree depth outside the supported range
    #[error("tree depth must be between {min} and {max}, got {depth}")]
    InvalidTreeDepth { depth: u8, min: u8, max: u8 },

    /// Leaf would not land on the slot its nullifier was derived for
    #[error("position mismatch: coin derived for slot {expected}, next free slot is {actual}")]
    PositionMismatch { expected: u64, actual: u64 },

    // ========== Spend Admission Errors ==========

    /// Claimed root is not the live root (or not in the accepted window)
    #[error("stale merkle root: proof must be regenerated against the current root")]
    StaleRoot,

    /// Nullifier already consumed by an accepted spend
    #[error("nullifier already spent")]
    DoubleSpend,

    /// Registry primitive: the nullifier is already present
    #[error("nullifier {0} already marked spent")]
    AlreadySpent(String),

    /// Verifier rejected the proof
    #[error("invalid proof: verification failed")]
    InvalidProof,

    /// Proof bytes or snarkjs proof JSON are malformed
    #[error("invalid proof format: {0}")]
    InvalidProofFormat(String),

    /// Public inputs have the wrong shape or forbidden values
    #[error("invalid public inputs: {0}")]
    InvalidPublicInputs(String),

    // ========== Field / Commitment Errors ==========

    /// Value is not a canonical element of the scalar field
    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),

    /// Leaf or commitment cannot be zero
    #[error("invalid commitment: zero is reserved for empty slots")]
    InvalidCommitment,

    /// Hash primitive reported a failure
    #[error("hash primitive failed: {0}")]
    Hash(String),

    // ========== Pool Errors ==========

    /// Pool is paused
    #[error("pool is paused")]
    PoolPaused,

    /// Configuration rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Snapshot could not be encoded, decoded or replayed
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl MixerError {
    /// The spend may still succeed with a proof built against the new root.
    pub fn requires_new_proof(&self) -> bool {
        matches!(self, MixerError::StaleRoot)
    }

    /// Retrying the same coin cannot succeed.
    pub fn is_terminal_for_coin(&self) -> bool {
        matches!(
            self,
            MixerError::DoubleSpend | MixerError::AlreadySpent(_) | MixerError::InvalidProof
        )
    }
}

impl From<light_poseidon::PoseidonError> for MixerError {
    fn from(err: light_poseidon::PoseidonError) -> Self {
        MixerError::Hash(err.to_string())
    }
}
