//! Withdraw
//!
//! Spends one coin and pays the denomination out to a recipient.
//!
//! # Flow
//! 1. [`precheck`] under the pool lock: not paused, amount, live root,
//!    unspent nullifier, vault balance
//! 2. Proof verification by the caller, outside the lock
//! 3. [`handler`] under the lock: every check again, then mark the
//!    nullifier spent and debit the vault
//!
//! The verified proof shows that the prover knows a secret whose leaf is
//! in the tree under `root` and whose nullifier is `nullifier_hash`,
//! without revealing which leaf.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use tracing::info;

use crate::crypto::{FieldHash, PublicInputs};
use crate::error::{MixerError, Result};
use crate::events::WithdrawEvent;
use crate::state::{PoolState, SpendKind};

/// Payout destination: an opaque 32-byte address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Recipient(pub [u8; 32]);

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Recipient {
    type Err = MixerError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| MixerError::InvalidPublicInputs(format!("recipient: {e}")))?;
        let address: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            MixerError::InvalidPublicInputs(format!(
                "recipient must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(address))
    }
}

impl Serialize for Recipient {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Admission checks that can run before the proof is verified.
pub fn precheck<H: FieldHash>(pool: &PoolState<H>, inputs: &PublicInputs) -> Result<()> {
    pool.check_spend(inputs)?;
    pool.stats.record_withdrawal(inputs.amount)?;
    Ok(())
}

/// Commit a withdrawal whose proof has already been accepted.
pub fn handler<H: FieldHash>(
    pool: &mut PoolState<H>,
    inputs: &PublicInputs,
    recipient: Recipient,
) -> Result<WithdrawEvent> {
    // ========== VALIDATION CHECKS ==========

    pool.check_spend(inputs)?;
    let stats = pool.stats.record_withdrawal(inputs.amount)?;
    let sequence = pool.next_sequence()?;

    // ========== STATE UPDATES ==========

    pool.nullifiers
        .mark_spent(inputs.nullifier_hash, SpendKind::Withdraw, sequence)?;
    pool.stats = stats;
    pool.sequence = sequence;

    info!(
        nullifier = %inputs.nullifier_hash.short_hex(),
        %recipient,
        amount = inputs.amount,
        sequence,
        "withdrawal accepted"
    );

    Ok(WithdrawEvent {
        nullifier_hash: inputs.nullifier_hash,
        recipient,
        amount: inputs.amount,
        merkle_root: inputs.root,
        sequence,
    })
}
