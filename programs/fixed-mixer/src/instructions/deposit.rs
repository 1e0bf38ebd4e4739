//! Deposit
//!
//! Adds one coin to the pool. The leaf is computed off-line by the
//! depositor:
//! ```text
//! nullifier_hash = H(position, secret)
//! commitment     = H(nullifier_hash, secret)
//! leaf           = H(commitment, denomination)
//! ```
//! The pool never sees the secret. Because the nullifier binds the coin
//! to its slot, a depositor that prepared a leaf for a specific position
//! should submit through `expected_position` so a concurrent deposit
//! cannot shift it to another slot.

use tracing::info;

use crate::crypto::{FieldElement, FieldHash};
use crate::error::{MixerError, Result};
use crate::events::DepositEvent;
use crate::state::PoolState;

/// Handler for deposit.
///
/// # Arguments
/// * `leaf` - pre-computed leaf (must be non-zero)
/// * `payment` - amount attached, must equal the denomination
/// * `expected_position` - slot the leaf was derived for, if pinned
pub fn handler<H: FieldHash>(
    pool: &mut PoolState<H>,
    leaf: FieldElement,
    payment: u64,
    expected_position: Option<u64>,
) -> Result<DepositEvent> {
    // ========== VALIDATION ==========

    pool.require_not_paused()?;
    pool.require_denomination(payment)?;
    if pool.tree.is_empty_value(&leaf) {
        return Err(MixerError::InvalidCommitment);
    }
    pool.require_capacity()?;
    pool.require_position(expected_position)?;

    let stats = pool.stats.record_deposit(payment)?;
    let sequence = pool.next_sequence()?;

    // ========== MERKLE TREE UPDATE ==========

    let position = pool.tree.insert(leaf)?;
    let merkle_root = pool.tree.current_root();

    // ========== STATE UPDATE ==========

    pool.stats = stats;
    pool.sequence = sequence;

    info!(
        position,
        root = %merkle_root.short_hex(),
        sequence,
        "deposit accepted"
    );

    Ok(DepositEvent {
        leaf,
        position,
        merkle_root,
        amount: payment,
        sequence,
    })
}
