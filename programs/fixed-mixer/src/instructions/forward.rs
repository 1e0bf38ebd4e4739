//! Forward
//!
//! Spends one coin and re-deposits its value under a new commitment,
//! without funds leaving the pool. Admission is the same as for a
//! withdrawal; on success the pool inserts
//! `leaf(new_commitment, denomination)` and marks the old nullifier spent,
//! so the old secret cannot be used again.

use tracing::info;

use crate::crypto::{commitment, FieldElement, FieldHash, ForwardPublicInputs};
use crate::error::Result;
use crate::events::ForwardEvent;
use crate::state::{PoolState, SpendKind};

/// Admission checks that can run before the proof is verified.
pub fn precheck<H: FieldHash>(
    pool: &PoolState<H>,
    inputs: &ForwardPublicInputs,
    expected_position: Option<u64>,
) -> Result<()> {
    pool.check_spend(&inputs.spend)?;
    pool.require_capacity()?;
    pool.require_position(expected_position)
}

/// Commit a forward whose proof has already been accepted.
pub fn handler<H: FieldHash>(
    pool: &mut PoolState<H>,
    inputs: &ForwardPublicInputs,
    expected_position: Option<u64>,
) -> Result<ForwardEvent> {
    // ========== VALIDATION CHECKS ==========

    precheck(pool, inputs, expected_position)?;

    let denomination = FieldElement::from_u64(pool.config.denomination);
    let leaf = commitment::leaf(pool.tree.hasher(), &inputs.new_commitment, &denomination)?;
    let stats = pool.stats.record_forward()?;
    let sequence = pool.next_sequence()?;

    // ========== STATE UPDATES ==========

    // insert is all-or-nothing; mark_spent cannot fail after check_spend
    let position = pool.tree.insert(leaf)?;
    let nullifier_hash = inputs.spend.nullifier_hash;
    pool.nullifiers
        .mark_spent(nullifier_hash, SpendKind::Forward, sequence)?;
    pool.stats = stats;
    pool.sequence = sequence;

    let merkle_root = pool.tree.current_root();
    info!(
        nullifier = %nullifier_hash.short_hex(),
        position,
        root = %merkle_root.short_hex(),
        sequence,
        "forward accepted"
    );

    Ok(ForwardEvent {
        nullifier_hash,
        new_commitment: inputs.new_commitment,
        leaf,
        position,
        merkle_root,
        sequence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{PoseidonHasher, PublicInputs};
    use crate::error::MixerError;
    use crate::instructions::deposit;
    use crate::state::MixerConfig;

    fn pool_with_one_coin() -> PoolState<PoseidonHasher> {
        let mut pool = PoolState::new(MixerConfig::new(2, 3), PoseidonHasher).unwrap();
        deposit::handler(&mut pool, FieldElement::from_u64(10), 3, None).unwrap();
        pool
    }

    fn forward_inputs(pool: &PoolState<PoseidonHasher>, nh: u64) -> ForwardPublicInputs {
        ForwardPublicInputs::new(
            PublicInputs::new(pool.tree.current_root(), FieldElement::from_u64(nh), 3),
            FieldElement::from_u64(77),
        )
    }

    #[test]
    fn test_forward_inserts_derived_leaf() {
        let mut pool = pool_with_one_coin();
        let inputs = forward_inputs(&pool, 5);
        let event = handler(&mut pool, &inputs, Some(1)).unwrap();

        let expected = commitment::leaf(
            &PoseidonHasher,
            &FieldElement::from_u64(77),
            &FieldElement::from_u64(3),
        )
        .unwrap();
        assert_eq!(event.leaf, expected);
        assert_eq!(event.position, 1);
        assert_eq!(pool.tree.leaf(1), Some(expected));
        assert_eq!(pool.stats.balance, 3, "forwarded value stays in the vault");
        assert_eq!(pool.stats.total_forwards, 1);
        assert_eq!(
            pool.nullifiers.get(&FieldElement::from_u64(5)).unwrap().kind,
            SpendKind::Forward
        );
    }

    #[test]
    fn test_forward_into_full_tree_changes_nothing() {
        let mut pool = pool_with_one_coin();
        for i in 2..=4 {
            deposit::handler(&mut pool, FieldElement::from_u64(i * 10), 3, None).unwrap();
        }
        let inputs = forward_inputs(&pool, 5);
        assert_eq!(
            handler(&mut pool, &inputs, None),
            Err(MixerError::TreeFull { capacity: 4 })
        );
        assert!(!pool.nullifiers.is_spent(&FieldElement::from_u64(5)));
    }

    #[test]
    fn test_forward_position_mismatch() {
        let mut pool = pool_with_one_coin();
        let inputs = forward_inputs(&pool, 5);
        assert_eq!(
            handler(&mut pool, &inputs, Some(0)),
            Err(MixerError::PositionMismatch {
                expected: 0,
                actual: 1
            })
        );
        assert!(pool.nullifiers.is_empty());
    }
}
