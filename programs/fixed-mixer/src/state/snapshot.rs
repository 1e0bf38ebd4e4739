//! Borsh snapshot of a pool
//!
//! The tree is not stored node by node. A snapshot keeps the ordered
//! leaves and rebuilds the accumulator by replaying them, so a restored
//! pool has the same root and root window as the one captured.

use borsh::{BorshDeserialize, BorshSerialize};

use super::merkle_tree::MerkleTree;
use super::nullifier_registry::{NullifierRegistry, SpendKind};
use super::pool_config::MixerConfig;
use super::pool_state::{PoolState, PoolStats};
use crate::crypto::{FieldElement, FieldHash};
use crate::error::{MixerError, Result};

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u8 = 1;

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SpentRecord {
    pub nullifier_hash: [u8; 32],
    pub kind: SpendKind,
    pub sequence: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MixerSnapshot {
    pub version: u8,
    pub config: MixerConfig,
    /// Leaves in insertion order, 32-byte big-endian
    pub leaves: Vec<[u8; 32]>,
    /// Sorted by sequence
    pub spent: Vec<SpentRecord>,
    pub stats: PoolStats,
    pub is_paused: bool,
    pub sequence: u64,
}

impl MixerSnapshot {
    pub fn capture<H: FieldHash>(state: &PoolState<H>) -> Self {
        let mut spent: Vec<SpentRecord> = state
            .nullifiers
            .iter()
            .map(|record| SpentRecord {
                nullifier_hash: record.nullifier_hash.to_be_bytes(),
                kind: record.kind,
                sequence: record.sequence,
            })
            .collect();
        spent.sort_by_key(|record| record.sequence);

        Self {
            version: SNAPSHOT_VERSION,
            config: state.config,
            leaves: state.tree.leaves().iter().map(FieldElement::to_be_bytes).collect(),
            spent,
            stats: state.stats,
            is_paused: state.is_paused,
            sequence: state.sequence,
        }
    }

    /// Rebuild pool state, replaying every leaf into a fresh tree.
    pub fn into_state<H: FieldHash>(self, hasher: H) -> Result<PoolState<H>> {
        if self.version != SNAPSHOT_VERSION {
            return Err(snapshot_err(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        self.config.validate().map_err(snapshot_err)?;

        let inserted = self.leaves.len() as u64;
        if inserted > self.config.capacity() {
            return Err(snapshot_err(format!(
                "{inserted} leaves exceed capacity {}",
                self.config.capacity()
            )));
        }
        self.check_ledger()?;

        let mut tree = MerkleTree::new(
            hasher,
            self.config.tree_depth,
            usize::from(self.config.root_history_size),
        )?;
        for bytes in &self.leaves {
            let leaf = FieldElement::from_be_bytes(bytes).map_err(snapshot_err)?;
            tree.insert(leaf).map_err(snapshot_err)?;
        }

        let mut nullifiers = NullifierRegistry::new();
        for record in &self.spent {
            if record.sequence > self.sequence {
                return Err(snapshot_err(format!(
                    "spend at sequence {} is ahead of pool sequence {}",
                    record.sequence, self.sequence
                )));
            }
            let nullifier_hash =
                FieldElement::from_be_bytes(&record.nullifier_hash).map_err(snapshot_err)?;
            nullifiers
                .mark_spent(nullifier_hash, record.kind, record.sequence)
                .map_err(snapshot_err)?;
        }

        Ok(PoolState {
            config: self.config,
            tree,
            nullifiers,
            stats: self.stats,
            is_paused: self.is_paused,
            sequence: self.sequence,
        })
    }

    /// Leaves, spend records and the vault must agree with the counters.
    fn check_ledger(&self) -> Result<()> {
        let stats = &self.stats;

        let inserted = self.leaves.len() as u64;
        let recorded_leaves = stats
            .total_deposits
            .checked_add(stats.total_forwards)
            .ok_or(MixerError::ArithmeticOverflow)?;
        if recorded_leaves != inserted {
            return Err(snapshot_err(format!(
                "{inserted} leaves but {recorded_leaves} deposits and forwards recorded"
            )));
        }

        let withdrawals = self
            .spent
            .iter()
            .filter(|record| record.kind == SpendKind::Withdraw)
            .count() as u64;
        let forwards = self.spent.len() as u64 - withdrawals;
        if withdrawals != stats.total_withdrawals || forwards != stats.total_forwards {
            return Err(snapshot_err(format!(
                "{withdrawals} withdraw and {forwards} forward records, counters say {} and {}",
                stats.total_withdrawals, stats.total_forwards
            )));
        }

        let mut sequences: Vec<u64> = self.spent.iter().map(|record| record.sequence).collect();
        sequences.sort_unstable();
        if sequences.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(snapshot_err("two spends share a sequence number"));
        }

        let live_coins = stats
            .total_deposits
            .checked_sub(stats.total_withdrawals)
            .ok_or_else(|| snapshot_err("more withdrawals than deposits"))?;
        let expected_balance = live_coins
            .checked_mul(self.config.denomination)
            .ok_or(MixerError::ArithmeticOverflow)?;
        if stats.balance != expected_balance {
            return Err(snapshot_err(format!(
                "vault holds {} but {live_coins} coins of {} are outstanding",
                stats.balance, self.config.denomination
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        borsh::to_vec(self).map_err(snapshot_err)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        borsh::from_slice(bytes).map_err(snapshot_err)
    }
}

fn snapshot_err(err: impl ToString) -> MixerError {
    MixerError::Snapshot(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PoseidonHasher;

    fn populated() -> PoolState<PoseidonHasher> {
        let mut state = PoolState::new(MixerConfig::new(3, 1).with_root_history(2), PoseidonHasher).unwrap();
        for i in 1..=3 {
            state.tree.insert(FieldElement::from_u64(i * 11)).unwrap();
            state.stats = state.stats.record_deposit(1).unwrap();
            state.sequence += 1;
        }
        state.sequence += 1;
        state.stats = state.stats.record_withdrawal(1).unwrap();
        state
            .nullifiers
            .mark_spent(FieldElement::from_u64(99), SpendKind::Withdraw, state.sequence)
            .unwrap();
        state
    }

    #[test]
    fn test_replay_reproduces_root_and_window() {
        let state = populated();
        let bytes = MixerSnapshot::capture(&state).to_bytes().unwrap();
        let restored = MixerSnapshot::from_bytes(&bytes)
            .unwrap()
            .into_state(PoseidonHasher)
            .unwrap();

        assert_eq!(restored.tree.current_root(), state.tree.current_root());
        assert_eq!(restored.tree.next_index(), 3);
        assert_eq!(restored.stats, state.stats);
        assert!(restored.nullifiers.is_spent(&FieldElement::from_u64(99)));

        let mut replay = MerkleTree::new(PoseidonHasher, 3, 2).unwrap();
        replay.insert(FieldElement::from_u64(11)).unwrap();
        replay.insert(FieldElement::from_u64(22)).unwrap();
        assert!(restored.tree.is_known_root(&replay.current_root()));
    }

    #[test]
    fn test_duplicate_nullifier_rejected() {
        let mut snapshot = MixerSnapshot::capture(&populated());
        let dup = snapshot.spent[0].clone();
        snapshot.spent.push(dup);
        assert!(matches!(
            snapshot.into_state(PoseidonHasher),
            Err(MixerError::Snapshot(_))
        ));
    }

    #[test]
    fn test_non_canonical_leaf_rejected() {
        let mut snapshot = MixerSnapshot::capture(&populated());
        snapshot.leaves[1] = [0xff; 32];
        assert!(matches!(
            snapshot.into_state(PoseidonHasher),
            Err(MixerError::Snapshot(_))
        ));
    }

    #[test]
    fn test_too_many_leaves_rejected() {
        let mut snapshot = MixerSnapshot::capture(&populated());
        snapshot.leaves = (1..=9u64).map(|i| FieldElement::from_u64(i).to_be_bytes()).collect();
        snapshot.stats.total_deposits = 9;
        assert!(matches!(
            snapshot.into_state(PoseidonHasher),
            Err(MixerError::Snapshot(_))
        ));
    }

    #[test]
    fn test_counter_mismatch_rejected() {
        let mut snapshot = MixerSnapshot::capture(&populated());
        snapshot.stats.total_deposits = 1;
        assert!(snapshot.into_state(PoseidonHasher).is_err());
    }

    #[test]
    fn test_dropped_spend_record_rejected() {
        let mut snapshot = MixerSnapshot::capture(&populated());
        snapshot.spent.clear();
        assert!(matches!(
            snapshot.into_state(PoseidonHasher),
            Err(MixerError::Snapshot(_))
        ));
    }

    #[test]
    fn test_relabelled_spend_kind_rejected() {
        let mut snapshot = MixerSnapshot::capture(&populated());
        snapshot.spent[0].kind = SpendKind::Forward;
        assert!(snapshot.into_state(PoseidonHasher).is_err());
    }

    #[test]
    fn test_inflated_balance_rejected() {
        let mut snapshot = MixerSnapshot::capture(&populated());
        snapshot.stats.balance = 1_000_000;
        assert!(matches!(
            snapshot.into_state(PoseidonHasher),
            Err(MixerError::Snapshot(_))
        ));
    }

    #[test]
    fn test_shared_spend_sequence_rejected() {
        let mut state = populated();
        state.sequence += 1;
        state.stats = state.stats.record_withdrawal(1).unwrap();
        state
            .nullifiers
            .mark_spent(FieldElement::from_u64(98), SpendKind::Withdraw, state.sequence)
            .unwrap();
        let mut snapshot = MixerSnapshot::capture(&state);
        assert!(snapshot.clone().into_state(PoseidonHasher).is_ok());

        snapshot.spent[1].sequence = snapshot.spent[0].sequence;
        assert!(matches!(
            snapshot.into_state(PoseidonHasher),
            Err(MixerError::Snapshot(_))
        ));
    }

    #[test]
    fn test_truncated_bytes_rejected() {
        let bytes = MixerSnapshot::capture(&populated()).to_bytes().unwrap();
        assert!(matches!(
            MixerSnapshot::from_bytes(&bytes[..bytes.len() - 3]),
            Err(MixerError::Snapshot(_))
        ));
    }
}
