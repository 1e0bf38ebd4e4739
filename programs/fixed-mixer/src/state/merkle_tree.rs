//! Append-only Merkle accumulator for coin leaves
//!
//! Fixed-depth binary tree stored as an arena: one flat vector holding
//! every node, addressed by `(level, offset)`. Level 0 holds the leaves,
//! level `depth` holds the root. Unfilled slots carry the empty-subtree
//! value of their level, so paths can be read straight from the arena.
//!
//! # Placement convention
//! Bit `i` of a leaf's position says where the running hash goes at
//! level `i`:
//! ```text
//! bit = 1 (odd offset)  -> parent = H(node, sibling)
//! bit = 0 (even offset) -> parent = H(sibling, node)
//! ```
//! Insertion, path generation and [`MerklePath::compute_root`] all use this
//! rule; the proof circuit must use it too.
//!
//! # Empty values
//! ```text
//! zero_leaf  = H(H(...H(0, 0)...))   (depth applications)
//! zeros[0]   = zero_leaf
//! zeros[i+1] = H(zeros[i], zeros[i])
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::{FieldElement, FieldHash, PoseidonHasher};
use crate::error::{MixerError, Result};

/// Maximum supported tree depth (2^20 leaves)
pub const MAX_TREE_DEPTH: u8 = 20;

/// Minimum supported tree depth
pub const MIN_TREE_DEPTH: u8 = 2;

/// Membership path from a leaf to the root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMerklePath")]
pub struct MerklePath {
    siblings: Vec<FieldElement>,
    path_bits: Vec<bool>,
}

#[derive(Deserialize)]
struct RawMerklePath {
    siblings: Vec<FieldElement>,
    path_bits: Vec<bool>,
}

impl TryFrom<RawMerklePath> for MerklePath {
    type Error = MixerError;

    fn try_from(raw: RawMerklePath) -> Result<Self> {
        Self::new(raw.siblings, raw.path_bits)
    }
}

impl MerklePath {
    pub fn new(siblings: Vec<FieldElement>, path_bits: Vec<bool>) -> Result<Self> {
        if siblings.len() != path_bits.len() {
            return Err(MixerError::InvalidPublicInputs(format!(
                "path has {} siblings but {} placement bits",
                siblings.len(),
                path_bits.len()
            )));
        }
        Ok(Self {
            siblings,
            path_bits,
        })
    }

    /// Sibling hashes, leaf level first.
    pub fn siblings(&self) -> &[FieldElement] {
        &self.siblings
    }

    /// Placement bits, leaf level first. `true` = node is the first operand.
    pub fn path_bits(&self) -> &[bool] {
        &self.path_bits
    }

    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Leaf position encoded by the placement bits.
    pub fn position(&self) -> u64 {
        self.path_bits
            .iter()
            .rev()
            .fold(0u64, |acc, &bit| (acc << 1) | u64::from(bit))
    }

    /// Fold `leaf` up the path. A fresh path yields the root it was read from.
    pub fn compute_root<H: FieldHash + ?Sized>(
        &self,
        hasher: &H,
        leaf: &FieldElement,
    ) -> Result<FieldElement> {
        let mut acc = *leaf;
        for (sibling, &bit) in self.siblings.iter().zip(&self.path_bits) {
            acc = hash_with_sibling(hasher, bit, &acc, sibling)?;
        }
        Ok(acc)
    }
}

fn hash_with_sibling<H: FieldHash + ?Sized>(
    hasher: &H,
    node_is_odd: bool,
    node: &FieldElement,
    sibling: &FieldElement,
) -> Result<FieldElement> {
    if node_is_odd {
        hasher.hash(node, sibling)
    } else {
        hasher.hash(sibling, node)
    }
}

/// Fixed-depth append-only accumulator.
pub struct MerkleTree<H = PoseidonHasher> {
    hasher: H,

    /// Tree depth (immutable after init)
    depth: u8,

    /// Next leaf index to be filled (also = total leaves inserted)
    next_index: u64,

    /// All nodes, level by level, leaves first
    nodes: Vec<FieldElement>,

    /// Empty-subtree value per level, `depth + 1` entries
    zeros: Vec<FieldElement>,

    current_root: FieldElement,

    /// Most recent previous roots, oldest first
    root_history: VecDeque<FieldElement>,

    /// Bound on `root_history`; 0 admits only the current root
    root_history_size: usize,
}

impl<H: FieldHash> MerkleTree<H> {
    /// Build an empty tree.
    pub fn new(hasher: H, depth: u8, root_history_size: usize) -> Result<Self> {
        if !(MIN_TREE_DEPTH..=MAX_TREE_DEPTH).contains(&depth) {
            return Err(MixerError::InvalidTreeDepth {
                depth,
                min: MIN_TREE_DEPTH,
                max: MAX_TREE_DEPTH,
            });
        }

        let zeros = Self::compute_zero_values(&hasher, depth)?;

        let mut nodes = Vec::with_capacity((1usize << (depth + 1)) - 1);
        for (level, zero) in zeros.iter().enumerate() {
            let width = 1usize << (depth as usize - level);
            nodes.extend(std::iter::repeat(*zero).take(width));
        }

        let current_root = zeros[depth as usize];
        debug!(depth, root = %current_root, "initialized empty merkle tree");

        Ok(Self {
            hasher,
            depth,
            next_index: 0,
            nodes,
            zeros,
            current_root,
            root_history: VecDeque::with_capacity(root_history_size),
            root_history_size,
        })
    }

    /// Empty-subtree values for each level.
    ///
    /// These MUST match the circuit's zero values exactly.
    fn compute_zero_values(hasher: &H, depth: u8) -> Result<Vec<FieldElement>> {
        let mut zero_leaf = FieldElement::zero();
        for _ in 0..depth {
            zero_leaf = hasher.hash(&zero_leaf, &zero_leaf)?;
        }

        let mut zeros = Vec::with_capacity(depth as usize + 1);
        zeros.push(zero_leaf);
        for level in 1..=depth as usize {
            let prev = zeros[level - 1];
            zeros.push(hasher.hash(&prev, &prev)?);
        }
        Ok(zeros)
    }

    fn index(&self, level: usize, offset: u64) -> usize {
        let span = 1usize << (self.depth as usize + 1);
        span - (span >> level) + offset as usize
    }

    fn node(&self, level: usize, offset: u64) -> FieldElement {
        self.nodes[self.index(level, offset)]
    }

    /// Append a leaf, returning its position.
    ///
    /// All new node values are computed before anything is written, so a
    /// failed insert leaves the tree untouched.
    pub fn insert(&mut self, leaf: FieldElement) -> Result<u64> {
        if self.is_empty_value(&leaf) {
            return Err(MixerError::InvalidCommitment);
        }
        if self.is_full() {
            return Err(MixerError::TreeFull {
                capacity: self.capacity(),
            });
        }

        let position = self.next_index;
        let mut updates = Vec::with_capacity(self.depth as usize + 1);
        let mut current = leaf;
        let mut offset = position;
        updates.push((0usize, offset, current));

        for level in 0..self.depth as usize {
            let sibling = self.node(level, offset ^ 1);
            current = hash_with_sibling(&self.hasher, offset & 1 == 1, &current, &sibling)?;
            offset >>= 1;
            updates.push((level + 1, offset, current));
        }

        for (level, offset, value) in updates {
            let index = self.index(level, offset);
            self.nodes[index] = value;
        }

        if self.root_history_size > 0 {
            if self.root_history.len() == self.root_history_size {
                self.root_history.pop_front();
            }
            self.root_history.push_back(self.current_root);
        }
        self.current_root = current;
        self.next_index += 1;

        debug!(position, root = %current, "inserted leaf");
        Ok(position)
    }

    /// Zero, or the value an unfilled slot holds. Inserting either would
    /// leave the root unchanged.
    pub fn is_empty_value(&self, leaf: &FieldElement) -> bool {
        leaf.is_zero() || *leaf == self.zeros[0]
    }

    /// Membership path for an inserted leaf.
    pub fn path_to(&self, position: u64) -> Result<MerklePath> {
        if position >= self.next_index {
            return Err(MixerError::InvalidPosition {
                position,
                inserted: self.next_index,
            });
        }

        let mut siblings = Vec::with_capacity(self.depth as usize);
        let mut path_bits = Vec::with_capacity(self.depth as usize);
        let mut offset = position;
        for level in 0..self.depth as usize {
            siblings.push(self.node(level, offset ^ 1));
            path_bits.push(offset & 1 == 1);
            offset >>= 1;
        }

        Ok(MerklePath {
            siblings,
            path_bits,
        })
    }

    pub fn current_root(&self) -> FieldElement {
        self.current_root
    }

    /// Current root, or one of the last `root_history_size` roots.
    pub fn is_known_root(&self, root: &FieldElement) -> bool {
        *root == self.current_root || self.root_history.iter().any(|r| r == root)
    }

    pub fn leaf(&self, position: u64) -> Option<FieldElement> {
        (position < self.next_index).then(|| self.node(0, position))
    }

    /// Inserted leaves in position order.
    pub fn leaves(&self) -> &[FieldElement] {
        &self.nodes[..self.next_index as usize]
    }

    pub fn zero_value(&self, level: usize) -> Option<FieldElement> {
        self.zeros.get(level).copied()
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn is_full(&self) -> bool {
        self.next_index >= self.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u64) -> FieldElement {
        FieldElement::from_u64(n)
    }

    #[test]
    fn test_depth_bounds() {
        assert!(MerkleTree::new(PoseidonHasher, MIN_TREE_DEPTH - 1, 0).is_err());
        assert!(MerkleTree::new(PoseidonHasher, MAX_TREE_DEPTH + 1, 0).is_err());
        assert!(MerkleTree::new(PoseidonHasher, 4, 0).is_ok());
    }

    #[test]
    fn test_zero_values_deterministic() {
        let t1 = MerkleTree::new(PoseidonHasher, 4, 0).unwrap();
        let t2 = MerkleTree::new(PoseidonHasher, 4, 0).unwrap();
        assert_eq!(t1.zeros, t2.zeros);
        assert_eq!(t1.current_root(), t1.zeros[4]);
    }

    #[test]
    fn test_zero_leaf_is_repeated_self_hash() {
        let tree = MerkleTree::new(PoseidonHasher, 3, 0).unwrap();
        let mut expected = FieldElement::zero();
        for _ in 0..3 {
            expected = PoseidonHasher.hash(&expected, &expected).unwrap();
        }
        assert_eq!(tree.zero_value(0), Some(expected));
        let level1 = PoseidonHasher.hash(&expected, &expected).unwrap();
        assert_eq!(tree.zero_value(1), Some(level1));
    }

    #[test]
    fn test_insert_assigns_sequential_positions() {
        let mut tree = MerkleTree::new(PoseidonHasher, 4, 0).unwrap();
        for i in 0..5 {
            assert_eq!(tree.insert(leaf(i + 1)).unwrap(), i);
        }
        assert_eq!(tree.next_index(), 5);
        assert_eq!(tree.leaf(2), Some(leaf(3)));
        assert_eq!(tree.leaf(5), None);
    }

    #[test]
    fn test_root_changes_with_each_insert() {
        let mut tree = MerkleTree::new(PoseidonHasher, 4, 0).unwrap();
        let mut prev = tree.current_root();
        for i in 1..=4 {
            tree.insert(leaf(i)).unwrap();
            assert_ne!(tree.current_root(), prev);
            prev = tree.current_root();
        }
    }

    #[test]
    fn test_tree_full() {
        let mut tree = MerkleTree::new(PoseidonHasher, 2, 0).unwrap();
        for i in 1..=4 {
            tree.insert(leaf(i)).unwrap();
        }
        assert!(tree.is_full());
        let root = tree.current_root();
        assert_eq!(tree.insert(leaf(5)), Err(MixerError::TreeFull { capacity: 4 }));
        assert_eq!(tree.current_root(), root);
        assert_eq!(tree.next_index(), 4);
    }

    #[test]
    fn test_zero_leaf_rejected() {
        let mut tree = MerkleTree::new(PoseidonHasher, 2, 0).unwrap();
        assert_eq!(tree.insert(FieldElement::zero()), Err(MixerError::InvalidCommitment));
        assert_eq!(tree.next_index(), 0);
    }

    #[test]
    fn test_empty_slot_value_rejected() {
        let mut tree = MerkleTree::new(PoseidonHasher, 3, 0).unwrap();
        let zero_leaf = tree.zero_value(0).unwrap();
        let root = tree.current_root();
        assert_eq!(tree.insert(zero_leaf), Err(MixerError::InvalidCommitment));
        assert_eq!(tree.current_root(), root);
        assert_eq!(tree.next_index(), 0);
    }

    #[test]
    fn test_path_to_uninserted_position() {
        let mut tree = MerkleTree::new(PoseidonHasher, 4, 0).unwrap();
        tree.insert(leaf(1)).unwrap();
        assert_eq!(
            tree.path_to(1),
            Err(MixerError::InvalidPosition {
                position: 1,
                inserted: 1
            })
        );
    }

    #[test]
    fn test_paths_reconstruct_root() {
        let mut tree = MerkleTree::new(PoseidonHasher, 4, 0).unwrap();
        for i in 1..=6 {
            tree.insert(leaf(i * 7)).unwrap();
        }
        for position in 0..6 {
            let path = tree.path_to(position).unwrap();
            assert_eq!(path.position(), position);
            let root = path
                .compute_root(&PoseidonHasher, &tree.leaf(position).unwrap())
                .unwrap();
            assert_eq!(root, tree.current_root(), "position {position}");
        }
    }

    #[test]
    fn test_root_history_window() {
        let mut tree = MerkleTree::new(PoseidonHasher, 4, 2).unwrap();
        let r0 = tree.current_root();
        tree.insert(leaf(1)).unwrap();
        let r1 = tree.current_root();
        tree.insert(leaf(2)).unwrap();
        let r2 = tree.current_root();
        tree.insert(leaf(3)).unwrap();

        assert!(tree.is_known_root(&r2));
        assert!(tree.is_known_root(&r1));
        assert!(!tree.is_known_root(&r0), "evicted from the window");
    }

    #[test]
    fn test_no_history_means_current_only() {
        let mut tree = MerkleTree::new(PoseidonHasher, 4, 0).unwrap();
        tree.insert(leaf(1)).unwrap();
        let r1 = tree.current_root();
        tree.insert(leaf(2)).unwrap();
        assert!(!tree.is_known_root(&r1));
        assert!(tree.is_known_root(&tree.current_root()));
    }

    #[test]
    fn test_path_rejects_mismatched_lengths() {
        assert!(MerklePath::new(vec![leaf(1)], vec![true, false]).is_err());
    }

    #[test]
    fn test_path_deserialize_checks_lengths() {
        let ok: MerklePath =
            serde_json::from_str(r#"{"siblings": ["1", "2"], "path_bits": [true, false]}"#)
                .unwrap();
        assert_eq!(ok.position(), 1);

        let short = serde_json::from_str::<MerklePath>(
            r#"{"siblings": ["1"], "path_bits": [true, false]}"#,
        );
        assert!(short.is_err());
    }
}
