//! Pool state: accumulator, spent set, configuration and persistence

pub mod merkle_tree;
pub mod nullifier_registry;
pub mod pool_config;
pub mod pool_state;
pub mod snapshot;

pub use merkle_tree::{MerklePath, MerkleTree, MAX_TREE_DEPTH, MIN_TREE_DEPTH};
pub use nullifier_registry::{NullifierRegistry, SpendKind, SpentNullifier};
pub use pool_config::MixerConfig;
pub use pool_state::{PoolState, PoolStats};
pub use snapshot::MixerSnapshot;
