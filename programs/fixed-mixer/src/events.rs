//! Receipts returned by state-changing operations
//!
//! Every accepted operation yields one of these. They are also logged, and
//! serialize to JSON for callers that forward them to an indexer.

use serde::Serialize;

use crate::crypto::FieldElement;
use crate::instructions::withdraw::Recipient;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DepositEvent {
    pub leaf: FieldElement,
    /// Slot the leaf landed in; the depositor needs it to spend
    pub position: u64,
    pub merkle_root: FieldElement,
    pub amount: u64,
    pub sequence: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WithdrawEvent {
    pub nullifier_hash: FieldElement,
    pub recipient: Recipient,
    pub amount: u64,
    /// Root the spend was admitted against
    pub merkle_root: FieldElement,
    pub sequence: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ForwardEvent {
    pub nullifier_hash: FieldElement,
    pub new_commitment: FieldElement,
    /// `leaf(new_commitment, denomination)`
    pub leaf: FieldElement,
    pub position: u64,
    /// Root after the new leaf was inserted
    pub merkle_root: FieldElement,
    pub sequence: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PoolStatusEvent {
    pub paused: bool,
    pub sequence: u64,
}
