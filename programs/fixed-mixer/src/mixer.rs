//! Fixed-denomination mixer
//!
//! [`Mixer`] serializes every state-changing operation over one
//! [`PoolState`]. A spend runs in four steps:
//!
//! 1. stateless validation of the public inputs
//! 2. admission checks under the lock (root, nullifier, balance, ...)
//! 3. proof verification with the lock released
//! 4. the same checks again and the mutation, in one lock scope
//!
//! Step 4 closes the window opened by step 3: a deposit that moved the
//! root, or a racing spend of the same nullifier, is caught before
//! anything is written. No caller ever observes a half-applied operation.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::crypto::{
    FieldElement, FieldHash, ForwardPublicInputs, Groth16Proof, Note, PoseidonHasher,
    ProofVerifier, PublicInputs, WitnessInput,
};
use crate::error::{MixerError, Result};
use crate::events::{DepositEvent, ForwardEvent, PoolStatusEvent, WithdrawEvent};
use crate::instructions::{admin, deposit, forward, withdraw, Recipient};
use crate::state::{MerklePath, MixerConfig, MixerSnapshot, PoolState, PoolStats};

pub struct Mixer<V, H = PoseidonHasher> {
    config: MixerConfig,
    state: Mutex<PoolState<H>>,
    verifier: V,
}

impl<V: ProofVerifier> Mixer<V, PoseidonHasher> {
    /// Empty pool hashing with circom Poseidon.
    pub fn new(config: MixerConfig, verifier: V) -> Result<Self> {
        Self::with_hasher(config, verifier, PoseidonHasher)
    }

    pub fn restore(snapshot: MixerSnapshot, verifier: V) -> Result<Self> {
        Self::restore_with_hasher(snapshot, verifier, PoseidonHasher)
    }
}

impl<V: ProofVerifier, H: FieldHash> Mixer<V, H> {
    pub fn with_hasher(config: MixerConfig, verifier: V, hasher: H) -> Result<Self> {
        let state = PoolState::new(config, hasher)?;
        debug!(
            depth = config.tree_depth,
            denomination = config.denomination,
            root_history = config.root_history_size,
            "mixer initialized"
        );
        Ok(Self::from_state(state, verifier))
    }

    /// Rebuild a pool from a snapshot by replaying its leaves.
    pub fn restore_with_hasher(snapshot: MixerSnapshot, verifier: V, hasher: H) -> Result<Self> {
        let state = snapshot.into_state(hasher)?;
        debug!(
            leaves = state.tree.next_index(),
            spent = state.nullifiers.len(),
            root = %state.tree.current_root().short_hex(),
            "mixer restored"
        );
        Ok(Self::from_state(state, verifier))
    }

    fn from_state(state: PoolState<H>, verifier: V) -> Self {
        Self {
            config: state.config,
            state: Mutex::new(state),
            verifier,
        }
    }

    // A panic inside a handler cannot leave partial state: handlers only
    // write after their last fallible step.
    fn lock(&self) -> MutexGuard<'_, PoolState<H>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn verify(&self, proof: &Groth16Proof, public_inputs: &[FieldElement]) -> Result<()> {
        if self.verifier.verify(proof, public_inputs) {
            Ok(())
        } else {
            Err(MixerError::InvalidProof)
        }
    }

    // ========================================================================
    // DEPOSIT
    // ========================================================================

    /// Insert a pre-computed leaf, paying exactly the denomination.
    pub fn deposit(&self, leaf: FieldElement, payment: u64) -> Result<DepositEvent> {
        let mut pool = self.lock();
        deposit::handler(&mut pool, leaf, payment, None)
            .map_err(|err| rejected("deposit", None, err))
    }

    /// As [`Mixer::deposit`], but fails with `PositionMismatch` unless the
    /// leaf lands in `expected_position`.
    pub fn deposit_at(
        &self,
        leaf: FieldElement,
        payment: u64,
        expected_position: u64,
    ) -> Result<DepositEvent> {
        let mut pool = self.lock();
        deposit::handler(&mut pool, leaf, payment, Some(expected_position))
            .map_err(|err| rejected("deposit", None, err))
    }

    // ========================================================================
    // SPENDS
    // ========================================================================

    pub fn withdraw(
        &self,
        proof: &Groth16Proof,
        inputs: &PublicInputs,
        recipient: Recipient,
    ) -> Result<WithdrawEvent> {
        let nullifier = Some(&inputs.nullifier_hash);
        let reject = |err| rejected("withdraw", nullifier, err);

        inputs.validate().map_err(reject)?;
        withdraw::precheck(&self.lock(), inputs).map_err(reject)?;

        self.verify(proof, &inputs.to_field_elements())
            .map_err(reject)?;

        let mut pool = self.lock();
        withdraw::handler(&mut pool, inputs, recipient).map_err(reject)
    }

    pub fn forward(
        &self,
        proof: &Groth16Proof,
        inputs: &ForwardPublicInputs,
    ) -> Result<ForwardEvent> {
        self.forward_inner(proof, inputs, None)
    }

    /// Forward, requiring the new leaf to land in `expected_position`.
    pub fn forward_at(
        &self,
        proof: &Groth16Proof,
        inputs: &ForwardPublicInputs,
        expected_position: u64,
    ) -> Result<ForwardEvent> {
        self.forward_inner(proof, inputs, Some(expected_position))
    }

    fn forward_inner(
        &self,
        proof: &Groth16Proof,
        inputs: &ForwardPublicInputs,
        expected_position: Option<u64>,
    ) -> Result<ForwardEvent> {
        let nullifier = Some(&inputs.spend.nullifier_hash);
        let reject = |err| rejected("forward", nullifier, err);

        inputs.validate().map_err(reject)?;
        forward::precheck(&self.lock(), inputs, expected_position).map_err(reject)?;

        self.verify(proof, &inputs.to_field_elements())
            .map_err(reject)?;

        let mut pool = self.lock();
        forward::handler(&mut pool, inputs, expected_position).map_err(reject)
    }

    // ========================================================================
    // ADMIN
    // ========================================================================

    pub fn pause(&self) -> Result<PoolStatusEvent> {
        admin::pause(&mut self.lock())
    }

    pub fn unpause(&self) -> Result<PoolStatusEvent> {
        admin::unpause(&mut self.lock())
    }

    // ========================================================================
    // READ ACCESSORS
    // ========================================================================

    pub fn current_root(&self) -> FieldElement {
        self.lock().tree.current_root()
    }

    /// Membership path for the prover. Not authoritative: the root it
    /// leads to is re-checked against the live root at spend time.
    pub fn merkle_path(&self, position: u64) -> Result<MerklePath> {
        self.lock().tree.path_to(position)
    }

    /// Root and path read under one lock, so they always agree.
    pub fn root_and_path(&self, position: u64) -> Result<(FieldElement, MerklePath)> {
        let pool = self.lock();
        Ok((pool.tree.current_root(), pool.tree.path_to(position)?))
    }

    /// Circuit input for spending the coin at `position` with `secret`.
    ///
    /// Fails with `InvalidCommitment` if the secret does not open the leaf
    /// stored there.
    pub fn witness_input(&self, secret: FieldElement, position: u64) -> Result<WitnessInput> {
        let pool = self.lock();
        let note = Note::derive(pool.tree.hasher(), position, secret, self.config.denomination)?;
        if pool.tree.leaf(position) != Some(note.leaf) {
            return Err(MixerError::InvalidCommitment);
        }
        let path = pool.tree.path_to(position)?;
        WitnessInput::new(
            pool.tree.current_root(),
            self.config.denomination,
            note.nullifier_hash,
            secret,
            position,
            &path,
        )
    }

    pub fn next_index(&self) -> u64 {
        self.lock().tree.next_index()
    }

    pub fn is_spent(&self, nullifier_hash: &FieldElement) -> bool {
        self.lock().nullifiers.is_spent(nullifier_hash)
    }

    pub fn is_known_root(&self, root: &FieldElement) -> bool {
        self.lock().tree.is_known_root(root)
    }

    pub fn is_paused(&self) -> bool {
        self.lock().is_paused
    }

    pub fn stats(&self) -> PoolStats {
        self.lock().stats
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    pub fn snapshot(&self) -> MixerSnapshot {
        MixerSnapshot::capture(&self.lock())
    }
}

fn rejected(op: &'static str, nullifier: Option<&FieldElement>, err: MixerError) -> MixerError {
    match nullifier {
        Some(nh) => warn!(op, nullifier = %nh.short_hex(), error = %err, "rejected"),
        None => warn!(op, error = %err, "rejected"),
    }
    err
}
