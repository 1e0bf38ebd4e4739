//! Shared helpers: a mock prover/verifier pair and log setup.
//!
//! The mock "proof" binds the public inputs: `a[..32]` holds a fold of the
//! field hash over them. The mock verifier accepts exactly when the fold
//! matches, so a proof built for one root or nullifier fails for another.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

use fixed_mixer::crypto::PROOF_DATA_LEN;
use fixed_mixer::{
    FieldElement, FieldHash, ForwardPublicInputs, Groth16Proof, Mixer, MixerConfig, Note,
    PoseidonHasher, ProofVerifier, PublicInputs,
};
use rand::Rng;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn binding(public_inputs: &[FieldElement]) -> FieldElement {
    public_inputs
        .iter()
        .try_fold(FieldElement::zero(), |acc, x| PoseidonHasher.hash(&acc, x))
        .unwrap()
}

/// Produces proofs the [`MockVerifier`] accepts.
pub struct MockProver;

impl MockProver {
    pub fn prove(public_inputs: &[FieldElement]) -> Groth16Proof {
        let mut data = [0u8; PROOF_DATA_LEN];
        data[..32].copy_from_slice(&binding(public_inputs).to_be_bytes());
        Groth16Proof::from_bytes(&data).unwrap()
    }

    pub fn prove_withdraw(inputs: &PublicInputs) -> Groth16Proof {
        Self::prove(&inputs.to_field_elements())
    }

    pub fn prove_forward(inputs: &ForwardPublicInputs) -> Groth16Proof {
        Self::prove(&inputs.to_field_elements())
    }
}

#[derive(Default)]
pub struct MockVerifier {
    calls: AtomicUsize,
}

impl MockVerifier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProofVerifier for MockVerifier {
    fn verify(&self, proof: &Groth16Proof, public_inputs: &[FieldElement]) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        proof.a[..32] == binding(public_inputs).to_be_bytes()
    }
}

pub fn random_secret() -> FieldElement {
    // below 2^248, always canonical
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes[1..]);
    FieldElement::from_be_bytes(&bytes).unwrap()
}

pub fn mixer(depth: u8, denomination: u64) -> Mixer<MockVerifier> {
    init_tracing();
    Mixer::new(MixerConfig::new(depth, denomination), MockVerifier::default()).unwrap()
}

/// Deposit a fresh coin at the next slot.
pub fn deposit_coin<V: ProofVerifier>(mixer: &Mixer<V>) -> Note {
    let denomination = mixer.config().denomination;
    let note = Note::derive(&PoseidonHasher, mixer.next_index(), random_secret(), denomination)
        .unwrap();
    mixer
        .deposit_at(note.leaf, denomination, note.position)
        .unwrap();
    note
}

/// Withdraw inputs against the live root.
pub fn withdraw_inputs<V: ProofVerifier>(mixer: &Mixer<V>, note: &Note) -> PublicInputs {
    PublicInputs::new(
        mixer.current_root(),
        note.nullifier_hash,
        mixer.config().denomination,
    )
}
