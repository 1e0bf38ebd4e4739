//! Groth16 proof ABI and the verifier seam
//!
//! Proof generation and the pairing check are external capabilities. This
//! module only pins the shape a proof has when it reaches the pool:
//!
//! ```text
//! A = 64 bytes  (G1: x || y)
//! B = 128 bytes (G2: x.c1 || x.c0 || y.c1 || y.c0)
//! C = 64 bytes  (G1: x || y)
//! ```
//!
//! snarkjs emits `pi_b` rows as `[c0, c1]`; the verifier ABI wants
//! `[c1, c0]`, so [`Groth16Proof::from_snarkjs`] swaps each row.

use serde::Deserialize;

use super::curve_utils::{encode_coordinate, validate_g1_point, validate_g2_point, G1Point, G2Point};
use super::field::FieldElement;
use crate::error::{MixerError, Result};

/// Expected proof data length in bytes.
pub const PROOF_DATA_LEN: usize = 256;

/// Groth16 proof: A, C in G1 and B in G2.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Groth16Proof {
    pub a: G1Point,
    pub b: G2Point,
    pub c: G1Point,
}

impl Groth16Proof {
    /// Parse proof from raw bytes (256 bytes expected).
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != PROOF_DATA_LEN {
            return Err(MixerError::InvalidProofFormat(format!(
                "expected {PROOF_DATA_LEN} bytes (A: 64, B: 128, C: 64), got {}",
                data.len()
            )));
        }

        let mut proof = Groth16Proof {
            a: [0u8; 64],
            b: [0u8; 128],
            c: [0u8; 64],
        };
        proof.a.copy_from_slice(&data[0..64]);
        proof.b.copy_from_slice(&data[64..192]);
        proof.c.copy_from_slice(&data[192..256]);
        Ok(proof)
    }

    pub fn to_bytes(&self) -> [u8; PROOF_DATA_LEN] {
        let mut bytes = [0u8; PROOF_DATA_LEN];
        bytes[0..64].copy_from_slice(&self.a);
        bytes[64..192].copy_from_slice(&self.b);
        bytes[192..256].copy_from_slice(&self.c);
        bytes
    }

    /// Convert a snarkjs proof into the verifier ABI.
    ///
    /// A and C must be points on the curve; every coordinate must be
    /// below the base field modulus.
    pub fn from_snarkjs(proof: &SnarkJsProof) -> Result<Self> {
        let a = g1_from_affine(&proof.pi_a)?;
        let c = g1_from_affine(&proof.pi_c)?;

        let mut b = [0u8; 128];
        let rows = [&proof.pi_b[0], &proof.pi_b[1]];
        for (i, row) in rows.iter().enumerate() {
            let offset = i * 64;
            b[offset..offset + 32].copy_from_slice(&encode_coordinate(&row[1])?);
            b[offset + 32..offset + 64].copy_from_slice(&encode_coordinate(&row[0])?);
        }
        validate_g2_point(&b)?;

        Ok(Self { a, b, c })
    }

    /// Parse the `proof.json` written by `snarkjs groth16 prove`.
    pub fn from_snarkjs_json(json: &str) -> Result<Self> {
        let proof: SnarkJsProof = serde_json::from_str(json)
            .map_err(|e| MixerError::InvalidProofFormat(e.to_string()))?;
        Self::from_snarkjs(&proof)
    }
}

fn g1_from_affine(coords: &[String; 3]) -> Result<G1Point> {
    if coords[2].trim() != "1" {
        return Err(MixerError::InvalidProofFormat(
            "G1 point is not in affine form".to_string(),
        ));
    }
    let mut point = [0u8; 64];
    point[..32].copy_from_slice(&encode_coordinate(&coords[0])?);
    point[32..].copy_from_slice(&encode_coordinate(&coords[1])?);
    validate_g1_point(&point)?;
    Ok(point)
}

/// Proof object as produced by snarkjs (projective coordinates, z = 1).
#[derive(Clone, Debug, Deserialize)]
pub struct SnarkJsProof {
    pub pi_a: [String; 3],
    pub pi_b: [[String; 2]; 3],
    pub pi_c: [String; 3],
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub curve: Option<String>,
}

// ============================================================================
// VERIFIER SEAM
// ============================================================================

/// External proof verification capability.
///
/// `public_inputs` arrive in circuit order (see `public_inputs`). The call
/// must be side-effect free and bounded in time; the mixer runs it without
/// holding its state lock.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, proof: &Groth16Proof, public_inputs: &[FieldElement]) -> bool;
}

impl<F> ProofVerifier for F
where
    F: Fn(&Groth16Proof, &[FieldElement]) -> bool + Send + Sync,
{
    fn verify(&self, proof: &Groth16Proof, public_inputs: &[FieldElement]) -> bool {
        self(proof, public_inputs)
    }
}
