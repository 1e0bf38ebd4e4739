//! BN254 curve constants and point encoding helpers
//!
//! Proof points travel as uncompressed big-endian coordinates over the
//! BN254 base field. Range, on-curve and G2 subgroup checks live here; the
//! pairing check belongs to the verifier.

use std::sync::OnceLock;

use ark_bn254::{Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ff::PrimeField;
use num_bigint::BigUint;
use num_traits::Num;

use crate::error::{MixerError, Result};

// ============================================================================
// BN254 CURVE PARAMETERS
// ============================================================================

/// G1 point in uncompressed form (64 bytes: x || y).
pub type G1Point = [u8; 64];

/// G2 point in uncompressed form (128 bytes: x.c1 || x.c0 || y.c1 || y.c0).
pub type G2Point = [u8; 128];

/// Base field modulus p.
pub fn base_field_modulus() -> &'static BigUint {
    static P: OnceLock<BigUint> = OnceLock::new();
    P.get_or_init(|| BigUint::from(<Fq as PrimeField>::MODULUS))
}

/// Scalar field modulus r.
pub fn scalar_field_modulus() -> &'static BigUint {
    static R: OnceLock<BigUint> = OnceLock::new();
    R.get_or_init(|| BigUint::from(<Fr as PrimeField>::MODULUS))
}

// ============================================================================
// COORDINATE ENCODING
// ============================================================================

/// Parse a decimal base-field coordinate into 32 big-endian bytes.
pub fn encode_coordinate(decimal: &str) -> Result<[u8; 32]> {
    let trimmed = decimal.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MixerError::InvalidProofFormat(format!(
            "coordinate {decimal:?} is not a decimal integer"
        )));
    }
    let value = BigUint::from_str_radix(trimmed, 10)
        .map_err(|e| MixerError::InvalidProofFormat(e.to_string()))?;
    if &value >= base_field_modulus() {
        return Err(MixerError::InvalidProofFormat(format!(
            "coordinate {trimmed} is not below the base field modulus"
        )));
    }

    let bytes = value.to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

/// Decode a 32-byte big-endian coordinate, rejecting values >= p.
fn decode_coordinate(bytes: &[u8]) -> Result<Fq> {
    if &BigUint::from_bytes_be(bytes) >= base_field_modulus() {
        return Err(MixerError::InvalidProofFormat(
            "coordinate is not below the base field modulus".to_string(),
        ));
    }
    Ok(Fq::from_be_bytes_mod_order(bytes))
}

// ============================================================================
// POINT CHECKS
// ============================================================================

/// Check if a G1 point is the identity (point at infinity).
pub fn is_g1_identity(point: &G1Point) -> bool {
    point.iter().all(|&b| b == 0)
}

/// Check if a G2 point is the identity.
pub fn is_g2_identity(point: &G2Point) -> bool {
    point.iter().all(|&b| b == 0)
}

/// Validate that a G1 point is on the BN254 curve: y² = x³ + 3 (mod p).
///
/// G1 has cofactor 1, so being on the curve puts it in the subgroup.
pub fn validate_g1_point(point: &G1Point) -> Result<()> {
    if is_g1_identity(point) {
        return Err(MixerError::InvalidProofFormat(
            "G1 point is the identity".to_string(),
        ));
    }

    let x = decode_coordinate(&point[..32])?;
    let y = decode_coordinate(&point[32..])?;
    if !G1Affine::new_unchecked(x, y).is_on_curve() {
        return Err(MixerError::InvalidProofFormat(
            "G1 point is not on the curve".to_string(),
        ));
    }
    Ok(())
}

/// Validate that a G2 point is on the twist and in the prime-order subgroup.
pub fn validate_g2_point(point: &G2Point) -> Result<()> {
    if is_g2_identity(point) {
        return Err(MixerError::InvalidProofFormat(
            "G2 point is the identity".to_string(),
        ));
    }

    let x = Fq2::new(
        decode_coordinate(&point[32..64])?,
        decode_coordinate(&point[..32])?,
    );
    let y = Fq2::new(
        decode_coordinate(&point[96..128])?,
        decode_coordinate(&point[64..96])?,
    );
    let affine = G2Affine::new_unchecked(x, y);
    if !affine.is_on_curve() {
        return Err(MixerError::InvalidProofFormat(
            "G2 point is not on the twist".to_string(),
        ));
    }
    if !affine.is_in_correct_subgroup_assuming_on_curve() {
        return Err(MixerError::InvalidProofFormat(
            "G2 point is outside the prime-order subgroup".to_string(),
        ));
    }
    Ok(())
}
