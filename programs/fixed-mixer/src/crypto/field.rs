//! Scalar field elements
//!
//! Every value the mixer hashes, stores or publishes is an element of the
//! BN254 scalar field, the field the circom/snarkjs toolchain proves over.
//!
//! # Encodings
//! - decimal string: the `toString` form used in snarkjs public signals
//! - 32 bytes, big-endian
//!
//! Both parsers reject non-canonical input (value >= r) instead of
//! reducing it, so two different encodings never name the same element.

use std::{fmt, str::FromStr};

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::curve_utils::scalar_field_modulus;
use crate::error::{MixerError, Result};

/// Element of the BN254 scalar field.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldElement(Fr);

impl FieldElement {
    /// Encoded length in bytes.
    pub const BYTES: usize = 32;

    pub fn zero() -> Self {
        Self(Fr::from(0u64))
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Parse 32 big-endian bytes, rejecting values >= r.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Result<Self> {
        Self::from_biguint(&BigUint::from_bytes_be(bytes))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let bytes = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        out
    }

    /// Parse a decimal string such as a snarkjs public signal.
    pub fn from_decimal(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MixerError::InvalidFieldElement(format!(
                "{s:?} is not a decimal integer"
            )));
        }
        let value = BigUint::parse_bytes(trimmed.as_bytes(), 10).ok_or_else(|| {
            MixerError::InvalidFieldElement(format!("{s:?} is not a decimal integer"))
        })?;
        Self::from_biguint(&value)
    }

    pub fn from_biguint(value: &BigUint) -> Result<Self> {
        if value >= scalar_field_modulus() {
            return Err(MixerError::InvalidFieldElement(format!(
                "{value} is not below the scalar field modulus"
            )));
        }
        let bytes = value.to_bytes_be();
        Ok(Self(Fr::from_be_bytes_mod_order(&bytes)))
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.to_be_bytes())
    }

    /// Underlying arkworks element, for hash backends.
    pub fn as_fr(&self) -> &Fr {
        &self.0
    }

    /// First four bytes in hex. Enough to correlate log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.to_be_bytes()[..4])
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<Fr> for FieldElement {
    fn from(value: Fr) -> Self {
        Self(value)
    }
}

impl FromStr for FieldElement {
    type Err = MixerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_decimal(s)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_biguint())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_decimal(&s).map_err(serde::de::Error::custom)
    }
}
