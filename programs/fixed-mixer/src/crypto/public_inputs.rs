//! Public inputs for the spend circuits
//!
//! The order below is the layout the circuits were compiled with. Any
//! reordering makes the verifier reject genuine proofs, or worse, accept
//! them with the wrong meaning.
//!
//! # Withdraw circuit (3 inputs)
//! 1. root - tree root the membership proof was built against
//! 2. nullifier_hash - one-time spend tag
//! 3. amount - fixed pool denomination
//!
//! # Forward circuit (4 inputs)
//! 1-3. as above
//! 4. new_commitment - commitment of the coin created inside the pool

use serde::{Deserialize, Serialize};

use super::field::FieldElement;
use crate::error::{MixerError, Result};

/// Public inputs of a withdraw proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    pub root: FieldElement,
    pub nullifier_hash: FieldElement,
    pub amount: u64,
}

impl PublicInputs {
    /// Number of public inputs for verification
    pub const COUNT: usize = 3;

    pub fn new(root: FieldElement, nullifier_hash: FieldElement, amount: u64) -> Self {
        Self {
            root,
            nullifier_hash,
            amount,
        }
    }

    /// Reject values no honest proof can carry.
    pub fn validate(&self) -> Result<()> {
        if self.root.is_zero() {
            return Err(MixerError::InvalidPublicInputs("root cannot be zero".into()));
        }
        if self.nullifier_hash.is_zero() {
            return Err(MixerError::InvalidPublicInputs(
                "nullifier hash cannot be zero".into(),
            ));
        }
        if self.amount == 0 {
            return Err(MixerError::InvalidPublicInputs("amount cannot be zero".into()));
        }
        Ok(())
    }

    /// `[root, nullifierHash, amount]`
    pub fn to_field_elements(&self) -> Vec<FieldElement> {
        vec![
            self.root,
            self.nullifier_hash,
            FieldElement::from_u64(self.amount),
        ]
    }

    /// Parse snarkjs `publicSignals`.
    pub fn from_public_signals<S: AsRef<str>>(signals: &[S]) -> Result<Self> {
        if signals.len() != Self::COUNT {
            return Err(MixerError::InvalidPublicInputs(format!(
                "withdraw expects {} public signals, got {}",
                Self::COUNT,
                signals.len()
            )));
        }
        Ok(Self {
            root: FieldElement::from_decimal(signals[0].as_ref())?,
            nullifier_hash: FieldElement::from_decimal(signals[1].as_ref())?,
            amount: parse_amount(signals[2].as_ref())?,
        })
    }
}

/// Public inputs of a forward proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardPublicInputs {
    pub spend: PublicInputs,
    pub new_commitment: FieldElement,
}

impl ForwardPublicInputs {
    pub const COUNT: usize = 4;

    pub fn new(spend: PublicInputs, new_commitment: FieldElement) -> Self {
        Self {
            spend,
            new_commitment,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.spend.validate()?;
        if self.new_commitment.is_zero() {
            return Err(MixerError::InvalidCommitment);
        }
        Ok(())
    }

    /// `[root, nullifierHash, amount, newCommitment]`
    pub fn to_field_elements(&self) -> Vec<FieldElement> {
        let mut elements = self.spend.to_field_elements();
        elements.push(self.new_commitment);
        elements
    }

    pub fn from_public_signals<S: AsRef<str>>(signals: &[S]) -> Result<Self> {
        if signals.len() != Self::COUNT {
            return Err(MixerError::InvalidPublicInputs(format!(
                "forward expects {} public signals, got {}",
                Self::COUNT,
                signals.len()
            )));
        }
        Ok(Self {
            spend: PublicInputs::from_public_signals(&signals[..PublicInputs::COUNT])?,
            new_commitment: FieldElement::from_decimal(signals[3].as_ref())?,
        })
    }
}

/// The amount signal must fit the pool's u64 denomination.
fn parse_amount(signal: &str) -> Result<u64> {
    let element = FieldElement::from_decimal(signal)?;
    let bytes = element.to_be_bytes();
    if bytes[..24].iter().any(|&b| b != 0) {
        return Err(MixerError::InvalidPublicInputs(format!(
            "amount {element} does not fit in 64 bits"
        )));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&bytes[24..]);
    Ok(u64::from_be_bytes(low))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_valid_inputs() -> PublicInputs {
        PublicInputs::new(FieldElement::from_u64(1), FieldElement::from_u64(2), 1000)
    }

    #[test]
    fn test_valid_inputs() {
        assert!(make_valid_inputs().validate().is_ok());
    }

    #[test]
    fn test_zero_root_invalid() {
        let mut inputs = make_valid_inputs();
        inputs.root = FieldElement::zero();
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_zero_nullifier_invalid() {
        let mut inputs = make_valid_inputs();
        inputs.nullifier_hash = FieldElement::zero();
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_zero_amount_invalid() {
        let mut inputs = make_valid_inputs();
        inputs.amount = 0;
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_field_element_order() {
        let inputs = make_valid_inputs();
        let fields = inputs.to_field_elements();
        assert_eq!(fields.len(), PublicInputs::COUNT);
        assert_eq!(fields[0], inputs.root);
        assert_eq!(fields[1], inputs.nullifier_hash);
        assert_eq!(fields[2], FieldElement::from_u64(1000));
    }

    #[test]
    fn test_forward_appends_new_commitment() {
        let forward = ForwardPublicInputs::new(make_valid_inputs(), FieldElement::from_u64(9));
        let fields = forward.to_field_elements();
        assert_eq!(fields.len(), ForwardPublicInputs::COUNT);
        assert_eq!(fields[3], FieldElement::from_u64(9));
        assert_eq!(&fields[..3], &make_valid_inputs().to_field_elements()[..]);
    }

    #[test]
    fn test_forward_zero_commitment_invalid() {
        let forward = ForwardPublicInputs::new(make_valid_inputs(), FieldElement::zero());
        assert_eq!(forward.validate(), Err(MixerError::InvalidCommitment));
    }

    #[test]
    fn test_from_public_signals() {
        let inputs = PublicInputs::from_public_signals(&["1", "2", "20000000000000000"]).unwrap();
        assert_eq!(inputs.amount, 20_000_000_000_000_000);
        assert_eq!(inputs.nullifier_hash, FieldElement::from_u64(2));
    }

    #[test]
    fn test_from_public_signals_wrong_arity() {
        assert!(matches!(
            PublicInputs::from_public_signals(&["1", "2"]),
            Err(MixerError::InvalidPublicInputs(_))
        ));
        assert!(matches!(
            ForwardPublicInputs::from_public_signals(&["1", "2", "3"]),
            Err(MixerError::InvalidPublicInputs(_))
        ));
    }

    #[test]
    fn test_from_public_signals_malformed() {
        assert!(matches!(
            PublicInputs::from_public_signals(&["1", "oops", "3"]),
            Err(MixerError::InvalidFieldElement(_))
        ));
        assert!(matches!(
            PublicInputs::from_public_signals(&["1", "2", "18446744073709551616"]),
            Err(MixerError::InvalidPublicInputs(_))
        ));
    }
}
