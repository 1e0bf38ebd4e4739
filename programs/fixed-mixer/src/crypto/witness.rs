//! Circuit input for off-line proof generation
//!
//! The witness calculator consumes a JSON object with these exact keys:
//!
//! ```text
//! root, amount, nullifierHash, secret, paths2_root, paths2_root_pos
//! ```
//!
//! All values are decimal strings. `paths2_root_pos` holds the placement
//! bits of the path, least significant level first.

use serde::Serialize;

use super::field::FieldElement;
use crate::error::{MixerError, Result};
use crate::state::merkle_tree::MerklePath;

#[derive(Clone, Serialize)]
pub struct WitnessInput {
    pub root: FieldElement,
    pub amount: String,
    #[serde(rename = "nullifierHash")]
    pub nullifier_hash: FieldElement,
    pub secret: FieldElement,
    pub paths2_root: Vec<FieldElement>,
    pub paths2_root_pos: Vec<String>,
}

impl WitnessInput {
    /// Shape a witness for the spend of the coin at `position`.
    pub fn new(
        root: FieldElement,
        amount: u64,
        nullifier_hash: FieldElement,
        secret: FieldElement,
        position: u64,
        path: &MerklePath,
    ) -> Result<Self> {
        if path.position() != position {
            return Err(MixerError::InvalidPublicInputs(format!(
                "path encodes position {}, coin sits at {position}",
                path.position()
            )));
        }

        Ok(Self {
            root,
            amount: amount.to_string(),
            nullifier_hash,
            secret,
            paths2_root: path.siblings().to_vec(),
            paths2_root_pos: path
                .path_bits()
                .iter()
                .map(|&bit| if bit { "1" } else { "0" }.to_string())
                .collect(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| MixerError::InvalidPublicInputs(e.to_string()))
    }
}
