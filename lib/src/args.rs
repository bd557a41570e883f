//! Reshapes snarkjs artifacts into `submitStabilityProof` arguments.

use alloy::primitives::{B256, U256};
use serde::Serialize;

use crate::error::Result;
use crate::types::{ProofJson, PublicSignals};

/// Position of the model hash in the circuit's public signals
pub const MODEL_HASH_INDEX: usize = 0;

/// Position of the claimed regularization loss `L_reg_q_claim`
pub const L_REG_INDEX: usize = 3;

/// The six positional arguments of `submitStabilityProof`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionArgs {
    pub model_hash: B256,
    pub l_reg: U256,
    pub a: [U256; 2],
    pub b: [[U256; 2]; 2],
    pub c: [U256; 2],
    pub input: Vec<U256>,
}

impl SubmissionArgs {
    pub fn derive(proof: &ProofJson, public: &PublicSignals) -> Result<Self> {
        let proof = proof.to_proof()?;
        let input = public.to_field_elements()?;

        Ok(Self {
            model_hash: bytes32(public.get(MODEL_HASH_INDEX)?),
            l_reg: public.get(L_REG_INDEX)?,
            a: proof.a.to_call_array(),
            b: proof.b.to_call_array(),
            c: proof.c.to_call_array(),
            input,
        })
    }
}

/// Big-endian, left-padded to 32 bytes
pub fn bytes32(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}
