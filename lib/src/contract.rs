//! Bindings for the CosmoProof registry and the submission seam.
//!
//! [`ProofSubmitter`] is what the form talks to. [`ContractSubmitter`] is the
//! alloy-backed implementation; tests substitute an in-memory one.

use alloy::network::{Ethereum, ReceiptResponse};
use alloy::primitives::{Address, TxHash};
use alloy::providers::{PendingTransactionBuilder, Provider};
use alloy::sol;
use log::{debug, info};

use crate::args::SubmissionArgs;
use crate::error::{Error, Result};

sol! {
    #[sol(rpc)]
    interface ICosmoProof {
        function submitStabilityProof(
            bytes32 modelHash,
            uint256 lReg,
            uint256[2] calldata a,
            uint256[2][2] calldata b,
            uint256[2] calldata c,
            uint256[] calldata input
        ) external;
    }
}

/// Receipt summary for a confirmed submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// A transaction that has been broadcast but not yet mined
#[allow(async_fn_in_trait)]
pub trait PendingSubmission {
    fn tx_hash(&self) -> TxHash;

    /// Wait for the receipt. A reverted receipt is an error.
    async fn confirm(self) -> Result<Confirmation>;
}

#[allow(async_fn_in_trait)]
pub trait ProofSubmitter {
    type Pending: PendingSubmission;

    /// Registry the submission is addressed to
    fn contract_address(&self) -> Address;

    async fn submit(&self, args: SubmissionArgs) -> Result<Self::Pending>;
}

impl PendingSubmission for PendingTransactionBuilder<Ethereum> {
    fn tx_hash(&self) -> TxHash {
        *PendingTransactionBuilder::tx_hash(self)
    }

    async fn confirm(self) -> Result<Confirmation> {
        let receipt = self.get_receipt().await?;
        let tx_hash = ReceiptResponse::transaction_hash(&receipt);
        if !ReceiptResponse::status(&receipt) {
            return Err(Error::Reverted(tx_hash));
        }

        let confirmation = Confirmation {
            tx_hash,
            block_number: ReceiptResponse::block_number(&receipt),
            gas_used: ReceiptResponse::gas_used(&receipt),
        };
        debug!("confirmed {confirmation:?}");
        Ok(confirmation)
    }
}

/// Signer-bound `ICosmoProof` instance
pub struct ContractSubmitter<P> {
    contract: ICosmoProof::ICosmoProofInstance<P>,
}

impl<P: Provider> ContractSubmitter<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            contract: ICosmoProof::new(address, provider),
        }
    }
}

impl<P: Provider> ProofSubmitter for ContractSubmitter<P> {
    type Pending = PendingTransactionBuilder<Ethereum>;

    fn contract_address(&self) -> Address {
        *self.contract.address()
    }

    async fn submit(&self, args: SubmissionArgs) -> Result<Self::Pending> {
        let SubmissionArgs {
            model_hash,
            l_reg,
            a,
            b,
            c,
            input,
        } = args;

        info!(
            "submitStabilityProof to {} (modelHash {model_hash}, {} public inputs)",
            self.contract_address(),
            input.len()
        );
        let pending = self
            .contract
            .submitStabilityProof(model_hash, l_reg, a, b, c, input)
            .send()
            .await?;
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{B256, U256};
    use alloy::sol_types::SolCall;

    #[test]
    fn test_call_encoding_layout() {
        let call = ICosmoProof::submitStabilityProofCall {
            modelHash: B256::repeat_byte(0x11),
            lReg: U256::from(7u64),
            a: [U256::from(1u64), U256::from(2u64)],
            b: [
                [U256::from(3u64), U256::from(4u64)],
                [U256::from(5u64), U256::from(6u64)],
            ],
            c: [U256::from(8u64), U256::from(9u64)],
            input: vec![U256::from(10u64), U256::from(11u64)],
        };
        let data = call.abi_encode();

        // selector + 10 static words + offset word + length word + 2 elements
        assert_eq!(data.len(), 4 + 32 * (10 + 1 + 1 + 2));
        assert_eq!(&data[4..36], B256::repeat_byte(0x11).as_slice());
        assert_eq!(U256::from_be_slice(&data[36..68]), U256::from(7u64));
    }

    #[test]
    fn test_selector_matches_signature() {
        let selector = alloy::primitives::keccak256(
            "submitStabilityProof(bytes32,uint256,uint256[2],uint256[2][2],uint256[2],uint256[])",
        );
        assert_eq!(
            ICosmoProof::submitStabilityProofCall::SELECTOR,
            selector[..4]
        );
    }
}
