//! Proof submission form
//!
//! Holds the selected artifacts, the status line, and the hash of the last
//! successful submission. `submit` never returns an error: every failure is
//! reduced to a [`Status`] the front end displays.

use std::fmt;
use std::path::{Path, PathBuf};

use alloy::primitives::TxHash;
use log::{info, warn};

use crate::args::SubmissionArgs;
use crate::config::NetworkConfig;
use crate::contract::{Confirmation, PendingSubmission, ProofSubmitter};
use crate::error::Result;
use crate::types::{read_json, ProofJson, PublicSignals};

pub const MISSING_INPUTS: &str = "Wallet not connected or files missing.";
pub const UNCONFIGURED_CONTRACT: &str =
    "Registry contract address is not configured (set COSMOPROOF_ADDRESS).";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    AwaitingUpload,
    Ready,
    /// Blocking error, nothing was sent
    Error(String),
    Parsing,
    Sending {
        network: String,
    },
    Pending(TxHash),
    Success(TxHash),
    Failed(String),
}

impl Status {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Status::Parsing | Status::Sending { .. } | Status::Pending(_)
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::AwaitingUpload => write!(f, "Awaiting Proof Upload"),
            Status::Ready => write!(f, "Ready to submit (Files uploaded)"),
            Status::Error(msg) => write!(f, "ERROR: {msg}"),
            Status::Parsing => write!(f, "Reading files and parsing ZK data..."),
            Status::Sending { network } => write!(f, "Sending transaction to {network}..."),
            Status::Pending(hash) => write!(f, "Transaction pending: {hash}"),
            Status::Success(_) => write!(f, "Verification Success! Proof submitted on-chain."),
            Status::Failed(msg) => write!(f, "Transaction Failed: {msg}"),
        }
    }
}

#[derive(Debug)]
pub struct SubmissionForm {
    network: String,
    proof_file: Option<PathBuf>,
    public_file: Option<PathBuf>,
    status: Status,
    tx_hash: Option<TxHash>,
}

impl SubmissionForm {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            proof_file: None,
            public_file: None,
            status: Status::AwaitingUpload,
            tx_hash: None,
        }
    }

    pub fn select_proof_file(&mut self, path: impl Into<PathBuf>) {
        self.proof_file = Some(path.into());
        self.status = Status::Ready;
    }

    pub fn select_public_file(&mut self, path: impl Into<PathBuf>) {
        self.public_file = Some(path.into());
        self.status = Status::Ready;
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Hash of the last confirmed submission
    pub fn tx_hash(&self) -> Option<TxHash> {
        self.tx_hash
    }

    pub fn explorer_link(&self, network: &NetworkConfig) -> Option<String> {
        self.tx_hash.map(|hash| network.explorer_tx_url(&hash))
    }

    pub fn is_busy(&self) -> bool {
        self.status.is_busy()
    }

    pub fn can_submit(&self, has_signer: bool) -> bool {
        has_signer
            && self.proof_file.is_some()
            && self.public_file.is_some()
            && !self.is_busy()
            && !matches!(self.status, Status::Error(_))
    }

    /// Parse both artifacts, send `submitStabilityProof`, and wait for the
    /// receipt. `observe` sees every status change as it happens.
    pub async fn submit<S, F>(&mut self, submitter: Option<&S>, mut observe: F) -> &Status
    where
        S: ProofSubmitter,
        F: FnMut(&Status),
    {
        let (Some(submitter), Some(proof_path), Some(public_path)) = (
            submitter,
            self.proof_file.clone(),
            self.public_file.clone(),
        ) else {
            self.set_status(Status::Error(MISSING_INPUTS.into()), &mut observe);
            return &self.status;
        };

        if submitter.contract_address().is_zero() {
            self.set_status(Status::Error(UNCONFIGURED_CONTRACT.into()), &mut observe);
            return &self.status;
        }

        self.set_status(Status::Parsing, &mut observe);
        match self
            .send(submitter, &proof_path, &public_path, &mut observe)
            .await
        {
            Ok(confirmation) => {
                info!(
                    "proof accepted in tx {} (block {:?})",
                    confirmation.tx_hash, confirmation.block_number
                );
                self.tx_hash = Some(confirmation.tx_hash);
                self.set_status(Status::Success(confirmation.tx_hash), &mut observe);
            }
            Err(e) => {
                warn!("Submission Error: {e}");
                self.set_status(Status::Failed(e.user_message()), &mut observe);
            }
        }
        &self.status
    }

    async fn send<S, F>(
        &mut self,
        submitter: &S,
        proof_path: &Path,
        public_path: &Path,
        observe: &mut F,
    ) -> Result<Confirmation>
    where
        S: ProofSubmitter,
        F: FnMut(&Status),
    {
        let proof: ProofJson = read_json(proof_path).await?;
        let public: PublicSignals = read_json(public_path).await?;
        let args = SubmissionArgs::derive(&proof, &public)?;

        self.set_status(
            Status::Sending {
                network: self.network.clone(),
            },
            observe,
        );
        let pending = submitter.submit(args).await?;

        self.set_status(Status::Pending(pending.tx_hash()), observe);
        pending.confirm().await
    }

    fn set_status<F: FnMut(&Status)>(&mut self, status: Status, observe: &mut F) {
        self.status = status;
        observe(&self.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use alloy::primitives::{Address, B256, U256};
    use alloy::transports::TransportError;
    use std::cell::{Cell, RefCell};
    use std::fs;

    const PROOF: &str = r#"{
        "pi_a": ["1", "2", "1"],
        "pi_b": [["3", "4"], ["5", "6"], ["1", "0"]],
        "pi_c": ["7", "8", "1"],
        "protocol": "groth16",
        "curve": "bn128"
    }"#;
    const PUBLIC: &str = r#"["255", "10", "20", "3000"]"#;

    struct MockPending {
        hash: TxHash,
        revert: bool,
    }

    impl PendingSubmission for MockPending {
        fn tx_hash(&self) -> TxHash {
            self.hash
        }

        async fn confirm(self) -> Result<Confirmation> {
            if self.revert {
                return Err(Error::Reverted(self.hash));
            }
            Ok(Confirmation {
                tx_hash: self.hash,
                block_number: Some(1),
                gas_used: 250_000,
            })
        }
    }

    struct MockSubmitter {
        address: Address,
        calls: Cell<usize>,
        last_args: RefCell<Option<SubmissionArgs>>,
        rejection: Option<&'static str>,
        revert: bool,
    }

    impl MockSubmitter {
        fn new() -> Self {
            Self {
                address: Address::repeat_byte(0x42),
                calls: Cell::new(0),
                last_args: RefCell::new(None),
                rejection: None,
                revert: false,
            }
        }
    }

    impl ProofSubmitter for MockSubmitter {
        type Pending = MockPending;

        fn contract_address(&self) -> Address {
            self.address
        }

        async fn submit(&self, args: SubmissionArgs) -> Result<MockPending> {
            self.calls.set(self.calls.get() + 1);
            if let Some(message) = self.rejection {
                let payload = serde_json::from_value(serde_json::json!({
                    "code": -32000,
                    "message": message,
                }))
                .unwrap();
                return Err(Error::Transport(TransportError::ErrorResp(payload)));
            }
            *self.last_args.borrow_mut() = Some(args);
            Ok(MockPending {
                hash: TxHash::repeat_byte(0xab),
                revert: self.revert,
            })
        }
    }

    fn artifacts(proof: &str, public: &str) -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let proof_path = dir.path().join("proof.json");
        let public_path = dir.path().join("public.json");
        fs::write(&proof_path, proof).unwrap();
        fs::write(&public_path, public).unwrap();
        (dir, proof_path, public_path)
    }

    fn loaded_form(proof: &Path, public: &Path) -> SubmissionForm {
        let mut form = SubmissionForm::new("Scroll");
        form.select_proof_file(proof);
        form.select_public_file(public);
        form
    }

    #[test]
    fn test_status_progression_on_selection() {
        let mut form = SubmissionForm::new("Scroll");
        assert_eq!(form.status().to_string(), "Awaiting Proof Upload");
        form.select_proof_file("proof.json");
        assert_eq!(form.status(), &Status::Ready);
        assert!(!form.can_submit(true));
        form.select_public_file("public.json");
        assert!(form.can_submit(true));
        assert!(!form.can_submit(false));
    }

    #[tokio::test]
    async fn test_missing_signer_blocks_submission() {
        let (_dir, proof, public) = artifacts(PROOF, PUBLIC);
        let mut form = loaded_form(&proof, &public);

        let status = form.submit(None::<&MockSubmitter>, |_| {}).await;
        assert_eq!(status, &Status::Error(MISSING_INPUTS.into()));
        assert!(!form.can_submit(true));
    }

    #[tokio::test]
    async fn test_missing_file_blocks_submission() {
        let (_dir, proof, _public) = artifacts(PROOF, PUBLIC);
        let submitter = MockSubmitter::new();
        let mut form = SubmissionForm::new("Scroll");
        form.select_proof_file(&proof);

        let status = form.submit(Some(&submitter), |_| {}).await.clone();
        assert_eq!(status.to_string(), format!("ERROR: {MISSING_INPUTS}"));
        assert_eq!(submitter.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_zero_contract_address_blocks_submission() {
        let (_dir, proof, public) = artifacts(PROOF, PUBLIC);
        let submitter = MockSubmitter {
            address: Address::ZERO,
            ..MockSubmitter::new()
        };
        let mut form = loaded_form(&proof, &public);

        let status = form.submit(Some(&submitter), |_| {}).await;
        assert_eq!(status, &Status::Error(UNCONFIGURED_CONTRACT.into()));
        assert_eq!(submitter.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let (_dir, proof, public) = artifacts(PROOF, PUBLIC);
        let submitter = MockSubmitter::new();
        let mut form = loaded_form(&proof, &public);
        let mut seen = Vec::new();

        let status = form
            .submit(Some(&submitter), |s| seen.push(s.clone()))
            .await
            .clone();

        let hash = TxHash::repeat_byte(0xab);
        assert_eq!(status, Status::Success(hash));
        assert_eq!(
            seen,
            vec![
                Status::Parsing,
                Status::Sending {
                    network: "Scroll".into()
                },
                Status::Pending(hash),
                Status::Success(hash),
            ]
        );
        assert_eq!(form.tx_hash(), Some(hash));

        let link = form.explorer_link(&NetworkConfig::default()).unwrap();
        assert!(link.contains(&hash.to_string()));

        let args = submitter.last_args.borrow().clone().unwrap();
        assert_eq!(args.model_hash, B256::with_last_byte(0xff));
        assert_eq!(args.l_reg, U256::from(3000u64));
        assert_eq!(args.input.len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_json_becomes_failure_status() {
        let (_dir, proof, public) = artifacts("{ not json", PUBLIC);
        let submitter = MockSubmitter::new();
        let mut form = loaded_form(&proof, &public);

        let status = form.submit(Some(&submitter), |_| {}).await;
        let Status::Failed(msg) = status else {
            panic!("expected failure, got {status:?}");
        };
        assert!(msg.contains("invalid JSON"));
        assert_eq!(submitter.calls.get(), 0);
        assert_eq!(form.tx_hash(), None);
    }

    #[tokio::test]
    async fn test_invalid_public_json_becomes_failure_status() {
        let (_dir, proof, public) = artifacts(PROOF, "[\"1\", ");
        let submitter = MockSubmitter::new();
        let mut form = loaded_form(&proof, &public);

        let status = form.submit(Some(&submitter), |_| {}).await;
        let Status::Failed(msg) = status else {
            panic!("expected failure, got {status:?}");
        };
        assert!(msg.contains("invalid JSON"));
        assert!(msg.contains("public"));
        assert_eq!(submitter.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_empty_public_signal_is_not_sent() {
        let (_dir, proof, public) = artifacts(PROOF, r#"["", "2", "3", "4"]"#);
        let submitter = MockSubmitter::new();
        let mut form = loaded_form(&proof, &public);

        let status = form.submit(Some(&submitter), |_| {}).await;
        assert!(matches!(status, Status::Failed(_)));
        assert_eq!(submitter.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_on_disk_becomes_failure_status() {
        let (dir, proof, _public) = artifacts(PROOF, PUBLIC);
        let submitter = MockSubmitter::new();
        let mut form = loaded_form(&proof, &dir.path().join("absent.json"));

        let status = form.submit(Some(&submitter), |_| {}).await;
        assert!(matches!(status, Status::Failed(_)));
    }

    #[tokio::test]
    async fn test_rpc_rejection_uses_payload_message() {
        let (_dir, proof, public) = artifacts(PROOF, PUBLIC);
        let submitter = MockSubmitter {
            rejection: Some("insufficient funds for gas"),
            ..MockSubmitter::new()
        };
        let mut form = loaded_form(&proof, &public);

        let status = form.submit(Some(&submitter), |_| {}).await;
        assert_eq!(status.to_string(), "Transaction Failed: insufficient funds for gas");
        assert_eq!(submitter.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_reverted_receipt_is_failure() {
        let (_dir, proof, public) = artifacts(PROOF, PUBLIC);
        let submitter = MockSubmitter {
            revert: true,
            ..MockSubmitter::new()
        };
        let mut form = loaded_form(&proof, &public);

        let status = form.submit(Some(&submitter), |_| {}).await;
        assert!(matches!(status, Status::Failed(msg) if msg.contains("reverted")));
        assert_eq!(form.tx_hash(), None);
        assert!(form.can_submit(true));
    }
}
