//! # cosmoproof
//!
//! Submits Groth16 stability proofs to the CosmoProof registry on an EVM
//! network (Scroll by default), and deploys the verifier/registry pair.
//! Compatible with snarkjs/circom generated proofs.
//!
//! ## Features
//! - Reads snarkjs `proof.json` / `public.json` and derives the six
//!   `submitStabilityProof` arguments
//! - Local-key wallet connector bound to a JSON-RPC provider
//! - Submission form state machine with status reporting and explorer links
//! - Verifier + registry deployment from Hardhat artifacts
//! - Fixed-point stability payload (`input.json`) generator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cosmoproof::prelude::*;
//!
//! let network = NetworkConfig::load()?;
//! let mut wallet = WalletConnector::new();
//! let connection = wallet.connect(&network, &private_key).await?;
//! let submitter = ContractSubmitter::new(network.registry_address, connection.provider);
//!
//! let mut form = SubmissionForm::new(&network.name);
//! form.select_proof_file("proof.json");
//! form.select_public_file("public.json");
//! let status = form.submit(Some(&submitter), |s| println!("{s}")).await;
//! ```

pub mod args;
pub mod config;
pub mod contract;
pub mod deploy;
pub mod error;
pub mod form;
pub mod payload;
pub mod types;
pub mod wallet;

// Re-export main types
pub use args::SubmissionArgs;
pub use config::NetworkConfig;
pub use contract::{ContractSubmitter, PendingSubmission, ProofSubmitter};
pub use deploy::{deploy_contracts, ChainDeployer, ContractArtifact, ContractDeployer, Deployment};
pub use error::{Error, Result};
pub use form::{Status, SubmissionForm};
pub use types::{G1Point, G2Point, Proof, ProofJson, PublicSignals};
pub use wallet::{Connection, WalletConnector};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::args::SubmissionArgs;
    pub use crate::config::NetworkConfig;
    pub use crate::contract::{ContractSubmitter, PendingSubmission, ProofSubmitter};
    pub use crate::deploy::{deploy_contracts, ChainDeployer, ContractArtifact, ContractDeployer};
    pub use crate::form::{Status, SubmissionForm};
    pub use crate::types::{ProofJson, PublicSignals};
    pub use crate::wallet::{Connection, WalletConnector};
}
