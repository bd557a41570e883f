//! Contract deployment
//!
//! Deploys the Groth16 `Verifier`, then the `CosmoProof` registry with the
//! verifier's address as its only constructor argument. Creation code comes
//! from Hardhat build artifacts. Nothing is rolled back: if the registry
//! deployment fails the verifier stays deployed and unlinked.

use std::fs;
use std::path::{Path, PathBuf};

use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolValue;
use log::{debug, info};
use serde::Deserialize;

use crate::error::{Error, Result};

pub const VERIFIER_CONTRACT: &str = "Verifier";
pub const REGISTRY_CONTRACT: &str = "CosmoProof";

/// The parts of a Hardhat artifact (`hh-sol-artifact-1`) needed to deploy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    #[serde(default)]
    pub source_name: Option<String>,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// `{artifacts}/contracts/{name}.sol/{name}.json`
    pub fn artifact_path(artifacts_dir: &Path, name: &str) -> PathBuf {
        artifacts_dir
            .join("contracts")
            .join(format!("{name}.sol"))
            .join(format!("{name}.json"))
    }

    pub fn load(artifacts_dir: &Path, name: &str) -> Result<Self> {
        Self::from_file(&Self::artifact_path(artifacts_dir, name))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        crate::types::parse_json(path, &text)
    }

    /// Interfaces and abstract contracts compile to empty bytecode
    pub fn ensure_deployable(&self) -> Result<()> {
        if self.bytecode.is_empty() {
            return Err(Error::EmptyBytecode(self.contract_name.clone()));
        }
        Ok(())
    }

    /// Bytecode followed by ABI-encoded constructor arguments
    pub fn creation_code(&self, constructor_args: &[u8]) -> Result<Bytes> {
        self.ensure_deployable()?;
        let mut code = Vec::with_capacity(self.bytecode.len() + constructor_args.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(constructor_args);
        Ok(code.into())
    }
}

#[allow(async_fn_in_trait)]
pub trait ContractDeployer {
    /// Account paying for the deployments
    fn deployer_address(&self) -> Address;

    /// Send a create transaction and return the new contract's address
    async fn deploy(&self, name: &str, creation_code: Bytes) -> Result<Address>;
}

/// Deploys through a signer-bound provider
pub struct ChainDeployer<P> {
    provider: P,
    address: Address,
}

impl<P: Provider> ChainDeployer<P> {
    pub fn new(provider: P, address: Address) -> Self {
        Self { provider, address }
    }
}

impl<P: Provider> ContractDeployer for ChainDeployer<P> {
    fn deployer_address(&self) -> Address {
        self.address
    }

    async fn deploy(&self, name: &str, creation_code: Bytes) -> Result<Address> {
        let tx = TransactionRequest::default()
            .with_from(self.address)
            .with_deploy_code(creation_code);

        let pending = self.provider.send_transaction(tx).await?;
        debug!("{name} deployment sent in tx {}", pending.tx_hash());

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(Error::Reverted(receipt.transaction_hash()));
        }
        receipt
            .contract_address()
            .ok_or_else(|| Error::MissingContractAddress(name.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub verifier: Address,
    pub registry: Address,
}

/// Deploy the verifier, then the registry bound to it
pub async fn deploy_contracts<D: ContractDeployer>(
    deployer: &D,
    verifier: &ContractArtifact,
    registry: &ContractArtifact,
) -> Result<Deployment> {
    registry.ensure_deployable()?;
    debug!("deployer account {}", deployer.deployer_address());

    let verifier_address = deployer
        .deploy(&verifier.contract_name, verifier.creation_code(&[])?)
        .await?;
    info!(
        "{} contract deployed at: {verifier_address}",
        verifier.contract_name
    );

    let registry_address = deployer
        .deploy(
            &registry.contract_name,
            registry.creation_code(&verifier_address.abi_encode())?,
        )
        .await?;
    info!(
        "{} contract deployed at: {registry_address}",
        registry.contract_name
    );

    Ok(Deployment {
        verifier: verifier_address,
        registry: registry_address,
    })
}
