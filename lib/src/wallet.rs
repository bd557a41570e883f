//! Wallet connector
//!
//! Binds a local signer to the network's JSON-RPC endpoint. The connector
//! only tracks whether the last attempt succeeded; there is no retry, the
//! caller connects again.

use std::fmt;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use log::{debug, error, info};

use crate::config::NetworkConfig;
use crate::error::{Error, Result};

/// Signer-bound provider for one network
#[derive(Clone)]
pub struct Connection {
    pub provider: DynProvider,
    pub address: Address,
    pub chain_id: u64,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum WalletState {
    #[default]
    Disconnected,
    Connected {
        address: Address,
    },
    Failed,
}

#[derive(Debug, Default)]
pub struct WalletConnector {
    state: WalletState,
    connection: Option<Connection>,
}

impl WalletConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WalletState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, WalletState::Connected { .. })
    }

    /// A connected wallet is not reconnected
    pub fn can_connect(&self) -> bool {
        !self.is_connected()
    }

    pub fn label(&self) -> String {
        match &self.state {
            WalletState::Disconnected => "Connect Wallet".to_string(),
            WalletState::Connected { address } => {
                format!("Wallet Connected: {}", short_address(address))
            }
            WalletState::Failed => "Connection Failed".to_string(),
        }
    }

    /// Connect with a local key. Once connected, later calls return the
    /// existing connection.
    pub async fn connect(
        &mut self,
        network: &NetworkConfig,
        private_key: &str,
    ) -> Result<Connection> {
        if let Some(connection) = self.connection.as_ref().filter(|_| !self.can_connect()) {
            debug!("wallet {} already connected", connection.address);
            return Ok(connection.clone());
        }
        match local_provider(network, private_key) {
            Ok((provider, address)) => self.attach(network, provider, address).await,
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn attach(
        &mut self,
        network: &NetworkConfig,
        provider: DynProvider,
        address: Address,
    ) -> Result<Connection> {
        let chain_id = match check_chain_id(&provider, network).await {
            Ok(chain_id) => chain_id,
            Err(e) => return Err(self.fail(e)),
        };
        info!(
            "wallet {address} connected to {} (chain {chain_id})",
            network.name
        );
        let connection = Connection {
            provider,
            address,
            chain_id,
        };
        self.state = WalletState::Connected { address };
        self.connection = Some(connection.clone());
        Ok(connection)
    }

    fn fail(&mut self, e: Error) -> Error {
        error!("Could not connect wallet: {e}");
        self.state = WalletState::Failed;
        self.connection = None;
        e
    }
}

fn local_provider(network: &NetworkConfig, private_key: &str) -> Result<(DynProvider, Address)> {
    let signer = private_key
        .trim()
        .parse::<PrivateKeySigner>()
        .map_err(|e| Error::InvalidPrivateKey(format!("{e}")))?;
    let address = signer.address();

    let url = network.rpc_url.parse::<Url>().map_err(|e| Error::InvalidRpcUrl {
        url: network.rpc_url.clone(),
        reason: format!("{e}"),
    })?;

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(url)
        .erased();
    Ok((provider, address))
}

/// Ask the RPC for its chain id; a configured id must match it
pub async fn check_chain_id<P: Provider>(provider: &P, network: &NetworkConfig) -> Result<u64> {
    let chain_id = provider.get_chain_id().await?;
    match network.chain_id {
        Some(expected) if expected != chain_id => Err(Error::ChainIdMismatch {
            network: network.name.clone(),
            expected,
            actual: chain_id,
        }),
        _ => Ok(chain_id),
    }
}

/// `0x1234...` form used in status labels
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...", &full[..6])
}
