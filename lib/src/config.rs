//! Network configuration
//!
//! Handles loading configuration from:
//! 1. COSMOPROOF_CONFIG env var (explicit path)
//! 2. ./cosmoproof.toml (current directory)
//! 3. built-in defaults (Scroll)
//!
//! Environment variables take precedence over TOML config. The deployer
//! key is never read from the file. The chain id is only checked when the
//! file or `CHAIN_ID` sets one.

use std::path::{Path, PathBuf};
use std::{env, fs};

use alloy::primitives::{Address, TxHash};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_ENV: &str = "COSMOPROOF_CONFIG";
pub const CONFIG_FILE_NAME: &str = "cosmoproof.toml";

pub const RPC_URL_ENV: &str = "SCROLL_RPC_URL";
pub const REGISTRY_ADDRESS_ENV: &str = "COSMOPROOF_ADDRESS";
pub const EXPLORER_URL_ENV: &str = "EXPLORER_URL";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";

const DEFAULT_NETWORK: &str = "Scroll";
const DEFAULT_RPC_URL: &str = "https://rpc.scroll.io";
const DEFAULT_EXPLORER_URL: &str = "https://scrollscan.com";

/// Target network and registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Checked against the RPC on connect when set
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,
    /// Deployed `CosmoProof` registry; zero until configured
    #[serde(default)]
    pub registry_address: Address,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            rpc_url: default_rpc_url(),
            chain_id: None,
            explorer_url: default_explorer_url(),
            registry_address: Address::ZERO,
        }
    }
}

fn default_name() -> String {
    DEFAULT_NETWORK.into()
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.into()
}

fn default_explorer_url() -> String {
    DEFAULT_EXPLORER_URL.into()
}

impl NetworkConfig {
    /// Load from the first config file found, then apply env overrides
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Like [`NetworkConfig::load`], with an explicit file taking priority
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = match path.map(Path::to_path_buf).or_else(find_config_file) {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("no {CONFIG_FILE_NAME} found, using defaults");
                Self::default()
            }
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var(RPC_URL_ENV) {
            if !url.is_empty() {
                self.rpc_url = url;
            }
        }
        if let Ok(url) = env::var(EXPLORER_URL_ENV) {
            if !url.is_empty() {
                self.explorer_url = url;
            }
        }
        if let Ok(id) = env::var(CHAIN_ID_ENV) {
            if !id.is_empty() {
                let id = id.trim().parse::<u64>().map_err(|e| Error::Config {
                    path: PathBuf::from(CHAIN_ID_ENV),
                    reason: format!("{e}"),
                })?;
                self.chain_id = Some(id);
            }
        }
        if let Ok(addr) = env::var(REGISTRY_ADDRESS_ENV) {
            if !addr.is_empty() {
                self.registry_address = addr.parse::<Address>().map_err(|e| Error::Config {
                    path: PathBuf::from(REGISTRY_ADDRESS_ENV),
                    reason: format!("{e}"),
                })?;
            }
        }
        Ok(())
    }

    /// Block-explorer page for a transaction
    pub fn explorer_tx_url(&self, tx_hash: &TxHash) -> String {
        format!("{}/tx/{tx_hash}", self.explorer_url.trim_end_matches('/'))
    }

    /// Block-explorer page for an address
    pub fn explorer_address_url(&self, address: &Address) -> String {
        format!("{}/address/{address}", self.explorer_url.trim_end_matches('/'))
    }
}

fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    local.exists().then_some(local)
}
