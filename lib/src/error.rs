//! Error type shared by every cosmoproof operation.

use std::path::PathBuf;

use alloy::primitives::TxHash;
use alloy::transports::TransportError;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed proof: {0}")]
    MalformedProof(&'static str),

    #[error("public input #{index} is missing (got {len} signals)")]
    MissingPublicInput { index: usize, len: usize },

    #[error("public input #{index} is not a 256-bit unsigned integer: {value:?}")]
    InvalidPublicInput { index: usize, value: String },

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid RPC URL {url:?}: {reason}")]
    InvalidRpcUrl { url: String, reason: String },

    #[error("chain id mismatch: {network} expects {expected}, RPC reports {actual}")]
    ChainIdMismatch {
        network: String,
        expected: u64,
        actual: u64,
    },

    #[error("invalid config {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("artifact {0} has no creation bytecode")]
    EmptyBytecode(String),

    #[error("deployment of {0} returned no contract address")]
    MissingContractAddress(String),

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error("transcript hash failed: {0}")]
    TranscriptHash(String),

    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    PendingTransaction(#[from] alloy::providers::PendingTransactionError),
}

impl Error {
    /// Message suitable for a status line.
    ///
    /// Node rejections carry their reason in the JSON-RPC error payload
    /// (e.g. `execution reverted: proof already submitted`); that text is
    /// preferred over the wrapped transport error.
    pub fn user_message(&self) -> String {
        let payload = match self {
            Error::Contract(alloy::contract::Error::TransportError(e)) | Error::Transport(e) => {
                e.as_error_resp()
            }
            _ => None,
        };

        match payload {
            Some(resp) => resp.message.to_string(),
            None => self.to_string(),
        }
    }
}
