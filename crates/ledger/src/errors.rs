//! Error types for the ledger collaborators.

use alloy::transports::TransportError;
use smartnode_primitives::{
    errors::ParseError,
    types::{Address, TxHash},
};
use thiserror::Error;

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors raised while talking to an external collaborator.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The JSON-RPC transport or the node returned an error.
    #[error("rpc: {0}")]
    Rpc(#[from] TransportError),

    /// An endpoint URL or signing key could not be used.
    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    /// An HTTP request to the consensus client or signer failed.
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    /// A response field could not be parsed.
    #[error("malformed response: {0}")]
    Parse(#[from] ParseError),

    /// Contract return data could not be decoded.
    #[error("abi: {0}")]
    Abi(#[from] alloy::sol_types::Error),

    /// A contract read reverted or was rejected.
    #[error("call to {to} failed: {reason}")]
    CallFailed {
        /// Contract that was called.
        to: Address,

        /// Reason reported by the backend.
        reason: String,
    },

    /// A transaction could not be signed or was not accepted for broadcast.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The node does not know the transaction.
    #[error("unknown transaction {0}")]
    UnknownTransaction(TxHash),

    /// A response was well-formed but missing data the caller needs.
    #[error("missing data: {0}")]
    Missing(String),
}
