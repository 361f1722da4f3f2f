//! Errors raised while resolving and calling protocol contracts.

use smartnode_ledger::LedgerError;
use smartnode_tx_engine::TxError;
use thiserror::Error;

/// Result alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised by the protocol layer.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A ledger read failed.
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    /// A transaction could not be driven to inclusion.
    #[error("transaction: {0}")]
    Tx(#[from] TxError),

    /// The storage contract has no address for a contract the daemon needs.
    #[error("contract {0} is not deployed")]
    ZeroAddress(&'static str),
}
