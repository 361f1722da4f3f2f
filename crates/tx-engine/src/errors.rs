//! Errors raised while pricing, submitting and tracking transactions.

use smartnode_ledger::LedgerError;
use smartnode_primitives::types::TxHash;
use thiserror::Error;

/// Result alias for transaction operations.
pub type TxResult<T> = Result<T, TxError>;

/// Errors raised while driving a transaction.
#[derive(Debug, Error)]
pub enum TxError {
    /// A ledger call failed.
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    /// No max fee is configured and the live fee could not be obtained.
    #[error("max fee unavailable: {0}")]
    FeeUnavailable(String),

    /// Gas estimation failed, usually because the call would revert.
    #[error("could not estimate gas for {action}: {source}")]
    Estimate {
        /// Name of the action being estimated.
        action: String,

        /// Underlying ledger error.
        source: LedgerError,
    },

    /// The transaction was included but execution failed.
    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    /// Shutdown was requested before the transaction was sent.
    #[error("cancelled before submission")]
    Cancelled,

    /// Shutdown was requested while waiting for inclusion.
    #[error("cancelled while waiting for inclusion of {0}")]
    CancelledPending(TxHash),
}

/// Invalid transaction configuration, detected when the policy is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A fee was negative or not a number.
    #[error("invalid {field}: {value}")]
    InvalidFee {
        /// Name of the offending setting.
        field: &'static str,

        /// The configured value.
        value: f64,
    },

    /// Neither a max fee nor the live fallback is configured.
    #[error("no max fee configured and live fee fallback disabled")]
    NoFeeSource,
}
