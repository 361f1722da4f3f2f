//! Errors raised by tasks and by scheduler construction.

use std::time::Duration;

use smartnode_ledger::LedgerError;
use smartnode_protocol::ProtocolError;
use smartnode_tx_engine::TxError;
use thiserror::Error;

/// A task failed this cycle. The scheduler logs it and moves on.
#[derive(Debug, Error)]
pub enum TaskError {
    /// A ledger or collaborator read failed.
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    /// A transaction could not be driven to inclusion.
    #[error("transaction: {0}")]
    Tx(#[from] TxError),

    /// A protocol-level operation failed.
    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Invalid scheduler timing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerConfigError {
    /// The interval bounds are inverted.
    #[error("min interval {min:?} exceeds max interval {max:?}")]
    InvertedInterval {
        /// Configured lower bound.
        min: Duration,

        /// Configured upper bound.
        max: Duration,
    },

    /// The scheduler was given no tasks.
    #[error("no tasks to schedule")]
    NoTasks,
}
