//! Service handles shared by every task.

use std::sync::Arc;

use smartnode_ledger::{AllowanceReader, ConsensusClient, DepositSigner, IdempotencyLedger};
use smartnode_primitives::types::Address;
use smartnode_protocol::ProtocolClient;
use smartnode_tx_engine::tx_driver::TxDriver;
use tokio_util::sync::CancellationToken;

/// Everything a task needs, built once at start and shared by all tasks.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// The operator account tasks act for.
    pub account: Address,

    /// Typed protocol reads.
    pub protocol: ProtocolClient,

    /// Transaction submission for `account`.
    pub driver: TxDriver,

    /// Submission flags of the reporting duties.
    pub flags: Arc<dyn IdempotencyLedger>,

    /// Token allowances of `account`.
    pub allowances: Arc<dyn AllowanceReader>,

    /// The consensus client.
    pub consensus: Arc<dyn ConsensusClient>,

    /// Signs validator deposits.
    pub signer: Arc<dyn DepositSigner>,

    /// Fires when the daemon is shutting down.
    pub cancel: CancellationToken,
}
