//! Stakes the node's prelaunch minipools.

use std::sync::Arc;

use async_trait::async_trait;
use smartnode_ledger::signer::DepositSigningRequest;
use smartnode_primitives::{
    deposit::{withdrawal_credentials, DepositMessage, PRELAUNCH_DEPOSIT_GWEI},
    types::{Address, BlockId},
};
use smartnode_protocol::minipool::MinipoolStatus;
use smartnode_tx_engine::{
    gas::{CostGate, SkipReason},
    tx_driver::DriveOutcome,
};
use tracing::{debug, info};

use crate::{context::ServiceContext, errors::TaskError, task::Task};

/// What one staking cycle did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StakeReport {
    /// Minipools staked this cycle.
    pub staked: Vec<Address>,

    /// Prelaunch minipools whose validator the consensus client already knows.
    pub already_deposited: Vec<Address>,

    /// Set when the gas policy declined; the remaining minipools wait for the next cycle.
    pub declined: Option<SkipReason>,
}

/// Stakes every prelaunch minipool of the node with a signed deposit.
#[derive(Debug)]
pub struct MinipoolLifecycleTask {
    ctx: Arc<ServiceContext>,
    gate: CostGate,
}

impl MinipoolLifecycleTask {
    /// Creates the task gated by `gate`.
    pub fn new(ctx: Arc<ServiceContext>, gate: CostGate) -> Self {
        Self { ctx, gate }
    }

    /// The node's minipools in prelaunch.
    async fn prelaunch_minipools(&self) -> Result<Vec<Address>, TaskError> {
        let protocol = &self.ctx.protocol;
        let addresses = protocol.node_minipools(self.ctx.account).await?;
        let details = protocol
            .minipool_details(&addresses, BlockId::Latest)
            .await?;

        Ok(details
            .into_iter()
            .filter(|d| d.status == MinipoolStatus::Prelaunch)
            .map(|d| d.address)
            .collect())
    }

    /// Performs one staking cycle.
    pub async fn cycle(&self) -> Result<StakeReport, TaskError> {
        let mut report = StakeReport::default();
        if self.gate.is_disabled() {
            debug!("automatic minipool staking disabled");
            report.declined = Some(SkipReason::AutomationDisabled);
            return Ok(report);
        }

        let minipools = self.prelaunch_minipools().await?;
        if minipools.is_empty() {
            return Ok(report);
        }
        info!(count = minipools.len(), "minipools ready for staking");

        let config = self.ctx.consensus.config().await?;
        let account = self.ctx.account;

        for minipool in minipools {
            let pubkey = self.ctx.protocol.minipool_pubkey(minipool).await?;
            let status = self.ctx.consensus.validator_status(&pubkey).await?;
            if status.exists() {
                debug!(%minipool, %pubkey, ?status, "validator already deposited");
                report.already_deposited.push(minipool);
                continue;
            }

            let message = DepositMessage {
                pubkey,
                withdrawal_credentials: withdrawal_credentials(minipool),
                amount_gwei: PRELAUNCH_DEPOSIT_GWEI,
            };
            let request = DepositSigningRequest::new(message, config.genesis_fork_version);
            let signature = self.ctx.signer.sign_deposit(&request).await?;
            let deposit = message.with_signature(signature);

            info!(%minipool, %pubkey, "staking minipool");
            let tx = self.ctx.protocol.minipool_stake_tx(account, minipool, &deposit);
            match self.ctx.driver.drive(self.name(), tx, self.gate).await? {
                DriveOutcome::Included(receipt) => {
                    info!(%minipool, tx = %receipt.tx_hash, "minipool staked");
                    report.staked.push(minipool);
                }
                DriveOutcome::Declined(reason) => {
                    report.declined = Some(reason);
                    break;
                }
            }
        }

        Ok(report)
    }
}

#[async_trait]
impl Task for MinipoolLifecycleTask {
    fn name(&self) -> &'static str {
        "stake-prelaunch-minipools"
    }

    async fn run(&self) -> Result<(), TaskError> {
        let report = self.cycle().await?;
        debug!(?report, "staking cycle done");
        Ok(())
    }
}
