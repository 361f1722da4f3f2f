//! Claims GGP rewards when any are outstanding.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use smartnode_primitives::{types::Receipt, units::wei_to_eth, U256};
use smartnode_tx_engine::{
    gas::{CostGate, SkipReason},
    tx_driver::DriveOutcome,
};
use tracing::{debug, info};

use crate::{context::ServiceContext, errors::TaskError, task::Task};

/// Which reward pool a claimer draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
    /// Rewards of trusted node DAO members.
    TrustedNode,

    /// Rewards of regular node operators.
    Node,
}

impl fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimKind::TrustedNode => f.write_str("trusted-node"),
            ClaimKind::Node => f.write_str("node"),
        }
    }
}

/// What one claim cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClaimOutcome {
    /// The claimer is configured off.
    Disabled,

    /// The account is not a trusted member.
    NotTrusted,

    /// Nothing to claim.
    NothingToClaim,

    /// Rewards were claimed.
    Claimed {
        /// Amount claimed, in wei.
        amount: U256,

        /// Receipt of the claim.
        receipt: Receipt,
    },

    /// The gas policy declined the claim.
    Declined(SkipReason),
}

/// Claims one kind of reward whenever the claimable amount is non-zero.
#[derive(Debug)]
pub struct RewardClaimTask {
    ctx: Arc<ServiceContext>,
    kind: ClaimKind,
    gate: CostGate,
}

impl RewardClaimTask {
    /// Creates a claimer of `kind` gated by `gate`.
    pub fn new(ctx: Arc<ServiceContext>, kind: ClaimKind, gate: CostGate) -> Self {
        Self { ctx, kind, gate }
    }

    /// Performs one claim cycle.
    pub async fn cycle(&self) -> Result<ClaimOutcome, TaskError> {
        if self.gate.is_disabled() {
            debug!(kind = %self.kind, "automatic claiming disabled");
            return Ok(ClaimOutcome::Disabled);
        }

        let protocol = &self.ctx.protocol;
        let account = self.ctx.account;

        let amount = match self.kind {
            ClaimKind::TrustedNode => {
                if !protocol.is_trusted_member(account).await? {
                    debug!("not a trusted member, nothing to claim");
                    return Ok(ClaimOutcome::NotTrusted);
                }
                protocol.trusted_node_claim_amount(account).await?
            }
            ClaimKind::Node => protocol.node_claim_amount(account).await?,
        };
        if amount == U256::ZERO {
            debug!(kind = %self.kind, "no rewards to claim");
            return Ok(ClaimOutcome::NothingToClaim);
        }

        info!(kind = %self.kind, amount_ggp = %wei_to_eth(amount), "claiming rewards");
        let tx = match self.kind {
            ClaimKind::TrustedNode => protocol.claim_trusted_node_tx(account)?,
            ClaimKind::Node => protocol.claim_node_tx(account)?,
        };

        match self.ctx.driver.drive(self.name(), tx, self.gate).await? {
            DriveOutcome::Included(receipt) => {
                info!(kind = %self.kind, tx = %receipt.tx_hash, "rewards claimed");
                Ok(ClaimOutcome::Claimed { amount, receipt })
            }
            DriveOutcome::Declined(reason) => Ok(ClaimOutcome::Declined(reason)),
        }
    }
}

#[async_trait]
impl Task for RewardClaimTask {
    fn name(&self) -> &'static str {
        match self.kind {
            ClaimKind::TrustedNode => "claim-trusted-node-rewards",
            ClaimKind::Node => "claim-node-rewards",
        }
    }

    async fn run(&self) -> Result<(), TaskError> {
        let outcome = self.cycle().await?;
        debug!(?outcome, "claim cycle done");
        Ok(())
    }
}
