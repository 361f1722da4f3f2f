//! One-shot operator actions.

use std::future::Future;

use anyhow::bail;
use serde::Serialize;
use smartnode_primitives::types::TxHash;
use smartnode_protocol::operations::{NodeDepositRequest, NodeOperations};
use smartnode_tx_engine::{eligibility::Eligibility, pipeline::PipelineOutcome, TxResult};
use smartnode_watchtower::ServiceContext;
use tracing::info;

use crate::args::Command;

/// What an action did, as printed to stdout.
#[derive(Debug, Serialize)]
struct ActionSummary {
    status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    approval_tx: Option<TxHash>,

    #[serde(skip_serializing_if = "Option::is_none")]
    action_tx: Option<TxHash>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    reasons: Vec<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    declined: Option<String>,
}

impl<C: Eligibility> From<PipelineOutcome<C>> for ActionSummary {
    fn from(outcome: PipelineOutcome<C>) -> Self {
        match outcome {
            PipelineOutcome::Completed { approval, action } => Self {
                status: "completed",
                approval_tx: approval.map(|r| r.tx_hash),
                action_tx: Some(action.tx_hash),
                reasons: vec![],
                declined: None,
            },
            PipelineOutcome::Declined {
                phase,
                reason,
                approval,
            } => Self {
                status: "declined",
                approval_tx: approval.map(|r| r.tx_hash),
                action_tx: None,
                reasons: vec![],
                declined: Some(format!("{phase:?}: {reason:?}")),
            },
            PipelineOutcome::Ineligible { check, approval } => Self {
                status: "ineligible",
                approval_tx: approval.map(|r| r.tx_hash),
                action_tx: None,
                reasons: check.reasons(),
                declined: None,
            },
            PipelineOutcome::InsufficientAllowance {
                allowance,
                approval,
            } => Self {
                status: "insufficient_allowance",
                approval_tx: Some(approval.tx_hash),
                action_tx: None,
                reasons: vec![],
                declined: Some(format!("allowance {allowance} still short after approval")),
            },
        }
    }
}

/// Prints the dry-run result, or performs the action and prints what it did.
async fn perform<C: Eligibility + Serialize>(
    dry_run: bool,
    check: impl Future<Output = TxResult<C>>,
    action: impl Future<Output = TxResult<PipelineOutcome<C>>>,
) -> anyhow::Result<()> {
    let json = if dry_run {
        serde_json::to_string_pretty(&check.await?)?
    } else {
        serde_json::to_string_pretty(&ActionSummary::from(action.await?))?
    };

    println!("{json}");
    Ok(())
}

/// Runs the operator action `command`.
pub(super) async fn run(ctx: &ServiceContext, command: Command, dry_run: bool) -> anyhow::Result<()> {
    let ops = NodeOperations::new(
        &ctx.protocol,
        &ctx.driver,
        ctx.allowances.as_ref(),
        ctx.account,
    );
    info!(%command, %dry_run, "running operation");

    match command {
        Command::StakeGgp { amount } => {
            perform(dry_run, ops.can_stake_ggp(amount), ops.stake_ggp(amount)).await
        }
        Command::SwapGgp { amount } => {
            perform(dry_run, ops.can_swap_ggp(amount), ops.swap_ggp(amount)).await
        }
        Command::WithdrawGgp { amount } => {
            perform(dry_run, ops.can_withdraw_ggp(amount), ops.withdraw_ggp(amount)).await
        }
        Command::JoinOdao => perform(dry_run, ops.can_join_odao(), ops.join_odao()).await,
        Command::CreateLot => perform(dry_run, ops.can_create_lot(), ops.create_lot()).await,
        Command::BidOnLot { lot, amount } => {
            perform(dry_run, ops.can_bid_on_lot(lot), ops.bid_on_lot(lot, amount)).await
        }
        Command::RecoverLot { lot } => {
            perform(
                dry_run,
                ops.can_recover_ggp_from_lot(lot),
                ops.recover_ggp_from_lot(lot),
            )
            .await
        }
        Command::NodeDeposit {
            amount,
            pubkey,
            min_node_fee,
        } => {
            let request = NodeDepositRequest {
                amount,
                min_node_fee,
                pubkey,
            };
            let deposit = async {
                let fork_version = ctx.consensus.config().await?.genesis_fork_version;
                ops.node_deposit(&request, ctx.signer.as_ref(), fork_version)
                    .await
            };
            perform(dry_run, ops.can_node_deposit(amount), deposit).await
        }
        other @ (Command::Watchtower | Command::Node) => {
            bail!("{other} is not a one-shot operation")
        }
    }
}

#[cfg(test)]
mod tests {
    use smartnode_primitives::{
        types::{Receipt, B256},
        U256,
    };
    use smartnode_protocol::operations::CanBidOnLot;
    use smartnode_tx_engine::{gas::SkipReason, pipeline::Phase};

    use super::*;

    fn receipt(byte: u8) -> Receipt {
        Receipt {
            tx_hash: B256::new([byte; 32]),
            block_number: 10,
            gas_used: 21_000,
            success: true,
        }
    }

    #[test]
    fn summaries_name_the_outcome() {
        let done: ActionSummary = PipelineOutcome::<CanBidOnLot>::Completed {
            approval: None,
            action: receipt(1),
        }
        .into();
        let json = serde_json::to_value(&done).unwrap();
        assert_eq!(json["status"], "completed");
        assert!(json.get("approval_tx").is_none());

        let refused: ActionSummary = PipelineOutcome::Ineligible {
            check: CanBidOnLot {
                bidding_ended: true,
                ..Default::default()
            },
            approval: None,
        }
        .into();
        assert_eq!(refused.reasons, vec!["bidding_ended"]);

        let declined: ActionSummary = PipelineOutcome::<CanBidOnLot>::Declined {
            phase: Phase::Approval,
            reason: SkipReason::AutomationDisabled,
            approval: Some(receipt(2)),
        }
        .into();
        assert_eq!(declined.status, "declined");
        assert_eq!(declined.approval_tx, Some(B256::new([2; 32])));
    }

    #[test]
    fn short_allowance_after_approval_is_reported() {
        let short: ActionSummary = PipelineOutcome::<CanBidOnLot>::InsufficientAllowance {
            allowance: U256::from(5),
            approval: receipt(3),
        }
        .into();
        let json = serde_json::to_value(&short).unwrap();
        assert_eq!(json["status"], "insufficient_allowance");
        assert_eq!(json["approval_tx"], serde_json::to_value(B256::new([3; 32])).unwrap());
        assert!(json.get("action_tx").is_none());
        assert_eq!(json["declined"], "allowance 5 still short after approval");
    }
}
