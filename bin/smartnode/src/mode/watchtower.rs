//! The trusted node daemon.

use std::sync::Arc;

use smartnode_params::schedule::ScheduleParams;
use smartnode_tx_engine::gas::CostGate;
use smartnode_watchtower::{
    reporting::ReportingTask,
    tasks::{BalanceSource, ClaimKind, PriceSource, RewardClaimTask},
    ServiceContext, Task, TaskScheduler,
};
use tracing::info;

use crate::config::Config;

/// Claims trusted node rewards and reports prices and balances until shutdown.
pub(super) async fn run(
    ctx: Arc<ServiceContext>,
    config: &Config,
    params: ScheduleParams,
) -> anyhow::Result<()> {
    let thresholds = &config.reporting.thresholds;
    let report_gate = CostGate::from_optional_threshold_gwei(thresholds.report_gwei)?;
    let tasks: Vec<Box<dyn Task>> = vec![
        Box::new(RewardClaimTask::new(
            ctx.clone(),
            ClaimKind::TrustedNode,
            CostGate::from_threshold_gwei(thresholds.claim_trusted_node_rewards_gwei)?,
        )),
        Box::new(ReportingTask::new(
            ctx.clone(),
            PriceSource::new(ctx.protocol.clone()),
            config.reporting.prices,
        )
        .with_gate(report_gate)),
        Box::new(ReportingTask::new(
            ctx.clone(),
            BalanceSource::new(ctx.protocol.clone()),
            config.reporting.balances,
        )
        .with_gate(report_gate)),
    ];

    info!("starting watchtower");
    TaskScheduler::new("watchtower", tasks, params, ctx.cancel.clone())?
        .with_sync_gate(ctx.protocol.ledger().clone())
        .run()
        .await;
    Ok(())
}
