//! The node daemon.

use std::sync::Arc;

use smartnode_params::schedule::ScheduleParams;
use smartnode_tx_engine::gas::CostGate;
use smartnode_watchtower::{
    tasks::{ClaimKind, MinipoolLifecycleTask, RewardClaimTask},
    ServiceContext, Task, TaskScheduler,
};
use tracing::info;

use crate::config::Config;

/// Claims node rewards and stakes prelaunch minipools until shutdown.
pub(super) async fn run(
    ctx: Arc<ServiceContext>,
    config: &Config,
    params: ScheduleParams,
) -> anyhow::Result<()> {
    let thresholds = &config.reporting.thresholds;
    let tasks: Vec<Box<dyn Task>> = vec![
        Box::new(RewardClaimTask::new(
            ctx.clone(),
            ClaimKind::Node,
            CostGate::from_threshold_gwei(thresholds.claim_node_rewards_gwei)?,
        )),
        Box::new(MinipoolLifecycleTask::new(
            ctx.clone(),
            CostGate::from_threshold_gwei(thresholds.stake_minipools_gwei)?,
        )),
    ];

    info!("starting node daemon");
    TaskScheduler::new("node", tasks, params, ctx.cancel.clone())?
        .with_sync_gate(ctx.protocol.ledger().clone())
        .run()
        .await;
    Ok(())
}
