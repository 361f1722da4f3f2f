//! Cycles through a fixed battery of tasks until shutdown.
//!
//! Tasks of one cycle run sequentially in registration order with a cooldown between them. A
//! task that fails is logged and the cycle moves on; it is retried on the next cycle. Between
//! cycles the scheduler sleeps for a duration drawn uniformly from the configured interval.
//!
//! With a sync gate, a cycle is skipped while the execution node is still syncing.

use std::{sync::Arc, time::Duration};

use rand::Rng;
use smartnode_ledger::LedgerClient;
use smartnode_params::schedule::ScheduleParams;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{errors::SchedulerConfigError, task::Task};

/// What happened during one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Tasks that completed, in the order they ran.
    pub completed: Vec<&'static str>,

    /// Tasks that failed, in the order they ran.
    pub failed: Vec<&'static str>,

    /// Whether shutdown cut the cycle short.
    pub cancelled: bool,

    /// Whether the cycle was skipped because the node is not synced.
    pub unsynced: bool,
}

/// Runs a battery of [`Task`]s forever.
#[derive(Debug)]
pub struct TaskScheduler {
    name: &'static str,
    tasks: Vec<Box<dyn Task>>,
    params: ScheduleParams,
    cancel: CancellationToken,
    sync_gate: Option<Arc<dyn LedgerClient>>,
}

impl TaskScheduler {
    /// Creates a scheduler named `name` over `tasks`.
    pub fn new(
        name: &'static str,
        tasks: Vec<Box<dyn Task>>,
        params: ScheduleParams,
        cancel: CancellationToken,
    ) -> Result<Self, SchedulerConfigError> {
        if params.min_interval > params.max_interval {
            return Err(SchedulerConfigError::InvertedInterval {
                min: params.min_interval,
                max: params.max_interval,
            });
        }
        if tasks.is_empty() {
            return Err(SchedulerConfigError::NoTasks);
        }

        Ok(Self {
            name,
            tasks,
            params,
            cancel,
            sync_gate: None,
        })
    }

    /// Skips cycles while `ledger` reports that it is syncing.
    pub fn with_sync_gate(mut self, ledger: Arc<dyn LedgerClient>) -> Self {
        self.sync_gate = Some(ledger);
        self
    }

    /// Names of the registered tasks, in run order.
    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    async fn is_synced(&self) -> bool {
        let Some(ledger) = &self.sync_gate else {
            return true;
        };

        match ledger.is_syncing().await {
            Ok(syncing) => !syncing,
            Err(e) => {
                warn!(%e, "could not read sync status");
                false
            }
        }
    }

    /// Runs every task once, unless the node is not synced.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        if !self.is_synced().await {
            info!(scheduler = %self.name, "execution node not synced, skipping cycle");
            report.unsynced = true;
            return report;
        }

        for (i, task) in self.tasks.iter().enumerate() {
            if i > 0 && !self.pause(self.params.task_cooldown).await {
                report.cancelled = true;
                break;
            }
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let name = task.name();
            match task.run().instrument(info_span!("task", %name)).await {
                Ok(()) => report.completed.push(name),
                Err(e) => {
                    error!(%name, %e, "task failed");
                    report.failed.push(name);
                }
            }
        }

        report
    }

    /// Cycles until the cancellation token fires.
    pub async fn run(self) {
        info!(scheduler = %self.name, tasks = ?self.task_names(), "scheduler started");

        loop {
            let report = self
                .run_cycle()
                .instrument(info_span!("cycle", scheduler = %self.name))
                .await;
            debug!(?report, "cycle done");
            if report.cancelled {
                break;
            }

            let sleep = next_interval(&self.params);
            debug!(?sleep, "sleeping until next cycle");
            if !self.pause(sleep).await {
                break;
            }
        }

        info!(scheduler = %self.name, "scheduler stopped");
    }

    /// Sleeps for `duration`; returns `false` if shutdown was requested first.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = time::sleep(duration) => true,
        }
    }
}

/// Draws the sleep before the next cycle.
pub fn next_interval(params: &ScheduleParams) -> Duration {
    if params.min_interval >= params.max_interval {
        return params.min_interval;
    }
    rand::thread_rng().gen_range(params.min_interval..=params.max_interval)
}
