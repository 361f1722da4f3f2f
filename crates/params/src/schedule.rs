//! Timing of the task scheduler.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::default::{
    NODE_INTERVAL, RECEIPT_POLL_INTERVAL, TASK_COOLDOWN, WATCHTOWER_MAX_INTERVAL,
    WATCHTOWER_MIN_INTERVAL,
};

/// How often the scheduler cycles through its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleParams {
    /// Shortest sleep between two cycles.
    pub min_interval: Duration,

    /// Longest sleep between two cycles. The actual sleep is drawn uniformly from
    /// `[min_interval, max_interval]`.
    pub max_interval: Duration,

    /// Pause between consecutive tasks within a cycle.
    pub task_cooldown: Duration,

    /// How often a pending transaction is polled for inclusion.
    pub receipt_poll_interval: Duration,
}

impl ScheduleParams {
    /// Jittered schedule of the watchtower daemon.
    pub const fn watchtower() -> Self {
        Self {
            min_interval: WATCHTOWER_MIN_INTERVAL,
            max_interval: WATCHTOWER_MAX_INTERVAL,
            task_cooldown: TASK_COOLDOWN,
            receipt_poll_interval: RECEIPT_POLL_INTERVAL,
        }
    }

    /// Fixed schedule of the node daemon.
    pub const fn node() -> Self {
        Self {
            min_interval: NODE_INTERVAL,
            max_interval: NODE_INTERVAL,
            task_cooldown: TASK_COOLDOWN,
            receipt_poll_interval: RECEIPT_POLL_INTERVAL,
        }
    }
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self::watchtower()
    }
}
