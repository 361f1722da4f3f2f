//! A unit of recurring work.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::errors::TaskError;

/// One task of a scheduler's battery.
///
/// `run` must be idempotent: the scheduler calls it every cycle, and a run that finds nothing
/// outstanding returns `Ok(())` without side effects.
#[async_trait]
pub trait Task: Debug + Send + Sync {
    /// Name used in logs and spans.
    fn name(&self) -> &'static str;

    /// Performs one cycle of the task.
    async fn run(&self) -> Result<(), TaskError>;
}
