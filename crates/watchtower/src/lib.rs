//! The long-running side of the smartnode: a scheduler cycling through a fixed battery of
//! tasks, the idempotent reporting cycle shared by the oracle duties, and the concrete tasks of
//! the watchtower and node daemons.

pub mod context;
pub mod errors;
pub mod reporting;
pub mod scheduler;
pub mod task;
pub mod tasks;

#[cfg(test)]
mod fixtures;

pub use context::ServiceContext;
pub use errors::{SchedulerConfigError, TaskError};
pub use scheduler::TaskScheduler;
pub use task::Task;
