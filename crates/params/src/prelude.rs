//! Re-exports of the parameter types.

pub use crate::{gas::GasParams, reporting::ReportingWindow, schedule::ScheduleParams};
