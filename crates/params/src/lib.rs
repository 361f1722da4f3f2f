//! Protocol parameters that dictate how the smartnode daemons schedule work, report to the
//! shared ledger and price their transactions.

mod default;

pub mod gas;
pub mod prelude;
pub mod reporting;
pub mod schedule;
