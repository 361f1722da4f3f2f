//! The concrete tasks of the watchtower and node daemons.

pub mod balances;
pub mod minipools;
pub mod prices;
pub mod rewards;

pub use balances::{BalanceReport, BalanceSource};
pub use minipools::MinipoolLifecycleTask;
pub use prices::{PriceReport, PriceSource};
pub use rewards::{ClaimKind, RewardClaimTask};
