//! Minipool lifecycle states.

use std::fmt;

use serde::Serialize;
use smartnode_primitives::types::Address;

/// Status of a minipool as recorded by its contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MinipoolStatus {
    /// Created, waiting for user deposit assignment.
    Initialised,

    /// Assigned and waiting for the validator to be staked.
    Prelaunch,

    /// Validator is staking.
    Staking,

    /// Validator has exited and funds can be withdrawn.
    Withdrawable,

    /// Dissolved before staking.
    Dissolved,
}

impl MinipoolStatus {
    /// Maps the on-chain status code.
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => MinipoolStatus::Initialised,
            1 => MinipoolStatus::Prelaunch,
            2 => MinipoolStatus::Staking,
            3 => MinipoolStatus::Withdrawable,
            4 => MinipoolStatus::Dissolved,
            _ => return None,
        })
    }

    /// Whether user funds assigned to the minipool count toward the network total.
    pub const fn holds_user_funds(self) -> bool {
        matches!(self, MinipoolStatus::Prelaunch | MinipoolStatus::Staking)
    }
}

impl fmt::Display for MinipoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MinipoolStatus::Initialised => "initialised",
            MinipoolStatus::Prelaunch => "prelaunch",
            MinipoolStatus::Staking => "staking",
            MinipoolStatus::Withdrawable => "withdrawable",
            MinipoolStatus::Dissolved => "dissolved",
        };
        f.write_str(s)
    }
}

/// A minipool and its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinipoolDetails {
    /// Address of the minipool contract.
    pub address: Address,

    /// Status at the time of the read.
    pub status: MinipoolStatus,
}
