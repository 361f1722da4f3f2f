//! Backend-agnostic view of a consensus (beacon) client.

use std::fmt::{self, Debug};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use smartnode_primitives::deposit::ValidatorPubkey;

use crate::errors::LedgerResult;

/// Selects a beacon block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeaconBlockId {
    /// The client's current head.
    #[default]
    Head,

    /// The block at a specific slot.
    Slot(u64),
}

impl fmt::Display for BeaconBlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeaconBlockId::Head => f.write_str("head"),
            BeaconBlockId::Slot(s) => write!(f, "{s}"),
        }
    }
}

/// Summary of a beacon block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconHead {
    /// Slot of the block.
    pub slot: u64,
}

/// Lifecycle status of a validator as reported by the consensus client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorStatus {
    /// The consensus client has not seen a deposit for the key.
    Unknown,
    /// Deposit seen, not yet eligible for activation.
    PendingInitialized,
    /// Waiting in the activation queue.
    PendingQueued,
    /// Active and not exiting.
    ActiveOngoing,
    /// Active with an exit scheduled.
    ActiveExiting,
    /// Active and slashed.
    ActiveSlashed,
    /// Exited without being slashed.
    ExitedUnslashed,
    /// Exited after being slashed.
    ExitedSlashed,
    /// Exited with funds withdrawable.
    WithdrawalPossible,
    /// Exited and fully withdrawn.
    WithdrawalDone,
}

impl ValidatorStatus {
    /// Parses the status string of the standard beacon API.
    pub fn from_api_str(s: &str) -> Option<Self> {
        Some(match s {
            "pending_initialized" => ValidatorStatus::PendingInitialized,
            "pending_queued" => ValidatorStatus::PendingQueued,
            "active_ongoing" => ValidatorStatus::ActiveOngoing,
            "active_exiting" => ValidatorStatus::ActiveExiting,
            "active_slashed" => ValidatorStatus::ActiveSlashed,
            "exited_unslashed" => ValidatorStatus::ExitedUnslashed,
            "exited_slashed" => ValidatorStatus::ExitedSlashed,
            "withdrawal_possible" => ValidatorStatus::WithdrawalPossible,
            "withdrawal_done" => ValidatorStatus::WithdrawalDone,
            _ => return None,
        })
    }

    /// Whether the consensus layer knows about the validator at all.
    pub const fn exists(&self) -> bool {
        !matches!(self, ValidatorStatus::Unknown)
    }
}

/// Chain configuration relevant to deposits and timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsensusConfig {
    /// Fork version deposits are signed under.
    pub genesis_fork_version: [u8; 4],

    /// Slot duration in seconds.
    pub seconds_per_slot: u64,

    /// Slots per epoch.
    pub slots_per_epoch: u64,
}

/// A consensus client backend.
#[async_trait]
pub trait ConsensusClient: Debug + Send + Sync {
    /// Header summary of `block`.
    async fn head_at(&self, block: BeaconBlockId) -> LedgerResult<BeaconHead>;

    /// Current status of the validator identified by `pubkey`.
    async fn validator_status(&self, pubkey: &ValidatorPubkey) -> LedgerResult<ValidatorStatus>;

    /// Chain configuration.
    async fn config(&self) -> LedgerResult<ConsensusConfig>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_strings() {
        assert_eq!(
            ValidatorStatus::from_api_str("active_ongoing"),
            Some(ValidatorStatus::ActiveOngoing)
        );
        assert_eq!(ValidatorStatus::from_api_str("bogus"), None);
        assert!(!ValidatorStatus::Unknown.exists());
        assert!(ValidatorStatus::PendingQueued.exists());
    }
}
