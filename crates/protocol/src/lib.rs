//! Typed access to the staking protocol's contracts.
//!
//! The [`contracts::ContractRegistry`] resolves contract addresses from the storage contract
//! once at start. [`client::ProtocolClient`] wraps the raw ledger with one method per contract
//! view or transaction the daemons use, and [`operations`] builds the operator actions and their
//! dry-runs on top of the transaction pipeline.

pub mod client;
pub mod contracts;
pub mod errors;
pub mod minipool;
pub mod operations;

pub use client::ProtocolClient;
pub use contracts::ContractRegistry;
pub use errors::{ProtocolError, ProtocolResult};
