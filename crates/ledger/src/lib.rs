//! Interfaces to the external collaborators the daemon depends on: the execution ledger, the
//! consensus client and the deposit signer.
//!
//! Each collaborator is a trait with a network-backed implementation and an in-memory one used
//! in tests.

pub mod beacon;
pub mod client;
pub mod consensus;
pub mod errors;
pub mod inmemory;
pub mod rpc;
pub mod signer;
pub mod storage;
pub mod web3signer;

pub use client::{read_call, LedgerClient};
pub use consensus::ConsensusClient;
pub use errors::{LedgerError, LedgerResult};
pub use signer::DepositSigner;
pub use storage::{AllowanceReader, IdempotencyLedger};
