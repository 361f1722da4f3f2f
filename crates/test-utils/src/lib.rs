//! Test utilities shared by the smartnode crates.
//!
//! Random value generators and helpers that script the in-memory ledger with contract return
//! values encoded the way the contracts would return them.

pub mod arbitrary_generator;
pub mod prelude;
pub mod scripted;
