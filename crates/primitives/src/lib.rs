//! General types and pure functions shared across the smartnode crates.
//!
//! This crate lies at the bottom of the crate hierarchy in this workspace, i.e., it does not depend
//! on any other crate in this workspace.

pub mod bindings;
pub mod deposit;
pub mod errors;
pub mod keys;
pub mod token;
pub mod types;
pub mod units;

pub use alloy::primitives::U256;
