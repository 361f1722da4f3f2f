//! Fee resolution, nonce sequencing and transaction submission for the smartnode daemons.
//!
//! Every mutating transaction flows through [`tx_driver::TxDriver`], which prices it with the
//! [`gas::GasPolicy`], stamps the next nonce from the [`nonce::NonceManager`] and blocks until
//! the ledger includes it. [`pipeline::SequencedPipeline`] builds the "approve, then act" flow on
//! top of it.

pub mod eligibility;
pub mod errors;
pub mod gas;
pub mod nonce;
pub mod pipeline;
pub mod tx_driver;

pub use errors::{ConfigError, TxError, TxResult};
