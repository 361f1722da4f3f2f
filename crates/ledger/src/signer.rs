//! Signing of validator deposits.

use std::fmt::Debug;

use async_trait::async_trait;
use smartnode_primitives::{
    deposit::{DepositMessage, ValidatorSignature},
    types::B256,
};

use crate::errors::LedgerResult;

/// Everything a signer needs to sign a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositSigningRequest {
    /// The deposit being authorised.
    pub message: DepositMessage,

    /// Fork version the deposit domain is computed under.
    pub genesis_fork_version: [u8; 4],

    /// Root to sign, derived from the two fields above.
    pub signing_root: B256,
}

impl DepositSigningRequest {
    /// Builds the request for `message` on a chain with `genesis_fork_version`.
    pub fn new(message: DepositMessage, genesis_fork_version: [u8; 4]) -> Self {
        Self {
            message,
            genesis_fork_version,
            signing_root: message.signing_root(genesis_fork_version),
        }
    }
}

/// Produces the validator signature over a deposit.
///
/// The signing scheme is owned by the backend; the daemon only stores whatever signature comes
/// back in the deposit data.
#[async_trait]
pub trait DepositSigner: Debug + Send + Sync {
    /// Signs the deposit described by `request`.
    async fn sign_deposit(&self, request: &DepositSigningRequest)
        -> LedgerResult<ValidatorSignature>;
}
