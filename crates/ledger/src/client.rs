//! Read/write access to the execution ledger.

use std::fmt::Debug;

use alloy::sol_types::SolCall;
use async_trait::async_trait;
use smartnode_primitives::{
    types::{
        Address, BlockHeader, BlockId, Bytes, ContractCall, Receipt, TxHash, TxIntent, TxRequest,
    },
    U256,
};

use crate::errors::LedgerResult;

/// A connection to an execution ledger node.
///
/// Transactions are signed by the backend on behalf of [`TxRequest::from`]. When a
/// [`TxIntent`] carries no nonce the backend uses the account's pending transaction count.
#[async_trait]
pub trait LedgerClient: Debug + Send + Sync {
    /// Reads the header of `block`.
    async fn header_at(&self, block: BlockId) -> LedgerResult<BlockHeader>;

    /// Executes a read-only call against the state at `block` and returns the raw return data.
    async fn read_state(&self, call: &ContractCall, block: BlockId) -> LedgerResult<Bytes>;

    /// Whether the node is still catching up with the network.
    async fn is_syncing(&self) -> LedgerResult<bool>;

    /// Number of transactions sent from `account`, including pending ones.
    async fn transaction_count(&self, account: Address) -> LedgerResult<u64>;

    /// Native balance of `account` at `block`, in wei.
    async fn native_balance(&self, account: Address, block: BlockId) -> LedgerResult<U256>;

    /// Estimates the gas `tx` would consume if executed now.
    async fn estimate_gas(&self, tx: &TxRequest) -> LedgerResult<u64>;

    /// The node's suggested fee per gas, in wei.
    async fn gas_price(&self) -> LedgerResult<U256>;

    /// Signs and broadcasts `intent`.
    async fn send_transaction(&self, intent: &TxIntent) -> LedgerResult<TxHash>;

    /// Fetches the receipt of `hash`, or `None` while it is still pending.
    async fn transaction_receipt(&self, hash: TxHash) -> LedgerResult<Option<Receipt>>;
}

/// Reads `call` against `to` at `block` and decodes its return values.
pub async fn read_call<C: SolCall>(
    ledger: &dyn LedgerClient,
    to: Address,
    call: &C,
    block: BlockId,
) -> LedgerResult<C::Return> {
    let ret = ledger.read_state(&ContractCall::of(to, call), block).await?;
    Ok(C::abi_decode_returns(&ret, true)?)
}
