//! Reads of protocol storage flags and token allowances.
//!
//! Neither reader caches: the ledger is the source of truth and is re-read on every call.

use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use async_trait::async_trait;
use smartnode_primitives::{
    bindings::{IRocketStorage, IERC20},
    token::TokenKind,
    types::{Address, BlockId, B256},
    U256,
};
use tracing::trace;

use crate::{
    client::{read_call, LedgerClient},
    errors::{LedgerError, LedgerResult},
};

/// Deterministic key to bool lookup against the shared ledger.
///
/// A key that was never written reads as `false`.
#[async_trait]
pub trait IdempotencyLedger: Debug + Send + Sync {
    /// Reads the flag stored under `key` at the latest block.
    async fn get_bool(&self, key: B256) -> LedgerResult<bool>;
}

/// Reads how much of a token `owner` has approved `spender` to move.
#[async_trait]
pub trait AllowanceReader: Debug + Send + Sync {
    /// Current allowance of `token` from `owner` to `spender`.
    async fn allowance(
        &self,
        token: TokenKind,
        owner: Address,
        spender: Address,
    ) -> LedgerResult<U256>;
}

/// [`IdempotencyLedger`] backed by the protocol's storage contract.
#[derive(Debug, Clone)]
pub struct StorageFlags {
    client: Arc<dyn LedgerClient>,
    storage: Address,
}

impl StorageFlags {
    /// Reads flags from the storage contract at `storage`.
    pub fn new(client: Arc<dyn LedgerClient>, storage: Address) -> Self {
        Self { client, storage }
    }
}

#[async_trait]
impl IdempotencyLedger for StorageFlags {
    async fn get_bool(&self, key: B256) -> LedgerResult<bool> {
        let flag = read_call(
            self.client.as_ref(),
            self.storage,
            &IRocketStorage::getBoolCall { key },
            BlockId::Latest,
        )
        .await?
        ._0;

        trace!(%key, %flag, "read storage flag");
        Ok(flag)
    }
}

/// [`AllowanceReader`] over the ERC-20 `allowance` view of each token contract.
#[derive(Debug, Clone)]
pub struct TokenAllowances {
    client: Arc<dyn LedgerClient>,
    tokens: BTreeMap<TokenKind, Address>,
}

impl TokenAllowances {
    /// Creates a reader over the given token contracts.
    pub fn new(client: Arc<dyn LedgerClient>, tokens: BTreeMap<TokenKind, Address>) -> Self {
        Self { client, tokens }
    }
}

#[async_trait]
impl AllowanceReader for TokenAllowances {
    async fn allowance(
        &self,
        token: TokenKind,
        owner: Address,
        spender: Address,
    ) -> LedgerResult<U256> {
        let token_addr = self
            .tokens
            .get(&token)
            .copied()
            .ok_or_else(|| LedgerError::Missing(format!("no contract for {token}")))?;

        let call = IERC20::allowanceCall { owner, spender };
        let ret = read_call(self.client.as_ref(), token_addr, &call, BlockId::Latest).await?;

        Ok(ret._0)
    }
}
