//! [`LedgerClient`] over the standard execution-node JSON-RPC API.

use std::{fmt, time::Duration};

use alloy::{
    eips::eip2718::Encodable2718,
    network::{EthereumWallet, TransactionBuilder},
    providers::{Provider, RootProvider},
    rpc::{
        client::RpcClient,
        types::{BlockTransactionsKind, SyncStatus, TransactionRequest},
    },
    signers::local::PrivateKeySigner,
    transports::http::Http,
};
use async_trait::async_trait;
use reqwest::Client;
use smartnode_primitives::{
    types::{
        Address, BlockHeader, BlockId, Bytes, ContractCall, Receipt, TxHash, TxIntent, TxRequest,
    },
    U256,
};
use tracing::{debug, info, trace};

use crate::{
    client::LedgerClient,
    errors::{LedgerError, LedgerResult},
};

/// A JSON-RPC connection to an execution node.
///
/// Transactions are signed locally with the operator's key and broadcast as raw EIP-1559
/// envelopes.
#[derive(Clone)]
pub struct JsonRpcLedger {
    url: String,
    provider: RootProvider<Http<Client>>,
    wallet: EthereumWallet,
    account: Address,
    chain_id: u64,
}

impl fmt::Debug for JsonRpcLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRpcLedger")
            .field("url", &self.url)
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl JsonRpcLedger {
    /// Connects to the node at `url`, signing transactions with `signer`.
    pub async fn connect(
        url: &str,
        request_timeout: Duration,
        signer: PrivateKeySigner,
    ) -> LedgerResult<Self> {
        let endpoint = url
            .parse()
            .map_err(|e| LedgerError::Endpoint(format!("{url}: {e}")))?;
        let http = Client::builder().timeout(request_timeout).build()?;
        let provider = RootProvider::new(RpcClient::new(Http::with_client(http, endpoint), false));

        let chain_id = provider.get_chain_id().await?;
        let account = signer.address();
        info!(%url, %chain_id, %account, "connected to execution node");

        Ok(Self {
            url: url.to_owned(),
            provider,
            wallet: EthereumWallet::from(signer),
            account,
            chain_id,
        })
    }

    /// The account transactions are signed for.
    pub fn account(&self) -> Address {
        self.account
    }

    fn call_request(call: &ContractCall) -> TransactionRequest {
        TransactionRequest::default()
            .with_to(call.to)
            .with_input(call.data.clone())
    }

    fn tx_request(tx: &TxRequest) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(tx.from)
            .with_to(tx.to)
            .with_input(tx.data.clone())
            .with_value(tx.value)
    }
}

fn syncing(status: &SyncStatus) -> bool {
    matches!(status, SyncStatus::Info(_))
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn header_at(&self, block: BlockId) -> LedgerResult<BlockHeader> {
        let found = self
            .provider
            .get_block_by_number(block.into(), BlockTransactionsKind::Hashes)
            .await?
            .ok_or_else(|| LedgerError::Missing(format!("block {block}")))?;

        Ok(BlockHeader {
            number: found.header.number,
            timestamp: found.header.timestamp,
        })
    }

    async fn read_state(&self, call: &ContractCall, block: BlockId) -> LedgerResult<Bytes> {
        let ret = self
            .provider
            .call(&Self::call_request(call))
            .block(block.into())
            .await
            .map_err(|e| LedgerError::CallFailed {
                to: call.to,
                reason: e.to_string(),
            })?;

        trace!(to = %call.to, %block, "eth_call");
        Ok(ret)
    }

    async fn is_syncing(&self) -> LedgerResult<bool> {
        Ok(syncing(&self.provider.syncing().await?))
    }

    async fn transaction_count(&self, account: Address) -> LedgerResult<u64> {
        Ok(self.provider.get_transaction_count(account).pending().await?)
    }

    async fn native_balance(&self, account: Address, block: BlockId) -> LedgerResult<U256> {
        Ok(self
            .provider
            .get_balance(account)
            .block_id(block.into())
            .await?)
    }

    async fn estimate_gas(&self, tx: &TxRequest) -> LedgerResult<u64> {
        self.provider
            .estimate_gas(&Self::tx_request(tx))
            .await
            .map_err(|e| LedgerError::CallFailed {
                to: tx.to,
                reason: e.to_string(),
            })
    }

    async fn gas_price(&self) -> LedgerResult<U256> {
        Ok(U256::from(self.provider.get_gas_price().await?))
    }

    async fn send_transaction(&self, intent: &TxIntent) -> LedgerResult<TxHash> {
        if intent.request.from != self.account {
            return Err(LedgerError::Rejected(format!(
                "no key for sender {}",
                intent.request.from
            )));
        }

        let nonce = match intent.nonce {
            Some(nonce) => nonce,
            None => self.transaction_count(self.account).await?,
        };
        let request = Self::tx_request(&intent.request)
            .with_chain_id(self.chain_id)
            .with_nonce(nonce)
            .with_gas_limit(intent.fees.gas_limit)
            .with_max_fee_per_gas(intent.fees.max_fee_per_gas.saturating_to())
            .with_max_priority_fee_per_gas(intent.fees.max_priority_fee_per_gas.saturating_to());

        let envelope = request
            .build(&self.wallet)
            .await
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;
        let pending = self
            .provider
            .send_raw_transaction(&envelope.encoded_2718())
            .await
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;

        let hash = *pending.tx_hash();
        debug!(%hash, to = %intent.request.to, %nonce, "broadcast transaction");
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> LedgerResult<Option<Receipt>> {
        let Some(receipt) = self.provider.get_transaction_receipt(hash).await? else {
            return Ok(None);
        };
        let Some(block_number) = receipt.block_number else {
            return Ok(None);
        };

        Ok(Some(Receipt {
            tx_hash: receipt.transaction_hash,
            block_number,
            gas_used: u64::try_from(receipt.gas_used).unwrap_or(u64::MAX),
            success: receipt.status(),
        }))
    }
}
