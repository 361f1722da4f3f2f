//! Ledger-level value types: blocks, receipts and transaction requests.
//!
//! Addresses, hashes and byte strings are the alloy primitives; this module adds the shapes the
//! daemon passes between its ledger backends and the transaction engine.

use std::fmt;

use alloy::{
    eips::{BlockId as RpcBlockId, BlockNumberOrTag},
    sol_types::SolCall,
};
pub use alloy::primitives::{Address, BlockNumber, Bytes, FixedBytes, TxHash, B256};

use crate::U256;

/// Selects the ledger state a read is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockId {
    /// The most recent block known to the node.
    #[default]
    Latest,

    /// A specific height.
    Number(BlockNumber),
}

impl From<BlockNumber> for BlockId {
    fn from(n: BlockNumber) -> Self {
        BlockId::Number(n)
    }
}

impl From<BlockId> for BlockNumberOrTag {
    fn from(id: BlockId) -> Self {
        match id {
            BlockId::Latest => BlockNumberOrTag::Latest,
            BlockId::Number(n) => BlockNumberOrTag::Number(n),
        }
    }
}

impl From<BlockId> for RpcBlockId {
    fn from(id: BlockId) -> Self {
        RpcBlockId::Number(id.into())
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Latest => f.write_str("latest"),
            BlockId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// The header fields the daemon consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block height.
    pub number: BlockNumber,

    /// Unix timestamp in seconds.
    pub timestamp: u64,
}

/// Outcome of an included transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    /// Hash of the included transaction.
    pub tx_hash: TxHash,

    /// Block the transaction was included in.
    pub block_number: BlockNumber,

    /// Gas consumed by execution.
    pub gas_used: u64,

    /// Whether execution succeeded.
    pub success: bool,
}

fn selector_of(data: &[u8]) -> Option<[u8; 4]> {
    data.get(..4).and_then(|s| s.try_into().ok())
}

/// A read-only contract call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractCall {
    /// Contract being called.
    pub to: Address,

    /// ABI-encoded calldata.
    pub data: Bytes,
}

impl ContractCall {
    /// Creates a call against `to` with the given calldata.
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
        }
    }

    /// Encodes `call` against `to`.
    pub fn of<C: SolCall>(to: Address, call: &C) -> Self {
        Self::new(to, call.abi_encode())
    }

    /// The 4-byte function selector, if the calldata carries one.
    pub fn selector(&self) -> Option<[u8; 4]> {
        selector_of(&self.data)
    }
}

/// A state-mutating contract call, before fees and nonce are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    /// Sending account.
    pub from: Address,

    /// Contract being called.
    pub to: Address,

    /// ABI-encoded calldata.
    pub data: Bytes,

    /// Native value attached, in wei.
    pub value: U256,
}

impl TxRequest {
    /// Creates a request with zero attached value.
    pub fn new(from: Address, to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from,
            to,
            data: data.into(),
            value: U256::ZERO,
        }
    }

    /// Encodes `call` from `from` against `to`.
    pub fn call<C: SolCall>(from: Address, to: Address, call: &C) -> Self {
        Self::new(from, to, call.abi_encode())
    }

    /// Attaches native value.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// The 4-byte function selector, if the calldata carries one.
    pub fn selector(&self) -> Option<[u8; 4]> {
        selector_of(&self.data)
    }
}

/// Fee parameters resolved by the gas policy for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxFees {
    /// Maximum total fee per gas, in wei.
    pub max_fee_per_gas: U256,

    /// Maximum priority fee per gas, in wei.
    pub max_priority_fee_per_gas: U256,

    /// Gas limit for the transaction.
    pub gas_limit: u64,
}

/// A fully specified transaction ready to be handed to the ledger for signing and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIntent {
    /// The call being made.
    pub request: TxRequest,

    /// Fee cap, priority fee and gas limit.
    pub fees: TxFees,

    /// Explicit nonce; the backend picks the account's pending nonce when absent.
    pub nonce: Option<u64>,
}
