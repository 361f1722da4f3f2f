//! In-memory collaborators for tests.
//!
//! [`InMemoryLedger`] answers contract reads from a table keyed by (contract, calldata) and
//! records every operation in a journal so callers can assert on ordering. Calls nobody scripted
//! return a single zero word, which decodes as `0`, `false` or the zero address, like unset
//! contract storage.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use alloy::primitives::keccak256;
use sha2::{Digest, Sha256};
use smartnode_primitives::{
    deposit::{ValidatorPubkey, ValidatorSignature},
    types::{
        Address, BlockHeader, BlockId, BlockNumber, Bytes, ContractCall, Receipt, TxHash,
        TxIntent, TxRequest, B256,
    },
    U256,
};
use tracing::trace;

use crate::{
    client::LedgerClient,
    consensus::{BeaconBlockId, BeaconHead, ConsensusClient, ConsensusConfig, ValidatorStatus},
    errors::{LedgerError, LedgerResult},
    signer::{DepositSigner, DepositSigningRequest},
};

/// Gas reported for calls without a scripted estimate.
pub const DEFAULT_GAS_ESTIMATE: u64 = 100_000;

/// Seconds between consecutive in-memory blocks.
const BLOCK_TIME: u64 = 12;

const WORD: usize = 32;

/// An operation observed by the [`InMemoryLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOp {
    /// A contract read.
    Read {
        /// Contract read from.
        to: Address,
        /// Selector of the call.
        selector: Option<[u8; 4]>,
        /// Block the read was evaluated at.
        block: BlockId,
    },

    /// A gas estimate.
    Estimate {
        /// Contract the transaction targets.
        to: Address,
        /// Selector of the call.
        selector: Option<[u8; 4]>,
    },

    /// A transaction broadcast.
    Send {
        /// Contract the transaction targets.
        to: Address,
        /// Selector of the call.
        selector: Option<[u8; 4]>,
        /// Explicit nonce, if any.
        nonce: Option<u64>,
        /// Hash assigned to the transaction.
        hash: TxHash,
    },

    /// A transaction became visible as included.
    Included {
        /// Hash of the transaction.
        hash: TxHash,
        /// Contract the transaction targeted.
        to: Address,
        /// Selector of the call.
        selector: Option<[u8; 4]>,
    },
}

impl LedgerOp {
    /// Whether this is a read of a call with `selector`.
    pub fn is_read_of(&self, selector: [u8; 4]) -> bool {
        matches!(self, LedgerOp::Read { selector: Some(s), .. } if *s == selector)
    }

    /// Whether this is a broadcast of a call with `selector`.
    pub fn is_send_of(&self, selector: [u8; 4]) -> bool {
        matches!(self, LedgerOp::Send { selector: Some(s), .. } if *s == selector)
    }

    /// Whether this is an estimate of a call with `selector`.
    pub fn is_estimate_of(&self, selector: [u8; 4]) -> bool {
        matches!(self, LedgerOp::Estimate { selector: Some(s), .. } if *s == selector)
    }

    /// Whether this is the inclusion of a call with `selector`.
    pub fn is_inclusion_of(&self, selector: [u8; 4]) -> bool {
        matches!(self, LedgerOp::Included { selector: Some(s), .. } if *s == selector)
    }
}

type CallKey = (Address, Bytes);
type SelectorKey = (Address, [u8; 4]);

#[derive(Debug)]
struct PendingTx {
    intent: TxIntent,
    polls_left: u32,
    receipt: Option<Receipt>,
}

#[derive(Debug, Default)]
struct State {
    head: BlockNumber,
    syncing: bool,
    tx_counts: HashMap<Address, u64>,
    responses: HashMap<CallKey, Bytes>,
    failing_calls: HashSet<SelectorKey>,
    failing_estimates: HashSet<SelectorKey>,
    reverting: HashSet<SelectorKey>,
    estimates: HashMap<[u8; 4], u64>,
    native_balances: HashMap<Address, U256>,
    gas_price: Option<U256>,
    inclusion_delay: u32,
    effects: HashMap<SelectorKey, Vec<(CallKey, Bytes)>>,
    pending: HashMap<TxHash, PendingTx>,
    journal: Vec<LedgerOp>,
    sent: Vec<TxIntent>,
    tx_counter: u64,
}

/// A scripted execution ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<State>,
}

impl InMemoryLedger {
    /// Creates a ledger whose head is at `head`.
    pub fn new(head: BlockNumber) -> Self {
        let ledger = Self::default();
        ledger.state.lock().head = head;
        ledger
    }

    /// Moves the head to `head`.
    pub fn set_head(&self, head: BlockNumber) {
        self.state.lock().head = head;
    }

    /// Current head.
    pub fn head(&self) -> BlockNumber {
        self.state.lock().head
    }

    /// Answers reads of `calldata` against `to` with `ret`.
    pub fn set_call(&self, to: Address, calldata: impl Into<Bytes>, ret: impl Into<Bytes>) {
        self.state
            .lock()
            .responses
            .insert((to, calldata.into()), ret.into());
    }

    /// Reports the node as catching up (or not).
    pub fn set_syncing(&self, syncing: bool) {
        self.state.lock().syncing = syncing;
    }

    /// Sets the transaction count of `account`. Every broadcast from it adds one.
    pub fn set_transaction_count(&self, account: Address, count: u64) {
        self.state.lock().tx_counts.insert(account, count);
    }

    /// Makes every read of `selector` against `to` fail.
    pub fn fail_calls(&self, to: Address, selector: [u8; 4]) {
        self.state.lock().failing_calls.insert((to, selector));
    }

    /// Makes every gas estimate of `selector` against `to` fail.
    pub fn fail_estimates(&self, to: Address, selector: [u8; 4]) {
        self.state.lock().failing_estimates.insert((to, selector));
    }

    /// Makes transactions calling `selector` on `to` be included with a failed status.
    pub fn revert_transactions(&self, to: Address, selector: [u8; 4]) {
        self.state.lock().reverting.insert((to, selector));
    }

    /// Gas reported for estimates of `selector`.
    pub fn set_gas_estimate(&self, selector: [u8; 4], gas: u64) {
        self.state.lock().estimates.insert(selector, gas);
    }

    /// Native balance reported for `account`.
    pub fn set_native_balance(&self, account: Address, balance: U256) {
        self.state.lock().native_balances.insert(account, balance);
    }

    /// Fee per gas suggested by the node. Without one, `gas_price` fails.
    pub fn set_gas_price(&self, price: U256) {
        self.state.lock().gas_price = Some(price);
    }

    /// Number of receipt polls that report a transaction as pending before it is included.
    pub fn set_inclusion_delay(&self, polls: u32) {
        self.state.lock().inclusion_delay = polls;
    }

    /// When a transaction calling `selector` on `to` is included, reads of `calldata` against
    /// `target` start returning `ret`.
    pub fn on_inclusion(
        &self,
        to: Address,
        selector: [u8; 4],
        target: Address,
        calldata: impl Into<Bytes>,
        ret: impl Into<Bytes>,
    ) {
        self.state
            .lock()
            .effects
            .entry((to, selector))
            .or_default()
            .push(((target, calldata.into()), ret.into()));
    }

    /// Every operation observed so far, in order.
    pub fn journal(&self) -> Vec<LedgerOp> {
        self.state.lock().journal.clone()
    }

    /// Every transaction broadcast so far, in order.
    pub fn sent(&self) -> Vec<TxIntent> {
        self.state.lock().sent.clone()
    }

    /// Forgets recorded operations and broadcasts.
    pub fn clear_journal(&self) {
        let mut state = self.state.lock();
        state.journal.clear();
        state.sent.clear();
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn header_at(&self, block: BlockId) -> LedgerResult<BlockHeader> {
        let state = self.state.lock();
        let number = match block {
            BlockId::Latest => state.head,
            BlockId::Number(n) if n <= state.head => n,
            BlockId::Number(n) => {
                return Err(LedgerError::Missing(format!("block {n} not produced yet")))
            }
        };

        Ok(BlockHeader {
            number,
            timestamp: number * BLOCK_TIME,
        })
    }

    async fn read_state(&self, call: &ContractCall, block: BlockId) -> LedgerResult<Bytes> {
        let mut state = self.state.lock();
        let selector = call.selector();
        state.journal.push(LedgerOp::Read {
            to: call.to,
            selector,
            block,
        });

        if let Some(sel) = selector {
            if state.failing_calls.contains(&(call.to, sel)) {
                return Err(LedgerError::CallFailed {
                    to: call.to,
                    reason: "scripted failure".to_owned(),
                });
            }
        }

        let ret = state
            .responses
            .get(&(call.to, call.data.clone()))
            .cloned()
            .unwrap_or_else(|| Bytes::from(vec![0u8; WORD]));
        Ok(ret)
    }

    async fn is_syncing(&self) -> LedgerResult<bool> {
        Ok(self.state.lock().syncing)
    }

    async fn transaction_count(&self, account: Address) -> LedgerResult<u64> {
        Ok(self
            .state
            .lock()
            .tx_counts
            .get(&account)
            .copied()
            .unwrap_or(0))
    }

    async fn native_balance(&self, account: Address, _block: BlockId) -> LedgerResult<U256> {
        Ok(self
            .state
            .lock()
            .native_balances
            .get(&account)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn estimate_gas(&self, tx: &TxRequest) -> LedgerResult<u64> {
        let mut state = self.state.lock();
        let selector = tx.selector();
        state.journal.push(LedgerOp::Estimate {
            to: tx.to,
            selector,
        });

        let Some(sel) = selector else {
            return Ok(DEFAULT_GAS_ESTIMATE);
        };
        if state.failing_estimates.contains(&(tx.to, sel)) {
            return Err(LedgerError::CallFailed {
                to: tx.to,
                reason: "execution reverted".to_owned(),
            });
        }

        Ok(state
            .estimates
            .get(&sel)
            .copied()
            .unwrap_or(DEFAULT_GAS_ESTIMATE))
    }

    async fn gas_price(&self) -> LedgerResult<U256> {
        self.state
            .lock()
            .gas_price
            .ok_or_else(|| LedgerError::Missing("gas price not available".to_owned()))
    }

    async fn send_transaction(&self, intent: &TxIntent) -> LedgerResult<TxHash> {
        let mut state = self.state.lock();
        state.tx_counter += 1;
        let hash = keccak256(state.tx_counter.to_be_bytes());
        *state.tx_counts.entry(intent.request.from).or_default() += 1;

        let polls_left = state.inclusion_delay;
        state.journal.push(LedgerOp::Send {
            to: intent.request.to,
            selector: intent.request.selector(),
            nonce: intent.nonce,
            hash,
        });
        state.sent.push(intent.clone());
        state.pending.insert(
            hash,
            PendingTx {
                intent: intent.clone(),
                polls_left,
                receipt: None,
            },
        );

        trace!(%hash, to = %intent.request.to, "accepted transaction");
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> LedgerResult<Option<Receipt>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let head = state.head;

        let pending = state
            .pending
            .get_mut(&hash)
            .ok_or(LedgerError::UnknownTransaction(hash))?;
        if let Some(receipt) = pending.receipt {
            return Ok(Some(receipt));
        }
        if pending.polls_left > 0 {
            pending.polls_left -= 1;
            return Ok(None);
        }

        let to = pending.intent.request.to;
        let selector = pending.intent.request.selector();
        let success = selector.map_or(true, |sel| !state.reverting.contains(&(to, sel)));
        let receipt = Receipt {
            tx_hash: hash,
            block_number: head,
            gas_used: pending.intent.fees.gas_limit,
            success,
        };
        pending.receipt = Some(receipt);

        state
            .journal
            .push(LedgerOp::Included { hash, to, selector });

        if let (true, Some(sel)) = (success, selector) {
            if let Some(writes) = state.effects.get(&(to, sel)) {
                for (key, ret) in writes.clone() {
                    state.responses.insert(key, ret);
                }
            }
        }

        Ok(Some(receipt))
    }
}

/// A scripted consensus client.
#[derive(Debug)]
pub struct InMemoryConsensus {
    config: ConsensusConfig,
    head_slot: Mutex<u64>,
    statuses: Mutex<HashMap<ValidatorPubkey, ValidatorStatus>>,
}

impl InMemoryConsensus {
    /// Creates a client for a chain with the given genesis fork version.
    pub fn new(genesis_fork_version: [u8; 4]) -> Self {
        Self {
            config: ConsensusConfig {
                genesis_fork_version,
                seconds_per_slot: 12,
                slots_per_epoch: 32,
            },
            head_slot: Mutex::new(0),
            statuses: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the status reported for `pubkey`.
    pub fn set_status(&self, pubkey: ValidatorPubkey, status: ValidatorStatus) {
        self.statuses.lock().insert(pubkey, status);
    }

    /// Sets the head slot.
    pub fn set_head_slot(&self, slot: u64) {
        *self.head_slot.lock() = slot;
    }
}

#[async_trait]
impl ConsensusClient for InMemoryConsensus {
    async fn head_at(&self, block: BeaconBlockId) -> LedgerResult<BeaconHead> {
        let slot = match block {
            BeaconBlockId::Head => *self.head_slot.lock(),
            BeaconBlockId::Slot(s) => s,
        };
        Ok(BeaconHead { slot })
    }

    async fn validator_status(&self, pubkey: &ValidatorPubkey) -> LedgerResult<ValidatorStatus> {
        Ok(self
            .statuses
            .lock()
            .get(pubkey)
            .copied()
            .unwrap_or(ValidatorStatus::Unknown))
    }

    async fn config(&self) -> LedgerResult<ConsensusConfig> {
        Ok(self.config)
    }
}

/// A deposit signer that derives a deterministic signature from the signing root.
///
/// The output is not a valid BLS signature.
#[derive(Debug, Default)]
pub struct DeterministicSigner {
    signed: Mutex<Vec<B256>>,
}

impl DeterministicSigner {
    /// Signing roots signed so far.
    pub fn signed_roots(&self) -> Vec<B256> {
        self.signed.lock().clone()
    }

    /// The signature this signer produces for `signing_root`.
    pub fn signature_for(signing_root: B256) -> ValidatorSignature {
        let mut sig = [0u8; 96];
        let mut block: [u8; 32] = Sha256::digest(signing_root).into();
        for chunk in sig.chunks_mut(32) {
            chunk.copy_from_slice(&block);
            block = Sha256::digest(block).into();
        }
        ValidatorSignature::from(sig)
    }
}

#[async_trait]
impl DepositSigner for DeterministicSigner {
    async fn sign_deposit(
        &self,
        request: &DepositSigningRequest,
    ) -> LedgerResult<ValidatorSignature> {
        self.signed.lock().push(request.signing_root);
        Ok(Self::signature_for(request.signing_root))
    }
}
