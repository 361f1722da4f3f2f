//! Drives a transaction from request to inclusion.
//!
//! A [`TxDriver`] holds a write lock for the whole of submit-and-wait, so mutating transactions
//! from one process are totally ordered and never race for the same nonce.

use std::{sync::Arc, time::Duration};

use smartnode_ledger::LedgerClient;
use smartnode_primitives::types::{Receipt, TxFees, TxHash, TxIntent, TxRequest};
use tokio::{sync::Mutex, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    errors::{TxError, TxResult},
    gas::{CostGate, GasDecision, GasEstimate, GasPolicy, SkipReason},
    nonce::NonceManager,
};

/// Outcome of [`TxDriver::drive`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveOutcome {
    /// The transaction was included and succeeded.
    Included(Receipt),

    /// The gas policy declined to send the transaction.
    Declined(SkipReason),
}

/// Prices, submits and tracks transactions for one account.
#[derive(Debug, Clone)]
pub struct TxDriver {
    ledger: Arc<dyn LedgerClient>,
    policy: GasPolicy,
    nonces: Arc<NonceManager>,
    poll_interval: Duration,
    cancel: CancellationToken,
    write_lock: Arc<Mutex<()>>,
}

impl TxDriver {
    /// Creates a driver.
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        policy: GasPolicy,
        nonces: Arc<NonceManager>,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            ledger,
            policy,
            nonces,
            poll_interval,
            cancel,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The ledger transactions are sent to.
    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    /// The gas policy applied to every transaction.
    pub fn policy(&self) -> &GasPolicy {
        &self.policy
    }

    /// Estimates the gas `tx` needs.
    pub async fn estimate(&self, action: &str, tx: &TxRequest) -> TxResult<GasEstimate> {
        let gas = self
            .ledger
            .estimate_gas(tx)
            .await
            .map_err(|source| TxError::Estimate {
                action: action.to_owned(),
                source,
            })?;

        Ok(self.policy.estimate_from(gas))
    }

    /// Estimates `tx`, applies the gas policy under `gate` and, if it proceeds, submits and waits
    /// for inclusion.
    pub async fn drive(&self, action: &str, tx: TxRequest, gate: CostGate) -> TxResult<DriveOutcome> {
        if gate.is_disabled() {
            return Ok(DriveOutcome::Declined(SkipReason::AutomationDisabled));
        }

        let estimate = self.estimate(action, &tx).await?;
        match self
            .policy
            .evaluate(self.ledger.as_ref(), &estimate, gate)
            .await?
        {
            GasDecision::Skip(reason) => {
                info!(%action, ?reason, "not sending transaction");
                Ok(DriveOutcome::Declined(reason))
            }
            GasDecision::Proceed(fees) => {
                let receipt = self.submit_and_wait(action, tx, fees).await?;
                Ok(DriveOutcome::Included(receipt))
            }
        }
    }

    /// Submits `tx` with `fees` and blocks until it is included.
    ///
    /// An included transaction whose execution failed is an error; it is never resubmitted.
    pub async fn submit_and_wait(
        &self,
        action: &str,
        tx: TxRequest,
        fees: TxFees,
    ) -> TxResult<Receipt> {
        let _guard = self.write_lock.lock().await;

        let hash = self.submit(tx, fees).await?;
        info!(%action, %hash, "transaction sent, waiting for inclusion");

        let receipt = self.wait_for_inclusion(hash).await?;
        info!(%action, %hash, block = receipt.block_number, gas_used = receipt.gas_used, "transaction included");
        Ok(receipt)
    }

    async fn submit(&self, tx: TxRequest, fees: TxFees) -> TxResult<TxHash> {
        if self.cancel.is_cancelled() {
            return Err(TxError::Cancelled);
        }

        let intent = TxIntent {
            request: tx,
            fees,
            nonce: self.nonces.current(),
        };
        let hash = self.ledger.send_transaction(&intent).await?;
        self.nonces.advance();

        debug!(%hash, nonce = ?intent.nonce, "submitted transaction");
        Ok(hash)
    }

    /// Polls until `hash` is included, failing if execution reverted or shutdown is requested.
    pub async fn wait_for_inclusion(&self, hash: TxHash) -> TxResult<Receipt> {
        loop {
            match self.ledger.transaction_receipt(hash).await {
                Ok(Some(receipt)) if receipt.success => return Ok(receipt),
                Ok(Some(receipt)) => {
                    error!(%hash, block = receipt.block_number, "transaction reverted");
                    return Err(TxError::Reverted(hash));
                }
                Ok(None) => {}
                Err(e) => warn!(%hash, %e, "could not poll for receipt, retrying"),
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    warn!(%hash, "shutdown requested while waiting for inclusion");
                    return Err(TxError::CancelledPending(hash));
                }
                _ = time::sleep(self.poll_interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::sol_types::SolCall;
    use smartnode_common::logging;
    use smartnode_ledger::inmemory::{InMemoryLedger, LedgerOp};
    use smartnode_params::gas::GasParams;
    use smartnode_primitives::{bindings::IRocketClaim, types::Address, U256};

    use super::*;
    use crate::gas::GasConfig;

    fn driver(ledger: Arc<InMemoryLedger>, nonce: Option<u64>) -> (TxDriver, CancellationToken) {
        let cancel = CancellationToken::new();
        let policy = GasPolicy::new(
            &GasConfig {
                max_fee_gwei: Some(20.0),
                ..Default::default()
            },
            GasParams::default(),
        )
        .expect("valid config");

        let driver = TxDriver::new(
            ledger,
            policy,
            Arc::new(NonceManager::new(nonce)),
            Duration::from_millis(1),
            cancel.clone(),
        );
        (driver, cancel)
    }

    fn claim(to: Address) -> TxRequest {
        TxRequest::call(Address::repeat_byte(1), to, &IRocketClaim::claimCall {})
    }

    #[tokio::test]
    async fn drive_waits_for_inclusion() {
        logging::init_for_tests();
        let ledger = Arc::new(InMemoryLedger::new(50));
        ledger.set_inclusion_delay(3);
        let (driver, _cancel) = driver(ledger.clone(), None);

        let target = Address::repeat_byte(2);
        let outcome = driver
            .drive("claim", claim(target), CostGate::Unchecked)
            .await
            .unwrap();

        let DriveOutcome::Included(receipt) = outcome else {
            panic!("expected inclusion");
        };
        assert!(receipt.success);
        assert_eq!(receipt.block_number, 50);

        let sent = ledger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].fees.gas_limit, 150_000);
        assert_eq!(sent[0].fees.max_fee_per_gas, U256::from(20_000_000_000u64));
    }

    #[tokio::test]
    async fn nonce_override_advances_per_send() {
        let ledger = Arc::new(InMemoryLedger::new(50));
        let (driver, _cancel) = driver(ledger.clone(), Some(41));
        let target = Address::repeat_byte(2);

        for _ in 0..3 {
            driver
                .drive("claim", claim(target), CostGate::Unchecked)
                .await
                .unwrap();
        }

        let nonces: Vec<_> = ledger.sent().iter().map(|i| i.nonce).collect();
        assert_eq!(nonces, vec![Some(41), Some(42), Some(43)]);
    }

    #[tokio::test]
    async fn reverted_transaction_is_an_error() {
        let ledger = Arc::new(InMemoryLedger::new(50));
        let target = Address::repeat_byte(2);
        ledger.revert_transactions(target, IRocketClaim::claimCall::SELECTOR);
        let (driver, _cancel) = driver(ledger.clone(), None);

        let err = driver
            .drive("claim", claim(target), CostGate::Unchecked)
            .await
            .unwrap_err();
        assert!(matches!(err, TxError::Reverted(_)));
        assert_eq!(ledger.sent().len(), 1);
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_wait() {
        let ledger = Arc::new(InMemoryLedger::new(50));
        ledger.set_inclusion_delay(u32::MAX);
        let (driver, cancel) = driver(ledger.clone(), None);

        let target = Address::repeat_byte(2);
        let handle = tokio::spawn({
            let driver = driver.clone();
            async move { driver.drive("claim", claim(target), CostGate::Unchecked).await }
        });

        time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, TxError::CancelledPending(_)));

        // nothing new goes out after shutdown
        let err = driver
            .drive("claim", claim(target), CostGate::Unchecked)
            .await
            .unwrap_err();
        assert!(matches!(err, TxError::Cancelled));
        assert_eq!(
            ledger
                .journal()
                .iter()
                .filter(|op| matches!(op, LedgerOp::Send { .. }))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn failed_estimate_sends_nothing() {
        let ledger = Arc::new(InMemoryLedger::new(50));
        let target = Address::repeat_byte(2);
        ledger.fail_estimates(target, IRocketClaim::claimCall::SELECTOR);
        let (driver, _cancel) = driver(ledger.clone(), None);

        let err = driver
            .drive("claim", claim(target), CostGate::Unchecked)
            .await
            .unwrap_err();
        assert!(matches!(err, TxError::Estimate { .. }));
        assert!(ledger.sent().is_empty());
    }
}
