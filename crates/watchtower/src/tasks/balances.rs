//! Reports the network's ether balances and rETH supply.

use async_trait::async_trait;
use futures::{future::try_join_all, try_join};
use smartnode_ledger::LedgerResult;
use smartnode_primitives::{
    keys::BALANCES_SUBMITTED_NAMESPACE,
    types::{Address, BlockId, BlockNumber, TxRequest},
    units::{to_f64, wei_to_eth},
    U256,
};
use smartnode_protocol::{minipool::MinipoolStatus, ProtocolClient};
use tracing::{debug, info};

use crate::reporting::ReportSource;

/// A balance report for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceReport {
    /// Ether held by the deposit pool, the rETH contract and user-funded minipools.
    pub total_eth: U256,

    /// User ether in staking minipools.
    pub staking_eth: U256,

    /// Total rETH supply.
    pub reth_supply: U256,
}

impl BalanceReport {
    /// Ether per rETH implied by the report; zero when there is no supply.
    pub fn implied_rate(&self) -> f64 {
        if self.reth_supply == U256::ZERO {
            return 0.0;
        }
        to_f64(self.total_eth) / to_f64(self.reth_supply)
    }
}

/// The balance reporting duty.
#[derive(Debug, Clone)]
pub struct BalanceSource {
    protocol: ProtocolClient,
}

impl BalanceSource {
    /// Creates the source.
    pub fn new(protocol: ProtocolClient) -> Self {
        Self { protocol }
    }

    /// User ether in minipools at `at`, split into (funded, staking).
    async fn minipool_balances(&self, at: BlockId) -> LedgerResult<(U256, U256)> {
        let addresses = self.protocol.minipools(at).await?;
        let details = self.protocol.minipool_details(&addresses, at).await?;

        let funded: Vec<_> = details
            .into_iter()
            .filter(|d| d.status.holds_user_funds())
            .collect();
        let deposits = try_join_all(
            funded
                .iter()
                .map(|d| self.protocol.minipool_user_deposit(d.address, at)),
        )
        .await?;

        let mut total = U256::ZERO;
        let mut staking = U256::ZERO;
        for (details, deposit) in funded.iter().zip(deposits) {
            total = total.saturating_add(deposit);
            if details.status == MinipoolStatus::Staking {
                staking = staking.saturating_add(deposit);
            }
        }

        debug!(minipools = addresses.len(), funded = funded.len(), "summed minipool balances");
        Ok((total, staking))
    }
}

#[async_trait]
impl ReportSource for BalanceSource {
    type Report = BalanceReport;

    fn name(&self) -> &'static str {
        "submit-balances"
    }

    fn namespace(&self) -> &'static str {
        BALANCES_SUBMITTED_NAMESPACE
    }

    async fn is_enabled(&self) -> LedgerResult<bool> {
        self.protocol.submit_balances_enabled().await
    }

    async fn latest_reportable_block(&self) -> LedgerResult<BlockNumber> {
        self.protocol.latest_reportable_balances_block().await
    }

    async fn last_recorded_block(&self) -> LedgerResult<BlockNumber> {
        self.protocol.balances_block().await
    }

    async fn compute(&self, block: BlockNumber) -> LedgerResult<BalanceReport> {
        let at = BlockId::Number(block);
        let (pool, collateral, reth_supply, (minipool_total, staking_eth)) = try_join!(
            self.protocol.deposit_pool_balance(at),
            self.protocol.reth_collateral(at),
            self.protocol.reth_supply(at),
            self.minipool_balances(at),
        )?;

        let report = BalanceReport {
            total_eth: pool.saturating_add(collateral).saturating_add(minipool_total),
            staking_eth,
            reth_supply,
        };
        info!(
            %block,
            total_eth = %wei_to_eth(report.total_eth),
            staking_eth = %wei_to_eth(report.staking_eth),
            reth_supply = %wei_to_eth(report.reth_supply),
            implied_rate = %report.implied_rate(),
            "computed balances"
        );
        Ok(report)
    }

    fn words(&self, report: &BalanceReport) -> Vec<U256> {
        vec![report.total_eth, report.staking_eth, report.reth_supply]
    }

    fn submission(
        &self,
        from: Address,
        block: BlockNumber,
        report: &BalanceReport,
    ) -> LedgerResult<TxRequest> {
        self.protocol.submit_balances_tx(
            from,
            block,
            report.total_eth,
            report.staking_eth,
            report.reth_supply,
        )
    }
}
