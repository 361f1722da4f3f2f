//! Reports the GGP price and the network's effective GGP stake.

use async_trait::async_trait;
use smartnode_ledger::LedgerResult;
use smartnode_primitives::{
    keys::PRICES_SUBMITTED_NAMESPACE,
    token::TokenKind,
    types::{Address, BlockId, BlockNumber, TxRequest},
    units::wei_to_eth,
    U256,
};
use smartnode_protocol::ProtocolClient;
use tracing::info;

use crate::reporting::ReportSource;

/// A price report for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceReport {
    /// GGP price in wei per GGP.
    pub price: U256,

    /// Effective GGP stake of the whole network at `price`.
    pub effective_stake: U256,
}

/// The price reporting duty.
#[derive(Debug, Clone)]
pub struct PriceSource {
    protocol: ProtocolClient,
}

impl PriceSource {
    /// Creates the source.
    pub fn new(protocol: ProtocolClient) -> Self {
        Self { protocol }
    }
}

#[async_trait]
impl ReportSource for PriceSource {
    type Report = PriceReport;

    fn name(&self) -> &'static str {
        "submit-prices"
    }

    fn namespace(&self) -> &'static str {
        PRICES_SUBMITTED_NAMESPACE
    }

    async fn is_enabled(&self) -> LedgerResult<bool> {
        self.protocol.submit_prices_enabled().await
    }

    async fn latest_reportable_block(&self) -> LedgerResult<BlockNumber> {
        self.protocol.latest_reportable_prices_block().await
    }

    async fn last_recorded_block(&self) -> LedgerResult<BlockNumber> {
        self.protocol.prices_block().await
    }

    async fn compute(&self, block: BlockNumber) -> LedgerResult<PriceReport> {
        let at = BlockId::Number(block);
        let ggp = self
            .protocol
            .registry()
            .get(TokenKind::Ggp.contract_name())?;

        // the stake is valued at the price being reported, so the reads are sequential
        let price = self.protocol.oracle_rate_to_eth(ggp, at).await?;
        let effective_stake = self.protocol.total_effective_ggp_stake(price, at).await?;

        info!(
            %block,
            price_eth = %wei_to_eth(price),
            effective_stake_ggp = %wei_to_eth(effective_stake),
            "computed prices"
        );
        Ok(PriceReport {
            price,
            effective_stake,
        })
    }

    fn words(&self, report: &PriceReport) -> Vec<U256> {
        vec![report.price, report.effective_stake]
    }

    fn submission(
        &self,
        from: Address,
        block: BlockNumber,
        report: &PriceReport,
    ) -> LedgerResult<TxRequest> {
        self.protocol
            .submit_prices_tx(from, block, report.price, report.effective_stake)
    }
}
