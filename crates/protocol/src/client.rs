//! One method per contract view or transaction the daemons use.

use std::sync::Arc;

use alloy::sol_types::SolCall;
use futures::future::try_join_all;
use smartnode_ledger::{read_call, LedgerClient, LedgerError, LedgerResult};
use smartnode_primitives::{
    bindings::{
        IPriceOracle, IRocketAuctionManager, IRocketClaim, IRocketDAONodeTrusted,
        IRocketDAONodeTrustedActions, IRocketDAONodeTrustedSettingsMembers,
        IRocketDAONodeTrustedSettingsProposals, IRocketDAOProtocolSettingsAuction,
        IRocketDAOProtocolSettingsNetwork, IRocketDAOProtocolSettingsNode,
        IRocketDAOProtocolSettingsRewards, IRocketDepositPool, IRocketMinipool,
        IRocketMinipoolFactory, IRocketMinipoolManager, IRocketNetworkBalances,
        IRocketNetworkPrices, IRocketNodeDeposit, IRocketNodeStaking, IRocketTokenGGP,
        IRocketTokenRETH, IERC20,
    },
    deposit::{DepositData, ValidatorPubkey},
    errors::ParseError,
    token::TokenKind,
    types::{Address, BlockHeader, BlockId, BlockNumber, Bytes, TxRequest},
    U256,
};

use crate::{
    contracts::{names, ContractRegistry},
    minipool::{MinipoolDetails, MinipoolStatus},
};

/// Proposal kind under which a trusted node invitation is recorded.
const INVITE_PROPOSAL: &str = "invited";

fn narrow(what: &str, v: U256) -> LedgerResult<u64> {
    u64::try_from(v).map_err(|_| ParseError::OutOfRange(format!("{what}: {v}")).into())
}

/// Everything the node deposit contract needs for one new minipool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeDepositArgs {
    /// Ether the node puts in, in wei.
    pub amount: U256,

    /// Lowest commission rate the node accepts, as an 18-decimal fraction.
    pub min_node_fee: U256,

    /// Signed prelaunch deposit of the new validator.
    pub deposit: DepositData,

    /// Salt the minipool address is derived with.
    pub salt: U256,

    /// Address the minipool will be deployed at.
    pub expected_minipool: Address,
}

/// Typed reads and transaction builders over the protocol contracts.
#[derive(Debug, Clone)]
pub struct ProtocolClient {
    ledger: Arc<dyn LedgerClient>,
    registry: Arc<ContractRegistry>,
    price_oracle: Address,
}

impl ProtocolClient {
    /// Creates a client over `registry`, reading prices from the oracle at `price_oracle`.
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        registry: Arc<ContractRegistry>,
        price_oracle: Address,
    ) -> Self {
        Self {
            ledger,
            registry,
            price_oracle,
        }
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    /// The resolved contract addresses.
    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    async fn view_at<C: SolCall>(&self, to: Address, call: C, at: BlockId) -> LedgerResult<C::Return> {
        read_call(self.ledger.as_ref(), to, &call, at).await
    }

    async fn view<C: SolCall>(&self, contract: &str, call: C, at: BlockId) -> LedgerResult<C::Return> {
        let to = self.registry.get(contract)?;
        self.view_at(to, call, at).await
    }

    fn tx<C: SolCall>(&self, from: Address, contract: &str, call: &C) -> LedgerResult<TxRequest> {
        let to = self.registry.get(contract)?;
        Ok(TxRequest::call(from, to, call))
    }

    /// Header of the latest block.
    pub async fn head(&self) -> LedgerResult<BlockHeader> {
        self.ledger.header_at(BlockId::Latest).await
    }

    /// Native balance of `account`.
    pub async fn native_balance(&self, account: Address) -> LedgerResult<U256> {
        self.ledger.native_balance(account, BlockId::Latest).await
    }

    // trusted node membership and settings

    /// Whether `node` is a member of the trusted node DAO.
    pub async fn is_trusted_member(&self, node: Address) -> LedgerResult<bool> {
        let call = IRocketDAONodeTrusted::getMemberIsValidCall { node };
        Ok(self.view(names::DAO_NODE_TRUSTED, call, BlockId::Latest).await?._0)
    }

    /// Time the invitation proposal for `node` was executed, or zero if it never was.
    pub async fn invite_executed_time(&self, node: Address) -> LedgerResult<u64> {
        let call = IRocketDAONodeTrusted::getMemberProposalExecutedTimeCall {
            proposalType: INVITE_PROPOSAL.to_owned(),
            node,
        };
        let ret = self.view(names::DAO_NODE_TRUSTED, call, BlockId::Latest).await?;
        narrow("proposal executed time", ret._0)
    }

    /// Validators `node` runs without a bond, as a trusted member.
    pub async fn member_unbonded_validator_count(&self, node: Address) -> LedgerResult<U256> {
        let call = IRocketDAONodeTrusted::getMemberUnbondedValidatorCountCall { node };
        Ok(self.view(names::DAO_NODE_TRUSTED, call, BlockId::Latest).await?._0)
    }

    /// Seconds an executed proposal stays actionable.
    pub async fn proposal_action_time(&self) -> LedgerResult<u64> {
        let ret = self
            .view(
                names::DAO_NODE_TRUSTED_SETTINGS_PROPOSALS,
                IRocketDAONodeTrustedSettingsProposals::getActionTimeCall {},
                BlockId::Latest,
            )
            .await?;
        narrow("proposal action time", ret._0)
    }

    /// GGP bond required to join the trusted node DAO.
    pub async fn ggp_bond(&self) -> LedgerResult<U256> {
        let ret = self
            .view(
                names::DAO_NODE_TRUSTED_SETTINGS_MEMBERS,
                IRocketDAONodeTrustedSettingsMembers::getGGPBondCall {},
                BlockId::Latest,
            )
            .await?;
        Ok(ret._0)
    }

    /// Most unbonded validators a trusted member may run.
    pub async fn minipool_unbonded_max(&self) -> LedgerResult<U256> {
        let ret = self
            .view(
                names::DAO_NODE_TRUSTED_SETTINGS_MEMBERS,
                IRocketDAONodeTrustedSettingsMembers::getMinipoolUnbondedMaxCall {},
                BlockId::Latest,
            )
            .await?;
        Ok(ret._0)
    }

    /// Whether price submissions are enabled.
    pub async fn submit_prices_enabled(&self) -> LedgerResult<bool> {
        let ret = self
            .view(
                names::DAO_PROTOCOL_SETTINGS_NETWORK,
                IRocketDAOProtocolSettingsNetwork::getSubmitPricesEnabledCall {},
                BlockId::Latest,
            )
            .await?;
        Ok(ret._0)
    }

    /// Whether balance submissions are enabled.
    pub async fn submit_balances_enabled(&self) -> LedgerResult<bool> {
        let ret = self
            .view(
                names::DAO_PROTOCOL_SETTINGS_NETWORK,
                IRocketDAOProtocolSettingsNetwork::getSubmitBalancesEnabledCall {},
                BlockId::Latest,
            )
            .await?;
        Ok(ret._0)
    }

    /// Whether node deposits are enabled.
    pub async fn node_deposit_enabled(&self) -> LedgerResult<bool> {
        let ret = self
            .view(
                names::DAO_PROTOCOL_SETTINGS_NODE,
                IRocketDAOProtocolSettingsNode::getDepositEnabledCall {},
                BlockId::Latest,
            )
            .await?;
        Ok(ret._0)
    }

    // network prices

    /// Block of the last price update that reached consensus.
    pub async fn prices_block(&self) -> LedgerResult<BlockNumber> {
        let ret = self
            .view(
                names::NETWORK_PRICES,
                IRocketNetworkPrices::getPricesBlockCall {},
                BlockId::Latest,
            )
            .await?;
        narrow("prices block", ret._0)
    }

    /// Latest block prices may be reported for.
    pub async fn latest_reportable_prices_block(&self) -> LedgerResult<BlockNumber> {
        let ret = self
            .view(
                names::NETWORK_PRICES,
                IRocketNetworkPrices::getLatestReportableBlockCall {},
                BlockId::Latest,
            )
            .await?;
        narrow("reportable prices block", ret._0)
    }

    /// Whether the network's recorded price is in consensus.
    pub async fn in_consensus(&self) -> LedgerResult<bool> {
        let ret = self
            .view(
                names::NETWORK_PRICES,
                IRocketNetworkPrices::inConsensusCall {},
                BlockId::Latest,
            )
            .await?;
        Ok(ret._0)
    }

    /// Network GGP price in wei per GGP.
    pub async fn ggp_price(&self) -> LedgerResult<U256> {
        let ret = self
            .view(
                names::NETWORK_PRICES,
                IRocketNetworkPrices::getGGPPriceCall {},
                BlockId::Latest,
            )
            .await?;
        Ok(ret._0)
    }

    /// Rate of `token` to ether from the price oracle, at `at`.
    pub async fn oracle_rate_to_eth(&self, token: Address, at: BlockId) -> LedgerResult<U256> {
        let call = IPriceOracle::getRateToEthCall {
            srcToken: token,
            useSrcWrappers: true,
        };
        Ok(self.view_at(self.price_oracle, call, at).await?._0)
    }

    /// Effective GGP stake of the whole network at `price`, evaluated at `at`.
    pub async fn total_effective_ggp_stake(&self, price: U256, at: BlockId) -> LedgerResult<U256> {
        let call = IRocketNodeStaking::calculateTotalEffectiveGGPStakeCall {
            offset: U256::ZERO,
            limit: U256::ZERO,
            ggpPrice: price,
        };
        Ok(self.view(names::NODE_STAKING, call, at).await?._0)
    }

    /// Submits a price report.
    pub fn submit_prices_tx(
        &self,
        from: Address,
        block: BlockNumber,
        price: U256,
        effective_stake: U256,
    ) -> LedgerResult<TxRequest> {
        self.tx(
            from,
            names::NETWORK_PRICES,
            &IRocketNetworkPrices::submitPricesCall {
                block: U256::from(block),
                ggpPrice: price,
                effectiveGgpStake: effective_stake,
            },
        )
    }

    // network balances

    /// Block of the last balance update that reached consensus.
    pub async fn balances_block(&self) -> LedgerResult<BlockNumber> {
        let ret = self
            .view(
                names::NETWORK_BALANCES,
                IRocketNetworkBalances::getBalancesBlockCall {},
                BlockId::Latest,
            )
            .await?;
        narrow("balances block", ret._0)
    }

    /// Latest block balances may be reported for.
    pub async fn latest_reportable_balances_block(&self) -> LedgerResult<BlockNumber> {
        let ret = self
            .view(
                names::NETWORK_BALANCES,
                IRocketNetworkBalances::getLatestReportableBlockCall {},
                BlockId::Latest,
            )
            .await?;
        narrow("reportable balances block", ret._0)
    }

    /// Ether held by the deposit pool.
    pub async fn deposit_pool_balance(&self, at: BlockId) -> LedgerResult<U256> {
        let ret = self
            .view(names::DEPOSIT_POOL, IRocketDepositPool::getBalanceCall {}, at)
            .await?;
        Ok(ret._0)
    }

    /// Ether held as collateral by the rETH contract.
    pub async fn reth_collateral(&self, at: BlockId) -> LedgerResult<U256> {
        let ret = self
            .view(
                TokenKind::Reth.contract_name(),
                IRocketTokenRETH::getTotalCollateralCall {},
                at,
            )
            .await?;
        Ok(ret._0)
    }

    /// Total rETH supply.
    pub async fn reth_supply(&self, at: BlockId) -> LedgerResult<U256> {
        let ret = self
            .view(TokenKind::Reth.contract_name(), IERC20::totalSupplyCall {}, at)
            .await?;
        Ok(ret._0)
    }

    /// Submits a balance report.
    pub fn submit_balances_tx(
        &self,
        from: Address,
        block: BlockNumber,
        total_eth: U256,
        staking_eth: U256,
        reth_supply: U256,
    ) -> LedgerResult<TxRequest> {
        self.tx(
            from,
            names::NETWORK_BALANCES,
            &IRocketNetworkBalances::submitBalancesCall {
                block: U256::from(block),
                totalEth: total_eth,
                stakingEth: staking_eth,
                rethSupply: reth_supply,
            },
        )
    }

    // minipools

    /// Addresses of every minipool in the network, at `at`.
    pub async fn minipools(&self, at: BlockId) -> LedgerResult<Vec<Address>> {
        let ret = self
            .view(
                names::MINIPOOL_MANAGER,
                IRocketMinipoolManager::getMinipoolCountCall {},
                at,
            )
            .await?;
        let count = narrow("minipool count", ret._0)?;

        try_join_all((0..count).map(|i| async move {
            let call = IRocketMinipoolManager::getMinipoolAtCall {
                index: U256::from(i),
            };
            Ok::<_, LedgerError>(self.view(names::MINIPOOL_MANAGER, call, at).await?._0)
        }))
        .await
    }

    /// Number of minipools owned by `node`.
    pub async fn node_minipool_count(&self, node: Address) -> LedgerResult<u64> {
        let call = IRocketMinipoolManager::getNodeMinipoolCountCall { node };
        let ret = self
            .view(names::MINIPOOL_MANAGER, call, BlockId::Latest)
            .await?;
        narrow("node minipool count", ret._0)
    }

    /// Addresses of the minipools owned by `node`.
    pub async fn node_minipools(&self, node: Address) -> LedgerResult<Vec<Address>> {
        let count = self.node_minipool_count(node).await?;

        try_join_all((0..count).map(|i| async move {
            let call = IRocketMinipoolManager::getNodeMinipoolAtCall {
                node,
                index: U256::from(i),
            };
            let ret = self
                .view(names::MINIPOOL_MANAGER, call, BlockId::Latest)
                .await?;
            Ok::<_, LedgerError>(ret._0)
        }))
        .await
    }

    /// Status of the minipool at `minipool`.
    pub async fn minipool_status(
        &self,
        minipool: Address,
        at: BlockId,
    ) -> LedgerResult<MinipoolStatus> {
        let code = self
            .view_at(minipool, IRocketMinipool::getStatusCall {}, at)
            .await?
            ._0;

        MinipoolStatus::from_code(code)
            .ok_or_else(|| LedgerError::Missing(format!("minipool {minipool} status {code}")))
    }

    /// Statuses of `minipools`, read concurrently.
    pub async fn minipool_details(
        &self,
        minipools: &[Address],
        at: BlockId,
    ) -> LedgerResult<Vec<MinipoolDetails>> {
        try_join_all(minipools.iter().map(|&address| async move {
            let status = self.minipool_status(address, at).await?;
            Ok::<_, LedgerError>(MinipoolDetails { address, status })
        }))
        .await
    }

    /// User ether assigned to `minipool`.
    pub async fn minipool_user_deposit(&self, minipool: Address, at: BlockId) -> LedgerResult<U256> {
        let ret = self
            .view_at(minipool, IRocketMinipool::getUserDepositBalanceCall {}, at)
            .await?;
        Ok(ret._0)
    }

    /// Validator public key registered for `minipool`.
    pub async fn minipool_pubkey(&self, minipool: Address) -> LedgerResult<ValidatorPubkey> {
        let call = IRocketMinipoolManager::getMinipoolPubkeyCall { minipool };
        let raw = self
            .view(names::MINIPOOL_MANAGER, call, BlockId::Latest)
            .await?
            ._0;

        ValidatorPubkey::try_from(raw.as_ref()).map_err(|_| {
            ParseError::InvalidLength {
                expected: 48,
                actual: raw.len(),
            }
            .into()
        })
    }

    /// Stakes the prelaunch `minipool` with `deposit`.
    pub fn minipool_stake_tx(
        &self,
        from: Address,
        minipool: Address,
        deposit: &DepositData,
    ) -> TxRequest {
        TxRequest::call(
            from,
            minipool,
            &IRocketMinipool::stakeCall {
                validatorSignature: Bytes::copy_from_slice(deposit.signature.as_slice()),
                depositDataRoot: deposit.hash_tree_root(),
            },
        )
    }

    /// Deposit type the protocol assigns to a node deposit of `amount` wei.
    pub async fn deposit_type(&self, amount: U256) -> LedgerResult<u8> {
        let call = IRocketNodeDeposit::getDepositTypeCall { amount };
        Ok(self.view(names::NODE_DEPOSIT, call, BlockId::Latest).await?._0)
    }

    /// Address a minipool of `deposit_type` created by `node` with `salt` will be deployed at.
    pub async fn expected_minipool_address(
        &self,
        node: Address,
        deposit_type: u8,
        salt: U256,
    ) -> LedgerResult<Address> {
        let call = IRocketMinipoolFactory::getExpectedAddressCall {
            node,
            depositType: deposit_type,
            salt,
        };
        Ok(self
            .view(names::MINIPOOL_FACTORY, call, BlockId::Latest)
            .await?
            ._0)
    }

    /// Creates a minipool with the node's deposit attached.
    pub fn node_deposit_tx(&self, from: Address, args: &NodeDepositArgs) -> LedgerResult<TxRequest> {
        let call = IRocketNodeDeposit::depositCall {
            minimumNodeFee: args.min_node_fee,
            validatorPubkey: Bytes::copy_from_slice(args.deposit.message.pubkey.as_slice()),
            validatorSignature: Bytes::copy_from_slice(args.deposit.signature.as_slice()),
            depositDataRoot: args.deposit.hash_tree_root(),
            salt: args.salt,
            expectedMinipoolAddress: args.expected_minipool,
        };
        Ok(self
            .tx(from, names::NODE_DEPOSIT, &call)?
            .with_value(args.amount))
    }

    // rewards

    /// GGP claimable by trusted `node`.
    pub async fn trusted_node_claim_amount(&self, node: Address) -> LedgerResult<U256> {
        let call = IRocketClaim::getClaimRewardsAmountCall { node };
        Ok(self.view(names::CLAIM_TRUSTED_NODE, call, BlockId::Latest).await?._0)
    }

    /// GGP claimable by `node` as a regular operator.
    pub async fn node_claim_amount(&self, node: Address) -> LedgerResult<U256> {
        let call = IRocketClaim::getClaimRewardsAmountCall { node };
        Ok(self.view(names::CLAIM_NODE, call, BlockId::Latest).await?._0)
    }

    /// Claims trusted node rewards.
    pub fn claim_trusted_node_tx(&self, from: Address) -> LedgerResult<TxRequest> {
        self.tx(from, names::CLAIM_TRUSTED_NODE, &IRocketClaim::claimCall {})
    }

    /// Claims node rewards.
    pub fn claim_node_tx(&self, from: Address) -> LedgerResult<TxRequest> {
        self.tx(from, names::CLAIM_NODE, &IRocketClaim::claimCall {})
    }

    // tokens and staking

    /// Balance of `token` held by `owner`.
    pub async fn token_balance(&self, token: TokenKind, owner: Address) -> LedgerResult<U256> {
        let call = IERC20::balanceOfCall { owner };
        Ok(self.view(token.contract_name(), call, BlockId::Latest).await?._0)
    }

    /// GGP staked by `node`.
    pub async fn node_ggp_stake(&self, node: Address) -> LedgerResult<U256> {
        let call = IRocketNodeStaking::getNodeGGPStakeCall { node };
        Ok(self.view(names::NODE_STAKING, call, BlockId::Latest).await?._0)
    }

    /// Minimum GGP `node` must keep staked to collateralise its minipools.
    pub async fn node_minimum_ggp_stake(&self, node: Address) -> LedgerResult<U256> {
        let call = IRocketNodeStaking::getNodeMinimumGGPStakeCall { node };
        Ok(self.view(names::NODE_STAKING, call, BlockId::Latest).await?._0)
    }

    /// Most minipools `node` may run with its current GGP stake.
    pub async fn node_minipool_limit(&self, node: Address) -> LedgerResult<U256> {
        let call = IRocketNodeStaking::getNodeMinipoolLimitCall { node };
        Ok(self.view(names::NODE_STAKING, call, BlockId::Latest).await?._0)
    }

    /// Time `node` last staked GGP.
    pub async fn node_ggp_staked_time(&self, node: Address) -> LedgerResult<u64> {
        let call = IRocketNodeStaking::getNodeGGPStakedTimeCall { node };
        let ret = self.view(names::NODE_STAKING, call, BlockId::Latest).await?;
        narrow("staked time", ret._0)
    }

    /// Seconds after a stake before it may be withdrawn.
    pub async fn rewards_claim_interval(&self) -> LedgerResult<u64> {
        let ret = self
            .view(
                names::DAO_PROTOCOL_SETTINGS_REWARDS,
                IRocketDAOProtocolSettingsRewards::getRewardsClaimIntervalTimeCall {},
                BlockId::Latest,
            )
            .await?;
        narrow("rewards claim interval", ret._0)
    }

    /// Stakes `amount` GGP.
    pub fn stake_ggp_tx(&self, from: Address, amount: U256) -> LedgerResult<TxRequest> {
        self.tx(
            from,
            names::NODE_STAKING,
            &IRocketNodeStaking::stakeGGPCall { amount },
        )
    }

    /// Withdraws `amount` staked GGP.
    pub fn withdraw_ggp_tx(&self, from: Address, amount: U256) -> LedgerResult<TxRequest> {
        self.tx(
            from,
            names::NODE_STAKING,
            &IRocketNodeStaking::withdrawGGPCall { amount },
        )
    }

    /// Swaps `amount` legacy GGP for GGP.
    pub fn swap_ggp_tx(&self, from: Address, amount: U256) -> LedgerResult<TxRequest> {
        self.tx(
            from,
            TokenKind::Ggp.contract_name(),
            &IRocketTokenGGP::swapTokensCall { amount },
        )
    }

    /// Joins the trusted node DAO after an invitation.
    pub fn join_odao_tx(&self, from: Address) -> LedgerResult<TxRequest> {
        self.tx(
            from,
            names::DAO_NODE_TRUSTED_ACTIONS,
            &IRocketDAONodeTrustedActions::actionJoinCall {},
        )
    }

    // auctions

    /// GGP held by the auction contract and not yet allotted to a lot.
    pub async fn auction_remaining_ggp(&self) -> LedgerResult<U256> {
        let ret = self
            .view(
                names::AUCTION_MANAGER,
                IRocketAuctionManager::getRemainingGGPBalanceCall {},
                BlockId::Latest,
            )
            .await?;
        Ok(ret._0)
    }

    /// Minimum ether value of a new lot.
    pub async fn lot_minimum_eth_value(&self) -> LedgerResult<U256> {
        let ret = self
            .view(
                names::DAO_PROTOCOL_SETTINGS_AUCTION,
                IRocketDAOProtocolSettingsAuction::getLotMinimumEthValueCall {},
                BlockId::Latest,
            )
            .await?;
        Ok(ret._0)
    }

    /// Whether lot creation is enabled.
    pub async fn create_lot_enabled(&self) -> LedgerResult<bool> {
        let ret = self
            .view(
                names::DAO_PROTOCOL_SETTINGS_AUCTION,
                IRocketDAOProtocolSettingsAuction::getCreateLotEnabledCall {},
                BlockId::Latest,
            )
            .await?;
        Ok(ret._0)
    }

    /// Whether bidding is enabled.
    pub async fn bid_on_lot_enabled(&self) -> LedgerResult<bool> {
        let ret = self
            .view(
                names::DAO_PROTOCOL_SETTINGS_AUCTION,
                IRocketDAOProtocolSettingsAuction::getBidOnLotEnabledCall {},
                BlockId::Latest,
            )
            .await?;
        Ok(ret._0)
    }

    /// Whether lot `lot` exists.
    pub async fn lot_exists(&self, lot: u64) -> LedgerResult<bool> {
        let call = IRocketAuctionManager::getLotExistsCall {
            lot: U256::from(lot),
        };
        Ok(self.view(names::AUCTION_MANAGER, call, BlockId::Latest).await?._0)
    }

    /// Block bidding on `lot` ends at.
    pub async fn lot_end_block(&self, lot: u64) -> LedgerResult<BlockNumber> {
        let call = IRocketAuctionManager::getLotEndBlockCall {
            lot: U256::from(lot),
        };
        let ret = self.view(names::AUCTION_MANAGER, call, BlockId::Latest).await?;
        narrow("lot end block", ret._0)
    }

    /// GGP still unsold in `lot`.
    pub async fn lot_remaining_ggp(&self, lot: u64) -> LedgerResult<U256> {
        let call = IRocketAuctionManager::getLotRemainingGGPAmountCall {
            lot: U256::from(lot),
        };
        Ok(self.view(names::AUCTION_MANAGER, call, BlockId::Latest).await?._0)
    }

    /// Whether the unsold GGP of `lot` was already returned to the auction.
    pub async fn lot_ggp_recovered(&self, lot: u64) -> LedgerResult<bool> {
        let call = IRocketAuctionManager::getLotGGPRecoveredCall {
            lot: U256::from(lot),
        };
        Ok(self.view(names::AUCTION_MANAGER, call, BlockId::Latest).await?._0)
    }

    /// Creates a new lot.
    pub fn create_lot_tx(&self, from: Address) -> LedgerResult<TxRequest> {
        self.tx(
            from,
            names::AUCTION_MANAGER,
            &IRocketAuctionManager::createLotCall {},
        )
    }

    /// Bids `value` wei on `lot`.
    pub fn place_bid_tx(&self, from: Address, lot: u64, value: U256) -> LedgerResult<TxRequest> {
        let call = IRocketAuctionManager::placeBidCall {
            lot: U256::from(lot),
        };
        Ok(self
            .tx(from, names::AUCTION_MANAGER, &call)?
            .with_value(value))
    }

    /// Returns the unsold GGP of a finished `lot` to the auction.
    pub fn recover_lot_tx(&self, from: Address, lot: u64) -> LedgerResult<TxRequest> {
        self.tx(
            from,
            names::AUCTION_MANAGER,
            &IRocketAuctionManager::recoverUnclaimedGGPCall {
                lot: U256::from(lot),
            },
        )
    }
}
