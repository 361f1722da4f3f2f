//! Operator actions and their dry-runs.
//!
//! Each action is a [`GatedAction`] whose `check` is the dry-run: `can_*` returns it to the
//! operator unchanged, and the real action re-runs it immediately before sending so both report
//! the same reasons. Actions that pull tokens go through the [`SequencedPipeline`]; the rest are
//! sent directly.

use async_trait::async_trait;
use futures::try_join;
use serde::Serialize;
use smartnode_ledger::{
    signer::DepositSigningRequest, AllowanceReader, DepositSigner, LedgerResult,
};
use smartnode_primitives::{
    deposit::{withdrawal_credentials, DepositMessage, ValidatorPubkey, PRELAUNCH_DEPOSIT_GWEI},
    token::TokenKind,
    types::{Address, TxRequest},
    units::ETHER,
    U256,
};
use smartnode_tx_engine::{
    eligibility::Eligibility,
    gas::CostGate,
    impl_eligibility,
    pipeline::{execute_direct, GatedAction, PipelineOutcome, SequencedPipeline, Spend},
    tx_driver::TxDriver,
    TxResult,
};

use tracing::{info, warn};

use crate::{
    client::{NodeDepositArgs, ProtocolClient},
    contracts::names,
};

/// Dry-run of [`StakeGgp`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CanStakeGgp {
    /// The account holds less GGP than the amount.
    pub insufficient_balance: bool,

    /// The network price is not in consensus.
    pub not_in_consensus: bool,
}

impl_eligibility!(CanStakeGgp {
    insufficient_balance,
    not_in_consensus
});

/// Dry-run of [`SwapGgp`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CanSwapGgp {
    /// The account holds less legacy GGP than the amount.
    pub insufficient_balance: bool,
}

impl_eligibility!(CanSwapGgp {
    insufficient_balance
});

/// Dry-run of [`JoinOdao`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CanJoinOdao {
    /// The invitation was never executed or is no longer actionable.
    pub proposal_expired: bool,

    /// The account is already a member.
    pub already_member: bool,

    /// The account holds less GGP than the bond.
    pub insufficient_balance: bool,
}

impl_eligibility!(CanJoinOdao {
    proposal_expired,
    already_member,
    insufficient_balance
});

/// Dry-run of [`WithdrawGgp`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CanWithdrawGgp {
    /// The account has less GGP staked than the amount.
    pub insufficient_balance: bool,

    /// The remaining stake would fall below the minimum for the account's minipools.
    pub minipools_undercollateralized: bool,

    /// The last stake is too recent to withdraw.
    pub withdrawal_delay_active: bool,

    /// The network price is not in consensus.
    pub not_in_consensus: bool,
}

impl_eligibility!(CanWithdrawGgp {
    insufficient_balance,
    minipools_undercollateralized,
    withdrawal_delay_active,
    not_in_consensus
});

/// Dry-run of [`CreateLot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CanCreateLot {
    /// The auction contract holds less GGP than a minimum lot.
    pub insufficient_remaining_balance: bool,

    /// Lot creation is turned off.
    pub create_lot_disabled: bool,
}

impl_eligibility!(CanCreateLot {
    insufficient_remaining_balance,
    create_lot_disabled
});

/// Dry-run of [`BidOnLot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CanBidOnLot {
    /// No lot with this index.
    pub does_not_exist: bool,

    /// The lot's bidding period is over.
    pub bidding_ended: bool,

    /// The lot has no GGP left.
    pub ggp_exhausted: bool,

    /// Bidding is turned off.
    pub bidding_disabled: bool,
}

impl_eligibility!(CanBidOnLot {
    does_not_exist,
    bidding_ended,
    ggp_exhausted,
    bidding_disabled
});

/// Dry-run of [`NodeDeposit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CanNodeDeposit {
    /// The account holds less ether than the deposit.
    pub insufficient_balance: bool,

    /// The account already runs as many minipools as its GGP stake allows.
    pub insufficient_ggp_stake: bool,

    /// Only trusted members may deposit nothing.
    pub invalid_amount: bool,

    /// The trusted member already runs the most unbonded validators allowed.
    pub unbonded_minipools_at_max: bool,

    /// Node deposits are turned off.
    pub deposit_disabled: bool,

    /// The network price is not in consensus.
    pub not_in_consensus: bool,
}

impl_eligibility!(CanNodeDeposit {
    insufficient_balance,
    insufficient_ggp_stake,
    invalid_amount,
    unbonded_minipools_at_max,
    deposit_disabled,
    not_in_consensus
});

/// Dry-run of [`RecoverGgpFromLot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CanRecoverGgpFromLot {
    /// No lot with this index.
    pub does_not_exist: bool,

    /// The lot's bidding period is still running.
    pub bidding_not_ended: bool,

    /// Every GGP in the lot was sold.
    pub no_unclaimed_ggp: bool,

    /// The unsold GGP was already returned.
    pub already_recovered: bool,
}

impl_eligibility!(CanRecoverGgpFromLot {
    does_not_exist,
    bidding_not_ended,
    no_unclaimed_ggp,
    already_recovered
});

/// Stakes GGP against the account's minipools.
#[derive(Debug)]
pub struct StakeGgp<'a> {
    client: &'a ProtocolClient,
    account: Address,
    amount: U256,
    request: TxRequest,
}

impl<'a> StakeGgp<'a> {
    /// Prepares a stake of `amount`.
    pub fn new(client: &'a ProtocolClient, account: Address, amount: U256) -> LedgerResult<Self> {
        Ok(Self {
            request: client.stake_ggp_tx(account, amount)?,
            client,
            account,
            amount,
        })
    }

    /// Allowance the staking contract needs.
    pub fn spend(&self) -> LedgerResult<Spend> {
        spend_of(self.client, TokenKind::Ggp, names::NODE_STAKING, self.amount)
    }
}

#[async_trait]
impl GatedAction for StakeGgp<'_> {
    type Check = CanStakeGgp;

    fn name(&self) -> &'static str {
        "stake_ggp"
    }

    async fn check(&self) -> TxResult<CanStakeGgp> {
        let (balance, in_consensus) = try_join!(
            self.client.token_balance(TokenKind::Ggp, self.account),
            self.client.in_consensus(),
        )?;

        Ok(CanStakeGgp {
            insufficient_balance: self.amount > balance,
            not_in_consensus: !in_consensus,
        })
    }

    fn request(&self) -> TxRequest {
        self.request.clone()
    }
}

/// Swaps legacy fixed-supply GGP for GGP.
#[derive(Debug)]
pub struct SwapGgp<'a> {
    client: &'a ProtocolClient,
    account: Address,
    amount: U256,
    request: TxRequest,
}

impl<'a> SwapGgp<'a> {
    /// Prepares a swap of `amount`.
    pub fn new(client: &'a ProtocolClient, account: Address, amount: U256) -> LedgerResult<Self> {
        Ok(Self {
            request: client.swap_ggp_tx(account, amount)?,
            client,
            account,
            amount,
        })
    }

    /// Allowance the GGP contract needs over the legacy token.
    pub fn spend(&self) -> LedgerResult<Spend> {
        spend_of(
            self.client,
            TokenKind::LegacyGgp,
            TokenKind::Ggp.contract_name(),
            self.amount,
        )
    }
}

#[async_trait]
impl GatedAction for SwapGgp<'_> {
    type Check = CanSwapGgp;

    fn name(&self) -> &'static str {
        "swap_ggp"
    }

    async fn check(&self) -> TxResult<CanSwapGgp> {
        let balance = self
            .client
            .token_balance(TokenKind::LegacyGgp, self.account)
            .await?;

        Ok(CanSwapGgp {
            insufficient_balance: self.amount > balance,
        })
    }

    fn request(&self) -> TxRequest {
        self.request.clone()
    }
}

/// Joins the trusted node DAO, bonding GGP.
#[derive(Debug)]
pub struct JoinOdao<'a> {
    client: &'a ProtocolClient,
    account: Address,
    request: TxRequest,
}

impl<'a> JoinOdao<'a> {
    /// Prepares the join.
    pub fn new(client: &'a ProtocolClient, account: Address) -> LedgerResult<Self> {
        Ok(Self {
            request: client.join_odao_tx(account)?,
            client,
            account,
        })
    }

    /// Allowance the DAO actions contract needs for the current bond.
    pub async fn spend(&self) -> LedgerResult<Spend> {
        let bond = self.client.ggp_bond().await?;
        spend_of(
            self.client,
            TokenKind::Ggp,
            names::DAO_NODE_TRUSTED_ACTIONS,
            bond,
        )
    }
}

#[async_trait]
impl GatedAction for JoinOdao<'_> {
    type Check = CanJoinOdao;

    fn name(&self) -> &'static str {
        "join_odao"
    }

    async fn check(&self) -> TxResult<CanJoinOdao> {
        let (executed, action_time, head, is_member, balance, bond) = try_join!(
            self.client.invite_executed_time(self.account),
            self.client.proposal_action_time(),
            self.client.head(),
            self.client.is_trusted_member(self.account),
            self.client.token_balance(TokenKind::Ggp, self.account),
            self.client.ggp_bond(),
        )?;

        let actionable =
            executed != 0 && head.timestamp < executed.saturating_add(action_time);

        Ok(CanJoinOdao {
            proposal_expired: !actionable,
            already_member: is_member,
            insufficient_balance: balance < bond,
        })
    }

    fn request(&self) -> TxRequest {
        self.request.clone()
    }
}

/// Withdraws staked GGP.
#[derive(Debug)]
pub struct WithdrawGgp<'a> {
    client: &'a ProtocolClient,
    account: Address,
    amount: U256,
    request: TxRequest,
}

impl<'a> WithdrawGgp<'a> {
    /// Prepares a withdrawal of `amount`.
    pub fn new(client: &'a ProtocolClient, account: Address, amount: U256) -> LedgerResult<Self> {
        Ok(Self {
            request: client.withdraw_ggp_tx(account, amount)?,
            client,
            account,
            amount,
        })
    }
}

#[async_trait]
impl GatedAction for WithdrawGgp<'_> {
    type Check = CanWithdrawGgp;

    fn name(&self) -> &'static str {
        "withdraw_ggp"
    }

    async fn check(&self) -> TxResult<CanWithdrawGgp> {
        let (stake, minimum, head, staked_time, delay, in_consensus) = try_join!(
            self.client.node_ggp_stake(self.account),
            self.client.node_minimum_ggp_stake(self.account),
            self.client.head(),
            self.client.node_ggp_staked_time(self.account),
            self.client.rewards_claim_interval(),
            self.client.in_consensus(),
        )?;

        Ok(CanWithdrawGgp {
            insufficient_balance: self.amount > stake,
            minipools_undercollateralized: stake
                .checked_sub(self.amount)
                .map_or(true, |remaining| remaining < minimum),
            withdrawal_delay_active: head.timestamp.saturating_sub(staked_time) < delay,
            not_in_consensus: !in_consensus,
        })
    }

    fn request(&self) -> TxRequest {
        self.request.clone()
    }
}

/// Creates a new auction lot from the protocol's slashed GGP.
#[derive(Debug)]
pub struct CreateLot<'a> {
    client: &'a ProtocolClient,
    request: TxRequest,
}

impl<'a> CreateLot<'a> {
    /// Prepares lot creation.
    pub fn new(client: &'a ProtocolClient, account: Address) -> LedgerResult<Self> {
        Ok(Self {
            request: client.create_lot_tx(account)?,
            client,
        })
    }
}

#[async_trait]
impl GatedAction for CreateLot<'_> {
    type Check = CanCreateLot;

    fn name(&self) -> &'static str {
        "create_lot"
    }

    async fn check(&self) -> TxResult<CanCreateLot> {
        let (remaining, lot_minimum_eth, price, enabled) = try_join!(
            self.client.auction_remaining_ggp(),
            self.client.lot_minimum_eth_value(),
            self.client.ggp_price(),
            self.client.create_lot_enabled(),
        )?;

        // without a price the minimum lot size is unbounded
        let lot_minimum_ggp = lot_minimum_eth
            .checked_mul(ETHER)
            .and_then(|v| v.checked_div(price));

        Ok(CanCreateLot {
            insufficient_remaining_balance: lot_minimum_ggp.map_or(true, |min| remaining < min),
            create_lot_disabled: !enabled,
        })
    }

    fn request(&self) -> TxRequest {
        self.request.clone()
    }
}

/// Bids ether on an auction lot.
#[derive(Debug)]
pub struct BidOnLot<'a> {
    client: &'a ProtocolClient,
    lot: u64,
    request: TxRequest,
}

impl<'a> BidOnLot<'a> {
    /// Prepares a bid of `value` wei on `lot`.
    pub fn new(
        client: &'a ProtocolClient,
        account: Address,
        lot: u64,
        value: U256,
    ) -> LedgerResult<Self> {
        Ok(Self {
            request: client.place_bid_tx(account, lot, value)?,
            client,
            lot,
        })
    }
}

#[async_trait]
impl GatedAction for BidOnLot<'_> {
    type Check = CanBidOnLot;

    fn name(&self) -> &'static str {
        "bid_on_lot"
    }

    async fn check(&self) -> TxResult<CanBidOnLot> {
        let (exists, end_block, head, remaining, enabled) = try_join!(
            self.client.lot_exists(self.lot),
            self.client.lot_end_block(self.lot),
            self.client.head(),
            self.client.lot_remaining_ggp(self.lot),
            self.client.bid_on_lot_enabled(),
        )?;

        Ok(CanBidOnLot {
            does_not_exist: !exists,
            bidding_ended: head.number >= end_block,
            ggp_exhausted: remaining == U256::ZERO,
            bidding_disabled: !enabled,
        })
    }

    fn request(&self) -> TxRequest {
        self.request.clone()
    }
}

/// A node deposit as the operator asks for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeDepositRequest {
    /// Ether the node puts in, in wei. Zero is only allowed for trusted members.
    pub amount: U256,

    /// Lowest commission rate the node accepts, as an 18-decimal fraction.
    pub min_node_fee: U256,

    /// Key of the validator the new minipool will run.
    pub pubkey: ValidatorPubkey,
}

async fn check_node_deposit(
    client: &ProtocolClient,
    account: Address,
    amount: U256,
) -> TxResult<CanNodeDeposit> {
    let (balance, count, limit, trusted, enabled, in_consensus) = try_join!(
        client.native_balance(account),
        client.node_minipool_count(account),
        client.node_minipool_limit(account),
        client.is_trusted_member(account),
        client.node_deposit_enabled(),
        client.in_consensus(),
    )?;

    let unbonded = trusted && amount.is_zero();
    let unbonded_minipools_at_max = if unbonded {
        let (running, max) = try_join!(
            client.member_unbonded_validator_count(account),
            client.minipool_unbonded_max(),
        )?;
        running >= max
    } else {
        false
    };

    Ok(CanNodeDeposit {
        insufficient_balance: amount > balance,
        insufficient_ggp_stake: U256::from(count) >= limit,
        invalid_amount: !trusted && amount.is_zero(),
        unbonded_minipools_at_max,
        deposit_disabled: !enabled,
        not_in_consensus: !in_consensus,
    })
}

/// Creates a minipool, attaching the node's ether and the validator's prelaunch deposit.
#[derive(Debug)]
pub struct NodeDeposit<'a> {
    client: &'a ProtocolClient,
    account: Address,
    args: NodeDepositArgs,
    request: TxRequest,
}

impl<'a> NodeDeposit<'a> {
    /// Derives the minipool address and signs its prelaunch deposit.
    ///
    /// The salt is the account's next nonce, so two deposits never share a minipool address.
    pub async fn prepare(
        client: &'a ProtocolClient,
        account: Address,
        deposit: &NodeDepositRequest,
        signer: &dyn DepositSigner,
        genesis_fork_version: [u8; 4],
    ) -> TxResult<Self> {
        let (nonce, deposit_type) = try_join!(
            client.ledger().transaction_count(account),
            client.deposit_type(deposit.amount),
        )?;
        let salt = U256::from(nonce);
        let expected_minipool = client
            .expected_minipool_address(account, deposit_type, salt)
            .await?;

        let message = DepositMessage {
            pubkey: deposit.pubkey,
            withdrawal_credentials: withdrawal_credentials(expected_minipool),
            amount_gwei: PRELAUNCH_DEPOSIT_GWEI,
        };
        let signature = signer
            .sign_deposit(&DepositSigningRequest::new(message, genesis_fork_version))
            .await?;

        let args = NodeDepositArgs {
            amount: deposit.amount,
            min_node_fee: deposit.min_node_fee,
            deposit: message.with_signature(signature),
            salt,
            expected_minipool,
        };
        info!(minipool = %expected_minipool, pubkey = %deposit.pubkey, %deposit_type, "prepared node deposit");

        Ok(Self {
            request: client.node_deposit_tx(account, &args)?,
            client,
            account,
            args,
        })
    }

    /// Address the minipool will be deployed at.
    pub fn expected_minipool(&self) -> Address {
        self.args.expected_minipool
    }
}

#[async_trait]
impl GatedAction for NodeDeposit<'_> {
    type Check = CanNodeDeposit;

    fn name(&self) -> &'static str {
        "node_deposit"
    }

    async fn check(&self) -> TxResult<CanNodeDeposit> {
        check_node_deposit(self.client, self.account, self.args.amount).await
    }

    fn request(&self) -> TxRequest {
        self.request.clone()
    }
}

/// Returns the unsold GGP of a finished lot to the auction.
#[derive(Debug)]
pub struct RecoverGgpFromLot<'a> {
    client: &'a ProtocolClient,
    lot: u64,
    request: TxRequest,
}

impl<'a> RecoverGgpFromLot<'a> {
    /// Prepares recovery from `lot`.
    pub fn new(client: &'a ProtocolClient, account: Address, lot: u64) -> LedgerResult<Self> {
        Ok(Self {
            request: client.recover_lot_tx(account, lot)?,
            client,
            lot,
        })
    }
}

#[async_trait]
impl GatedAction for RecoverGgpFromLot<'_> {
    type Check = CanRecoverGgpFromLot;

    fn name(&self) -> &'static str {
        "recover_ggp_from_lot"
    }

    async fn check(&self) -> TxResult<CanRecoverGgpFromLot> {
        let (exists, end_block, head, remaining, recovered) = try_join!(
            self.client.lot_exists(self.lot),
            self.client.lot_end_block(self.lot),
            self.client.head(),
            self.client.lot_remaining_ggp(self.lot),
            self.client.lot_ggp_recovered(self.lot),
        )?;

        Ok(CanRecoverGgpFromLot {
            does_not_exist: !exists,
            bidding_not_ended: head.number < end_block,
            no_unclaimed_ggp: remaining.is_zero(),
            already_recovered: recovered,
        })
    }

    fn request(&self) -> TxRequest {
        self.request.clone()
    }
}

fn spend_of(
    client: &ProtocolClient,
    token: TokenKind,
    spender: &str,
    amount: U256,
) -> LedgerResult<Spend> {
    let registry = client.registry();
    Ok(Spend {
        token,
        token_address: registry.get(token.contract_name())?,
        spender: registry.get(spender)?,
        amount,
    })
}

/// The operator actions of one account.
///
/// Operator-initiated actions are never gated on cost: the operator asked for them.
#[derive(Debug)]
pub struct NodeOperations<'a> {
    client: &'a ProtocolClient,
    driver: &'a TxDriver,
    allowances: &'a dyn AllowanceReader,
    account: Address,
}

impl<'a> NodeOperations<'a> {
    /// Creates the operations for `account`.
    pub fn new(
        client: &'a ProtocolClient,
        driver: &'a TxDriver,
        allowances: &'a dyn AllowanceReader,
        account: Address,
    ) -> Self {
        Self {
            client,
            driver,
            allowances,
            account,
        }
    }

    fn pipeline(&self) -> SequencedPipeline<'a> {
        SequencedPipeline::new(self.driver, self.allowances, self.account)
    }

    /// Whether `amount` GGP can be staked.
    pub async fn can_stake_ggp(&self, amount: U256) -> TxResult<CanStakeGgp> {
        StakeGgp::new(self.client, self.account, amount)?.check().await
    }

    /// Approves the staking contract if needed and stakes `amount` GGP.
    pub async fn stake_ggp(&self, amount: U256) -> TxResult<PipelineOutcome<CanStakeGgp>> {
        let action = StakeGgp::new(self.client, self.account, amount)?;
        let spend = action.spend()?;
        self.pipeline()
            .execute(&spend, &action, CostGate::Unchecked)
            .await
    }

    /// Whether `amount` legacy GGP can be swapped.
    pub async fn can_swap_ggp(&self, amount: U256) -> TxResult<CanSwapGgp> {
        SwapGgp::new(self.client, self.account, amount)?.check().await
    }

    /// Approves the GGP contract if needed and swaps `amount` legacy GGP.
    pub async fn swap_ggp(&self, amount: U256) -> TxResult<PipelineOutcome<CanSwapGgp>> {
        let action = SwapGgp::new(self.client, self.account, amount)?;
        let spend = action.spend()?;
        self.pipeline()
            .execute(&spend, &action, CostGate::Unchecked)
            .await
    }

    /// Whether the account can join the trusted node DAO.
    pub async fn can_join_odao(&self) -> TxResult<CanJoinOdao> {
        JoinOdao::new(self.client, self.account)?.check().await
    }

    /// Approves the bond if needed and joins the trusted node DAO.
    pub async fn join_odao(&self) -> TxResult<PipelineOutcome<CanJoinOdao>> {
        let action = JoinOdao::new(self.client, self.account)?;
        let spend = action.spend().await?;
        self.pipeline()
            .execute(&spend, &action, CostGate::Unchecked)
            .await
    }

    /// Whether `amount` staked GGP can be withdrawn.
    pub async fn can_withdraw_ggp(&self, amount: U256) -> TxResult<CanWithdrawGgp> {
        WithdrawGgp::new(self.client, self.account, amount)?
            .check()
            .await
    }

    /// Withdraws `amount` staked GGP.
    pub async fn withdraw_ggp(&self, amount: U256) -> TxResult<PipelineOutcome<CanWithdrawGgp>> {
        let action = WithdrawGgp::new(self.client, self.account, amount)?;
        execute_direct(self.driver, &action, CostGate::Unchecked).await
    }

    /// Whether a lot can be created.
    pub async fn can_create_lot(&self) -> TxResult<CanCreateLot> {
        CreateLot::new(self.client, self.account)?.check().await
    }

    /// Creates a lot.
    pub async fn create_lot(&self) -> TxResult<PipelineOutcome<CanCreateLot>> {
        let action = CreateLot::new(self.client, self.account)?;
        execute_direct(self.driver, &action, CostGate::Unchecked).await
    }

    /// Whether `lot` can be bid on.
    pub async fn can_bid_on_lot(&self, lot: u64) -> TxResult<CanBidOnLot> {
        BidOnLot::new(self.client, self.account, lot, U256::ZERO)?
            .check()
            .await
    }

    /// Bids `value` wei on `lot`.
    pub async fn bid_on_lot(
        &self,
        lot: u64,
        value: U256,
    ) -> TxResult<PipelineOutcome<CanBidOnLot>> {
        let action = BidOnLot::new(self.client, self.account, lot, value)?;
        execute_direct(self.driver, &action, CostGate::Unchecked).await
    }

    /// Whether a node deposit of `amount` wei would be accepted.
    pub async fn can_node_deposit(&self, amount: U256) -> TxResult<CanNodeDeposit> {
        check_node_deposit(self.client, self.account, amount).await
    }

    /// Creates a minipool for `deposit`, signing its prelaunch deposit with `signer`.
    ///
    /// Nothing is signed when the dry-run already refuses the deposit.
    pub async fn node_deposit(
        &self,
        deposit: &NodeDepositRequest,
        signer: &dyn DepositSigner,
        genesis_fork_version: [u8; 4],
    ) -> TxResult<PipelineOutcome<CanNodeDeposit>> {
        let check = self.can_node_deposit(deposit.amount).await?;
        if !check.is_eligible() {
            warn!(action = "node_deposit", reasons = ?check.reasons(), "action not permitted");
            return Ok(PipelineOutcome::Ineligible {
                check,
                approval: None,
            });
        }

        let action = NodeDeposit::prepare(
            self.client,
            self.account,
            deposit,
            signer,
            genesis_fork_version,
        )
        .await?;
        execute_direct(self.driver, &action, CostGate::Unchecked).await
    }

    /// Whether the unsold GGP of `lot` can be recovered.
    pub async fn can_recover_ggp_from_lot(&self, lot: u64) -> TxResult<CanRecoverGgpFromLot> {
        RecoverGgpFromLot::new(self.client, self.account, lot)?
            .check()
            .await
    }

    /// Returns the unsold GGP of `lot` to the auction.
    pub async fn recover_ggp_from_lot(
        &self,
        lot: u64,
    ) -> TxResult<PipelineOutcome<CanRecoverGgpFromLot>> {
        let action = RecoverGgpFromLot::new(self.client, self.account, lot)?;
        execute_direct(self.driver, &action, CostGate::Unchecked).await
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use alloy::sol_types::{SolCall, SolValue};
    use smartnode_ledger::{
        inmemory::{DeterministicSigner, InMemoryLedger},
        storage::TokenAllowances,
    };
    use smartnode_params::gas::GasParams;
    use smartnode_primitives::bindings::{
        IRocketAuctionManager, IRocketDAONodeTrusted, IRocketDAONodeTrustedSettingsMembers,
        IRocketDAONodeTrustedSettingsProposals, IRocketDAOProtocolSettingsAuction,
        IRocketDAOProtocolSettingsNode, IRocketDAOProtocolSettingsRewards,
        IRocketMinipoolFactory, IRocketMinipoolManager, IRocketNetworkPrices, IRocketNodeDeposit,
        IRocketNodeStaking, IERC20,
    };
    use smartnode_test_utils::prelude::*;
    use smartnode_tx_engine::{
        gas::{GasConfig, GasPolicy},
        nonce::NonceManager,
        pipeline::MAX_APPROVAL,
    };
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::contracts::{ContractRegistry, ALL_CONTRACTS};

    const FORK: [u8; 4] = [0, 0, 0, 1];

    struct Fixture {
        ledger: Arc<InMemoryLedger>,
        client: ProtocolClient,
        driver: TxDriver,
        allowances: TokenAllowances,
        account: Address,
    }

    impl Fixture {
        fn new() -> Self {
            let ledger = Arc::new(InMemoryLedger::new(1_000));
            let registry = Arc::new(ContractRegistry::from_addresses(
                random_address(),
                ALL_CONTRACTS.map(|name| (name, random_address())),
            ));
            let client = ProtocolClient::new(ledger.clone(), registry.clone(), random_address());
            let policy = GasPolicy::new(
                &GasConfig {
                    max_fee_gwei: Some(5.0),
                    ..Default::default()
                },
                GasParams::default(),
            )
            .expect("valid config");
            let driver = TxDriver::new(
                ledger.clone(),
                policy,
                Arc::new(NonceManager::new(None)),
                Duration::from_millis(1),
                CancellationToken::new(),
            );
            let allowances = TokenAllowances::new(ledger.clone(), registry.token_addresses());

            Self {
                ledger,
                client,
                driver,
                allowances,
                account: random_address(),
            }
        }

        fn ops(&self) -> NodeOperations<'_> {
            NodeOperations::new(&self.client, &self.driver, &self.allowances, self.account)
        }

        fn at(&self, name: &str) -> Address {
            self.client.registry().get(name).unwrap()
        }

        fn script<C: SolCall, T: SolValue>(&self, contract: &str, call: C, ret: T) {
            script_call(&self.ledger, self.at(contract), &call, ret);
        }

        fn in_consensus(&self) {
            self.script(names::NETWORK_PRICES, IRocketNetworkPrices::inConsensusCall {}, true);
        }
    }

    fn ggp(n: u64) -> U256 {
        U256::from(n) * ETHER
    }

    #[tokio::test]
    async fn dry_run_and_action_report_the_same_reasons() {
        let f = Fixture::new();
        f.script(
            TokenKind::Ggp.contract_name(),
            IERC20::balanceOfCall { owner: f.account },
            ggp(5),
        );

        let dry = f.ops().can_stake_ggp(ggp(10)).await.unwrap();
        assert_eq!(
            dry,
            CanStakeGgp {
                insufficient_balance: true,
                not_in_consensus: true,
            }
        );
        assert_eq!(dry.reasons(), vec!["insufficient_balance", "not_in_consensus"]);

        f.ledger.clear_journal();
        let outcome = f.ops().stake_ggp(ggp(10)).await.unwrap();
        let PipelineOutcome::Ineligible { check, .. } = outcome else {
            panic!("expected refusal");
        };
        assert_eq!(check, dry);
        assert!(!f
            .ledger
            .journal()
            .iter()
            .any(|op| op.is_send_of(IRocketNodeStaking::stakeGGPCall::SELECTOR)));
    }

    #[tokio::test]
    async fn stake_approves_then_stakes() {
        let f = Fixture::new();
        let token = f.at(TokenKind::Ggp.contract_name());
        let staking = f.at(names::NODE_STAKING);
        f.script(
            TokenKind::Ggp.contract_name(),
            IERC20::balanceOfCall { owner: f.account },
            ggp(100),
        );
        f.in_consensus();
        script_effect::<IERC20::approveCall>(
            &f.ledger,
            token,
            &CallScript::new(
                token,
                &IERC20::allowanceCall {
                    owner: f.account,
                    spender: staking,
                },
                MAX_APPROVAL,
            ),
        );

        let outcome = f.ops().stake_ggp(ggp(50)).await.unwrap();
        assert!(matches!(
            outcome,
            PipelineOutcome::Completed {
                approval: Some(_),
                ..
            }
        ));

        let sent = f.ledger.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].request.to, token);
        assert_eq!(sent[1].request.to, staking);

        // a second stake finds the allowance in place
        f.ledger.clear_journal();
        let outcome = f.ops().stake_ggp(ggp(10)).await.unwrap();
        assert!(matches!(
            outcome,
            PipelineOutcome::Completed { approval: None, .. }
        ));
        assert_eq!(f.ledger.sent().len(), 1);
    }

    #[tokio::test]
    async fn withdraw_checks_collateral_and_delay() {
        let f = Fixture::new();
        let node = f.account;
        f.script(
            names::NODE_STAKING,
            IRocketNodeStaking::getNodeGGPStakeCall { node },
            ggp(100),
        );
        f.script(
            names::NODE_STAKING,
            IRocketNodeStaking::getNodeMinimumGGPStakeCall { node },
            ggp(80),
        );
        // head timestamp is 12_000 for block 1_000
        f.script(
            names::NODE_STAKING,
            IRocketNodeStaking::getNodeGGPStakedTimeCall { node },
            U256::from(11_000),
        );
        f.script(
            names::DAO_PROTOCOL_SETTINGS_REWARDS,
            IRocketDAOProtocolSettingsRewards::getRewardsClaimIntervalTimeCall {},
            U256::from(3_600),
        );
        f.in_consensus();

        let check = f.ops().can_withdraw_ggp(ggp(30)).await.unwrap();
        assert_eq!(
            check,
            CanWithdrawGgp {
                insufficient_balance: false,
                minipools_undercollateralized: true,
                withdrawal_delay_active: true,
                not_in_consensus: false,
            }
        );

        let check = f.ops().can_withdraw_ggp(ggp(200)).await.unwrap();
        assert!(check.insufficient_balance);
        assert!(check.minipools_undercollateralized);

        let outcome = f.ops().withdraw_ggp(ggp(30)).await.unwrap();
        assert!(matches!(outcome, PipelineOutcome::Ineligible { .. }));
        assert!(f.ledger.sent().is_empty());
    }

    #[tokio::test]
    async fn join_requires_a_live_invitation() {
        let f = Fixture::new();
        f.script(
            names::DAO_NODE_TRUSTED_SETTINGS_PROPOSALS,
            IRocketDAONodeTrustedSettingsProposals::getActionTimeCall {},
            U256::from(1_000),
        );

        let check = f.ops().can_join_odao().await.unwrap();
        assert!(check.proposal_expired);
        assert!(!check.already_member);
        assert!(!check.insufficient_balance);

        f.script(
            names::DAO_NODE_TRUSTED,
            IRocketDAONodeTrusted::getMemberProposalExecutedTimeCall {
                proposalType: "invited".to_owned(),
                node: f.account,
            },
            U256::from(11_500),
        );
        f.script(
            names::DAO_NODE_TRUSTED_SETTINGS_MEMBERS,
            IRocketDAONodeTrustedSettingsMembers::getGGPBondCall {},
            ggp(1),
        );

        let check = f.ops().can_join_odao().await.unwrap();
        assert!(!check.proposal_expired);
        assert!(check.insufficient_balance);
    }

    #[tokio::test]
    async fn create_lot_without_price_is_refused() {
        let f = Fixture::new();
        f.script(
            names::AUCTION_MANAGER,
            IRocketAuctionManager::getRemainingGGPBalanceCall {},
            ggp(1_000),
        );
        f.script(
            names::DAO_PROTOCOL_SETTINGS_AUCTION,
            IRocketDAOProtocolSettingsAuction::getCreateLotEnabledCall {},
            true,
        );
        f.script(
            names::DAO_PROTOCOL_SETTINGS_AUCTION,
            IRocketDAOProtocolSettingsAuction::getLotMinimumEthValueCall {},
            ggp(1),
        );

        let check = f.ops().can_create_lot().await.unwrap();
        assert!(check.insufficient_remaining_balance);
        assert!(!check.create_lot_disabled);

        // 0.01 ether per GGP: a 1 ether lot needs 100 GGP
        f.script(
            names::NETWORK_PRICES,
            IRocketNetworkPrices::getGGPPriceCall {},
            ETHER / U256::from(100),
        );
        let check = f.ops().can_create_lot().await.unwrap();
        assert!(check.is_eligible());

        let outcome = f.ops().create_lot().await.unwrap();
        assert!(matches!(
            outcome,
            PipelineOutcome::Completed { approval: None, .. }
        ));
    }

    fn script_lot(f: &Fixture, lot: u64, end_block: u64, remaining: U256) {
        let lot = U256::from(lot);
        f.script(
            names::AUCTION_MANAGER,
            IRocketAuctionManager::getLotExistsCall { lot },
            true,
        );
        f.script(
            names::AUCTION_MANAGER,
            IRocketAuctionManager::getLotEndBlockCall { lot },
            U256::from(end_block),
        );
        f.script(
            names::AUCTION_MANAGER,
            IRocketAuctionManager::getLotRemainingGGPAmountCall { lot },
            remaining,
        );
    }

    #[tokio::test]
    async fn bid_carries_value_and_checks_lot_state() {
        let f = Fixture::new();
        script_lot(&f, 3, 2_000, ggp(10));
        f.script(
            names::DAO_PROTOCOL_SETTINGS_AUCTION,
            IRocketDAOProtocolSettingsAuction::getBidOnLotEnabledCall {},
            true,
        );

        let outcome = f.ops().bid_on_lot(3, ETHER).await.unwrap();
        assert!(matches!(outcome, PipelineOutcome::Completed { .. }));
        assert_eq!(f.ledger.sent()[0].request.value, ETHER);

        f.ledger.set_head(2_000);
        let check = f.ops().can_bid_on_lot(3).await.unwrap();
        assert_eq!(check.reasons(), vec!["bidding_ended"]);
    }

    #[tokio::test]
    async fn recovery_waits_for_the_lot_to_end() {
        let f = Fixture::new();
        script_lot(&f, 4, 1_500, ggp(10));

        let check = f.ops().can_recover_ggp_from_lot(4).await.unwrap();
        assert_eq!(check.reasons(), vec!["bidding_not_ended"]);

        let outcome = f.ops().recover_ggp_from_lot(4).await.unwrap();
        assert!(matches!(outcome, PipelineOutcome::Ineligible { .. }));
        assert!(f.ledger.sent().is_empty());

        f.ledger.set_head(1_500);
        let outcome = f.ops().recover_ggp_from_lot(4).await.unwrap();
        assert!(matches!(outcome, PipelineOutcome::Completed { .. }));
        let sent = f.ledger.sent();
        assert_eq!(sent.len(), 1);
        let call =
            IRocketAuctionManager::recoverUnclaimedGGPCall::abi_decode(&sent[0].request.data, true)
                .unwrap();
        assert_eq!(call.lot, U256::from(4));
    }

    #[tokio::test]
    async fn recovery_refuses_sold_out_or_recovered_lots() {
        let f = Fixture::new();
        f.ledger.set_head(5_000);

        let check = f.ops().can_recover_ggp_from_lot(9).await.unwrap();
        assert!(check.does_not_exist);
        assert!(check.no_unclaimed_ggp);

        script_lot(&f, 9, 1_500, ggp(1));
        f.script(
            names::AUCTION_MANAGER,
            IRocketAuctionManager::getLotGGPRecoveredCall { lot: U256::from(9) },
            true,
        );
        let check = f.ops().can_recover_ggp_from_lot(9).await.unwrap();
        assert_eq!(check.reasons(), vec!["already_recovered"]);
    }

    fn deposit_ready(f: &Fixture, amount: U256) {
        f.ledger.set_native_balance(f.account, amount);
        f.script(
            names::NODE_STAKING,
            IRocketNodeStaking::getNodeMinipoolLimitCall { node: f.account },
            U256::from(2),
        );
        f.script(
            names::DAO_PROTOCOL_SETTINGS_NODE,
            IRocketDAOProtocolSettingsNode::getDepositEnabledCall {},
            true,
        );
        f.in_consensus();
    }

    #[tokio::test]
    async fn node_deposit_dry_run_reports_every_reason() {
        let f = Fixture::new();
        f.script(
            names::MINIPOOL_MANAGER,
            IRocketMinipoolManager::getNodeMinipoolCountCall { node: f.account },
            U256::from(3),
        );

        let check = f.ops().can_node_deposit(U256::ZERO).await.unwrap();
        assert_eq!(
            check,
            CanNodeDeposit {
                insufficient_balance: false,
                insufficient_ggp_stake: true,
                invalid_amount: true,
                unbonded_minipools_at_max: false,
                deposit_disabled: true,
                not_in_consensus: true,
            }
        );

        let check = f.ops().can_node_deposit(ggp(16)).await.unwrap();
        assert!(check.insufficient_balance);
        assert!(!check.invalid_amount);
    }

    #[tokio::test]
    async fn trusted_members_deposit_nothing_until_the_unbonded_cap() {
        let f = Fixture::new();
        deposit_ready(&f, U256::ZERO);
        f.script(
            names::DAO_NODE_TRUSTED,
            IRocketDAONodeTrusted::getMemberIsValidCall { node: f.account },
            true,
        );
        f.script(
            names::DAO_NODE_TRUSTED_SETTINGS_MEMBERS,
            IRocketDAONodeTrustedSettingsMembers::getMinipoolUnbondedMaxCall {},
            U256::from(1),
        );

        let check = f.ops().can_node_deposit(U256::ZERO).await.unwrap();
        assert!(check.is_eligible());

        f.script(
            names::DAO_NODE_TRUSTED,
            IRocketDAONodeTrusted::getMemberUnbondedValidatorCountCall { node: f.account },
            U256::from(1),
        );
        let check = f.ops().can_node_deposit(U256::ZERO).await.unwrap();
        assert_eq!(check.reasons(), vec!["unbonded_minipools_at_max"]);
    }

    #[tokio::test]
    async fn node_deposit_signs_for_the_expected_minipool() {
        let f = Fixture::new();
        let amount = ggp(16);
        let minipool = random_address();
        deposit_ready(&f, amount);
        f.ledger.set_transaction_count(f.account, 7);
        f.script(
            names::NODE_DEPOSIT,
            IRocketNodeDeposit::getDepositTypeCall { amount },
            2u16,
        );
        f.script(
            names::MINIPOOL_FACTORY,
            IRocketMinipoolFactory::getExpectedAddressCall {
                node: f.account,
                depositType: 2,
                salt: U256::from(7),
            },
            minipool,
        );

        let signer = DeterministicSigner::default();
        let request = NodeDepositRequest {
            amount,
            min_node_fee: ETHER / U256::from(10),
            pubkey: ValidatorPubkey::repeat_byte(5),
        };
        let outcome = f.ops().node_deposit(&request, &signer, FORK).await.unwrap();
        assert!(matches!(outcome, PipelineOutcome::Completed { .. }));

        let sent = f.ledger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].request.to, f.at(names::NODE_DEPOSIT));
        assert_eq!(sent[0].request.value, amount);

        let call = IRocketNodeDeposit::depositCall::abi_decode(&sent[0].request.data, true).unwrap();
        assert_eq!(call.expectedMinipoolAddress, minipool);
        assert_eq!(call.salt, U256::from(7));
        assert_eq!(call.validatorPubkey.as_ref(), request.pubkey.as_slice());

        let message = DepositMessage {
            pubkey: request.pubkey,
            withdrawal_credentials: withdrawal_credentials(minipool),
            amount_gwei: PRELAUNCH_DEPOSIT_GWEI,
        };
        assert_eq!(signer.signed_roots(), vec![message.signing_root(FORK)]);
        assert_eq!(
            call.depositDataRoot,
            message
                .with_signature(DeterministicSigner::signature_for(message.signing_root(FORK)))
                .hash_tree_root()
        );
    }

    #[tokio::test]
    async fn refused_deposit_signs_nothing() {
        let f = Fixture::new();
        let signer = DeterministicSigner::default();
        let request = NodeDepositRequest {
            amount: ggp(16),
            min_node_fee: U256::ZERO,
            pubkey: ValidatorPubkey::repeat_byte(5),
        };

        let outcome = f.ops().node_deposit(&request, &signer, FORK).await.unwrap();
        let PipelineOutcome::Ineligible { check, .. } = outcome else {
            panic!("expected refusal");
        };
        assert!(check.deposit_disabled);
        assert!(signer.signed_roots().is_empty());
        assert!(f.ledger.sent().is_empty());
    }

    #[test]
    fn dry_run_serializes_with_flag_names() {
        let check = CanBidOnLot {
            bidding_ended: true,
            ..Default::default()
        };
        let json = serde_json::to_value(check).unwrap();
        assert_eq!(json["bidding_ended"], true);
        assert_eq!(json["does_not_exist"], false);
    }
}
