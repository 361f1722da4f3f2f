//! The two-phase "approve an allowance, then act" transaction flow.
//!
//! 1. Read the current allowance of the spender.
//! 2. If it is short, approve the maximal amount and wait for inclusion, then read the allowance
//!    again. If it is still short the action is not attempted.
//! 3. Re-check the action through its dry-run, returning structured reasons if it is refused.
//! 4. Send the action and wait for inclusion.
//!
//! If the process dies between 2 and 4 the approval stays on the ledger; the next run reads it
//! in step 1 and goes straight to the action.

use alloy::sol_types::SolCall;
use async_trait::async_trait;
use smartnode_ledger::AllowanceReader;
use smartnode_primitives::{
    bindings::IERC20,
    token::TokenKind,
    types::{Address, Receipt, TxRequest},
    U256,
};
use tracing::{debug, info, warn};

use crate::{
    eligibility::Eligibility,
    errors::TxResult,
    gas::{CostGate, SkipReason},
    tx_driver::{DriveOutcome, TxDriver},
};

/// Allowance amount used for approvals so the spender never needs approving again.
pub const MAX_APPROVAL: U256 = U256::MAX;

/// Tokens the action will pull from the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spend {
    /// Token being spent.
    pub token: TokenKind,

    /// Address of the token contract.
    pub token_address: Address,

    /// Contract that pulls the tokens.
    pub spender: Address,

    /// Amount the action needs approved.
    pub amount: U256,
}

impl Spend {
    /// Transaction approving the maximal amount for the spender.
    pub fn approval_request(&self, owner: Address) -> TxRequest {
        TxRequest::call(
            owner,
            self.token_address,
            &IERC20::approveCall {
                spender: self.spender,
                amount: MAX_APPROVAL,
            },
        )
    }

    /// Selector of [`Spend::approval_request`] calls.
    pub const fn approval_selector() -> [u8; 4] {
        IERC20::approveCall::SELECTOR
    }
}

/// An action that can be dry-run and then performed.
#[async_trait]
pub trait GatedAction: Send + Sync {
    /// Structured result of the dry-run.
    type Check: Eligibility + Send;

    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Reads the ledger and reports whether the action may be performed.
    async fn check(&self) -> TxResult<Self::Check>;

    /// The transaction that performs the action.
    fn request(&self) -> TxRequest;
}

/// Step of the pipeline a decision was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Approving the allowance.
    Approval,

    /// Performing the action.
    Action,
}

/// How a pipeline run ended, short of an error.
#[derive(Debug)]
pub enum PipelineOutcome<C> {
    /// The action was included.
    Completed {
        /// Receipt of the approval, if one was needed.
        approval: Option<Receipt>,

        /// Receipt of the action.
        action: Receipt,
    },

    /// The gas policy declined a transaction.
    Declined {
        /// Step that was declined.
        phase: Phase,

        /// Why it was declined.
        reason: SkipReason,

        /// Receipt of the approval, if it went through before the action was declined.
        approval: Option<Receipt>,
    },

    /// The action is not permitted right now.
    Ineligible {
        /// The refusal reasons.
        check: C,

        /// Receipt of the approval, if it went through before the check.
        approval: Option<Receipt>,
    },

    /// The approval was included but the allowance read back afterwards is still short.
    InsufficientAllowance {
        /// Allowance read after the approval.
        allowance: U256,

        /// Receipt of the approval.
        approval: Receipt,
    },
}

/// Runs [`GatedAction`]s behind an allowance approval.
#[derive(Debug)]
pub struct SequencedPipeline<'a> {
    driver: &'a TxDriver,
    allowances: &'a dyn AllowanceReader,
    owner: Address,
}

impl<'a> SequencedPipeline<'a> {
    /// Creates a pipeline sending from `owner`.
    pub fn new(driver: &'a TxDriver, allowances: &'a dyn AllowanceReader, owner: Address) -> Self {
        Self {
            driver,
            allowances,
            owner,
        }
    }

    /// Ensures `spend` is approved, then performs `action`.
    pub async fn execute<A: GatedAction>(
        &self,
        spend: &Spend,
        action: &A,
        gate: CostGate,
    ) -> TxResult<PipelineOutcome<A::Check>> {
        let allowance = self
            .allowances
            .allowance(spend.token, self.owner, spend.spender)
            .await?;

        let approval = if allowance < spend.amount {
            info!(
                action = action.name(),
                token = %spend.token,
                spender = %spend.spender,
                %allowance,
                needed = %spend.amount,
                "approving allowance"
            );

            let request = spend.approval_request(self.owner);
            match self.driver.drive("approve", request, gate).await? {
                DriveOutcome::Declined(reason) => {
                    return Ok(PipelineOutcome::Declined {
                        phase: Phase::Approval,
                        reason,
                        approval: None,
                    })
                }
                DriveOutcome::Included(receipt) => {
                    let allowance = self
                        .allowances
                        .allowance(spend.token, self.owner, spend.spender)
                        .await?;
                    if allowance < spend.amount {
                        warn!(
                            action = action.name(),
                            token = %spend.token,
                            %allowance,
                            needed = %spend.amount,
                            "allowance still short after approval"
                        );
                        return Ok(PipelineOutcome::InsufficientAllowance {
                            allowance,
                            approval: receipt,
                        });
                    }
                    Some(receipt)
                }
            }
        } else {
            debug!(action = action.name(), %allowance, "allowance already sufficient");
            None
        };

        act(self.driver, action, gate, approval).await
    }
}

/// Performs `action` without an allowance step: re-check, then drive.
pub async fn execute_direct<A: GatedAction>(
    driver: &TxDriver,
    action: &A,
    gate: CostGate,
) -> TxResult<PipelineOutcome<A::Check>> {
    act(driver, action, gate, None).await
}

async fn act<A: GatedAction>(
    driver: &TxDriver,
    action: &A,
    gate: CostGate,
    approval: Option<Receipt>,
) -> TxResult<PipelineOutcome<A::Check>> {
    let check = action.check().await?;
    if !check.is_eligible() {
        warn!(
            action = action.name(),
            reasons = ?check.reasons(),
            "action not permitted"
        );
        return Ok(PipelineOutcome::Ineligible { check, approval });
    }

    match driver.drive(action.name(), action.request(), gate).await? {
        DriveOutcome::Declined(reason) => Ok(PipelineOutcome::Declined {
            phase: Phase::Action,
            reason,
            approval,
        }),
        DriveOutcome::Included(receipt) => Ok(PipelineOutcome::Completed {
            approval,
            action: receipt,
        }),
    }
}
