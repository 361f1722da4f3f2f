//! The idempotent reporting cycle shared by the oracle duties.
//!
//! A duty reports a value for a period identified by a block number. Whether this account has
//! already reported is read from two submission flags in the shared ledger: a coarse flag set by
//! any report for the period, and a fine flag set only by a report of exactly the same value.
//! Nothing is cached between cycles.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use futures::try_join;
use smartnode_ledger::LedgerResult;
use smartnode_params::reporting::ReportingWindow;
use smartnode_primitives::{
    keys::{submission_key, submission_value_key},
    types::{Address, BlockNumber, Receipt, TxRequest},
    U256,
};
use smartnode_tx_engine::{
    gas::{CostGate, SkipReason},
    tx_driver::DriveOutcome,
};
use tracing::{debug, info, warn};

use crate::{context::ServiceContext, errors::TaskError, task::Task};

/// A reporting duty: where its periods come from, how its value is computed and how it is
/// submitted.
#[async_trait]
pub trait ReportSource: fmt::Debug + Send + Sync {
    /// The computed value of a period.
    type Report: fmt::Debug + Send + Sync;

    /// Name of the duty.
    fn name(&self) -> &'static str;

    /// Storage namespace of the duty's submission flags.
    fn namespace(&self) -> &'static str;

    /// Whether the protocol currently accepts reports for this duty.
    async fn is_enabled(&self) -> LedgerResult<bool>;

    /// Most recent period that may be reported.
    async fn latest_reportable_block(&self) -> LedgerResult<BlockNumber>;

    /// Most recent period the network has already settled.
    async fn last_recorded_block(&self) -> LedgerResult<BlockNumber>;

    /// Computes the value of the period at `block`, reading state as of that block.
    async fn compute(&self, block: BlockNumber) -> LedgerResult<Self::Report>;

    /// The words the fine submission flag is keyed on.
    fn words(&self, report: &Self::Report) -> Vec<U256>;

    /// Transaction submitting `report` for `block`.
    fn submission(
        &self,
        from: Address,
        block: BlockNumber,
        report: &Self::Report,
    ) -> LedgerResult<TxRequest>;
}

/// What one reporting cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportOutcome {
    /// The account may not report: it is not a trusted member or the duty is disabled.
    Ineligible,

    /// The latest period is still within the follow distance of the head.
    NotFollowed {
        /// The latest reportable period.
        block: BlockNumber,

        /// Current head.
        head: BlockNumber,
    },

    /// The network has already recorded this period or a later one.
    AlreadyRecorded {
        /// The latest reportable period.
        block: BlockNumber,

        /// Last recorded period.
        last: BlockNumber,
    },

    /// The account reported this period and it is beyond the confirm distance.
    Settled {
        /// The period.
        block: BlockNumber,
    },

    /// The account already reported exactly this value.
    Duplicate {
        /// The period.
        block: BlockNumber,
    },

    /// A report was included.
    Submitted {
        /// The period.
        block: BlockNumber,

        /// Whether it replaced an earlier, different report for the same period.
        stale: bool,

        /// Receipt of the submission.
        receipt: Receipt,
    },

    /// The gas policy declined the submission.
    Declined {
        /// The period.
        block: BlockNumber,

        /// Why.
        reason: SkipReason,
    },
}

/// Runs a [`ReportSource`] through the reporting cycle.
#[derive(Debug)]
pub struct ReportingTask<S> {
    ctx: Arc<ServiceContext>,
    source: S,
    window: ReportingWindow,
    gate: CostGate,
}

impl<S: ReportSource> ReportingTask<S> {
    /// Creates the task. Submissions are not checked against a cost threshold.
    pub fn new(ctx: Arc<ServiceContext>, source: S, window: ReportingWindow) -> Self {
        Self {
            ctx,
            source,
            window,
            gate: CostGate::Unchecked,
        }
    }

    /// Checks submissions against `gate` instead.
    pub fn with_gate(mut self, gate: CostGate) -> Self {
        self.gate = gate;
        self
    }

    /// Performs one reporting cycle.
    pub async fn cycle(&self) -> Result<ReportOutcome, TaskError> {
        let ctx = &self.ctx;
        let account = ctx.account;

        let (trusted, enabled) = try_join!(
            ctx.protocol.is_trusted_member(account),
            self.source.is_enabled(),
        )?;
        if !(trusted && enabled) {
            debug!(%trusted, %enabled, "not reporting");
            return Ok(ReportOutcome::Ineligible);
        }

        let (head, block) = try_join!(
            ctx.protocol.head(),
            self.source.latest_reportable_block(),
        )?;
        let head = head.number;
        if !self.window.is_followed(block, head) {
            debug!(%block, %head, "period not yet followed");
            return Ok(ReportOutcome::NotFollowed { block, head });
        }

        let last = self.source.last_recorded_block().await?;
        if block <= last {
            debug!(%block, %last, "period already recorded");
            return Ok(ReportOutcome::AlreadyRecorded { block, last });
        }

        let namespace = self.source.namespace();
        let coarse = submission_key(namespace, account, block);
        if self.window.is_confirmed(block, head) && ctx.flags.get_bool(coarse).await? {
            debug!(%block, "report settled");
            return Ok(ReportOutcome::Settled { block });
        }

        let report = self.source.compute(block).await?;
        let words = self.source.words(&report);
        let fine = submission_value_key(namespace, account, block, &words);

        let (submitted_exact, submitted_any) =
            try_join!(ctx.flags.get_bool(fine), ctx.flags.get_bool(coarse))?;
        if submitted_exact {
            debug!(%block, ?report, "report already submitted");
            return Ok(ReportOutcome::Duplicate { block });
        }

        let stale = submitted_any;
        if stale {
            warn!(%block, "previously submitted out-of-date report, resubmitting");
        }

        info!(%block, ?report, "submitting report");
        let tx = self.source.submission(account, block, &report)?;
        match ctx
            .driver
            .drive(self.source.name(), tx, self.gate)
            .await?
        {
            DriveOutcome::Included(receipt) => {
                info!(%block, tx = %receipt.tx_hash, "report submitted");
                Ok(ReportOutcome::Submitted {
                    block,
                    stale,
                    receipt,
                })
            }
            DriveOutcome::Declined(reason) => Ok(ReportOutcome::Declined { block, reason }),
        }
    }
}

#[async_trait]
impl<S: ReportSource> Task for ReportingTask<S> {
    fn name(&self) -> &'static str {
        self.source.name()
    }

    async fn run(&self) -> Result<(), TaskError> {
        let outcome = self.cycle().await?;
        debug!(?outcome, "reporting cycle done");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use alloy::{sol, sol_types::SolCall};
    use proptest::prelude::*;
    use smartnode_ledger::inmemory::LedgerOp;
    use smartnode_primitives::{bindings::IRocketDAONodeTrusted, types::B256};
    use smartnode_protocol::contracts::names;

    use super::*;
    use crate::fixtures::Fixture;

    const NAMESPACE: &str = "test.reports.submitted.node";

    sol! {
        interface ICounterReports {
            function submitReport(uint256 block, uint256 value) external;
        }
    }

    type Submit = ICounterReports::submitReportCall;

    /// Reports a settable value against a fixed target contract.
    #[derive(Debug)]
    struct CounterSource {
        target: Address,
        reportable: AtomicU64,
        recorded: AtomicU64,
        value: AtomicU64,
        computed: AtomicUsize,
    }

    impl CounterSource {
        fn new(target: Address, reportable: u64, value: u64) -> Self {
            Self {
                target,
                reportable: AtomicU64::new(reportable),
                recorded: AtomicU64::new(0),
                value: AtomicU64::new(value),
                computed: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReportSource for Arc<CounterSource> {
        type Report = u64;

        fn name(&self) -> &'static str {
            "counter"
        }

        fn namespace(&self) -> &'static str {
            NAMESPACE
        }

        async fn is_enabled(&self) -> LedgerResult<bool> {
            Ok(true)
        }

        async fn latest_reportable_block(&self) -> LedgerResult<BlockNumber> {
            Ok(self.reportable.load(Ordering::SeqCst))
        }

        async fn last_recorded_block(&self) -> LedgerResult<BlockNumber> {
            Ok(self.recorded.load(Ordering::SeqCst))
        }

        async fn compute(&self, _block: BlockNumber) -> LedgerResult<u64> {
            self.computed.fetch_add(1, Ordering::SeqCst);
            Ok(self.value.load(Ordering::SeqCst))
        }

        fn words(&self, report: &u64) -> Vec<U256> {
            vec![U256::from(*report)]
        }

        fn submission(
            &self,
            from: Address,
            block: BlockNumber,
            report: &u64,
        ) -> LedgerResult<TxRequest> {
            Ok(TxRequest::call(
                from,
                self.target,
                &Submit {
                    block: U256::from(block),
                    value: U256::from(*report),
                },
            ))
        }
    }

    struct Setup {
        f: Fixture,
        source: Arc<CounterSource>,
        task: ReportingTask<Arc<CounterSource>>,
    }

    fn setup_with(head: u64, reportable: u64, value: u64, window: ReportingWindow) -> Setup {
        let f = Fixture::new();
        f.ledger.set_head(head);
        f.trust();
        let source = Arc::new(CounterSource::new(f.random_target(), reportable, value));
        let task = ReportingTask::new(f.ctx.clone(), source.clone(), window);
        Setup { f, source, task }
    }

    fn window() -> ReportingWindow {
        ReportingWindow {
            follow_distance: 2,
            confirm_distance: 30,
        }
    }

    /// Head 1_000, trusted account, period 990 reportable with value 7.
    fn setup() -> Setup {
        setup_with(1_000, 990, 7, window())
    }

    fn keys(f: &Fixture, block: u64, value: u64) -> (B256, B256) {
        (
            submission_key(NAMESPACE, f.ctx.account, block),
            submission_value_key(NAMESPACE, f.ctx.account, block, &[U256::from(value)]),
        )
    }

    /// Makes an included submission of `value` for `block` set both flags.
    fn record_on_inclusion(s: &Setup, block: u64, value: u64) {
        let (coarse, fine) = keys(&s.f, block, value);
        s.f.flag_on_inclusion::<Submit>(s.source.target, coarse);
        s.f.flag_on_inclusion::<Submit>(s.source.target, fine);
    }

    fn touched_the_mempool(f: &Fixture) -> bool {
        f.ledger
            .journal()
            .iter()
            .any(|op| matches!(op, LedgerOp::Estimate { .. } | LedgerOp::Send { .. }))
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn first_ever_report_is_submitted() {
        let s = setup();

        let outcome = s.task.cycle().await.unwrap();
        assert!(matches!(
            outcome,
            ReportOutcome::Submitted {
                block: 990,
                stale: false,
                ..
            }
        ));
        assert_eq!(s.f.sends_of::<Submit>(), 1);
    }

    #[tokio::test]
    async fn repeated_cycles_submit_once() {
        let s = setup();
        record_on_inclusion(&s, 990, 7);

        s.task.cycle().await.unwrap();
        for _ in 0..3 {
            let outcome = s.task.cycle().await.unwrap();
            assert_eq!(outcome, ReportOutcome::Duplicate { block: 990 });
        }
        assert_eq!(s.f.sends_of::<Submit>(), 1);
    }

    #[tokio::test]
    async fn stale_report_is_resubmitted_but_duplicate_is_not() {
        let s = setup();
        let (coarse, fine) = keys(&s.f, 990, 7);

        s.f.set_flag(coarse, true);
        let outcome = s.task.cycle().await.unwrap();
        assert!(matches!(
            outcome,
            ReportOutcome::Submitted { stale: true, .. }
        ));

        s.f.set_flag(fine, true);
        let outcome = s.task.cycle().await.unwrap();
        assert_eq!(outcome, ReportOutcome::Duplicate { block: 990 });
        assert_eq!(s.f.sends_of::<Submit>(), 1);
    }

    #[tokio::test]
    async fn changed_value_before_finality_is_resubmitted() {
        let s = setup();
        record_on_inclusion(&s, 990, 7);

        s.task.cycle().await.unwrap();
        s.source.value.store(8, Ordering::SeqCst);
        record_on_inclusion(&s, 990, 8);

        let outcome = s.task.cycle().await.unwrap();
        assert!(matches!(
            outcome,
            ReportOutcome::Submitted { stale: true, .. }
        ));

        let outcome = s.task.cycle().await.unwrap();
        assert_eq!(outcome, ReportOutcome::Duplicate { block: 990 });
        assert_eq!(s.f.sends_of::<Submit>(), 2);
    }

    #[tokio::test]
    async fn period_inside_follow_distance_waits() {
        let s = setup();
        s.source.reportable.store(999, Ordering::SeqCst);

        let outcome = s.task.cycle().await.unwrap();
        assert_eq!(
            outcome,
            ReportOutcome::NotFollowed {
                block: 999,
                head: 1_000
            }
        );
        assert_eq!(s.source.computed.load(Ordering::SeqCst), 0);

        s.f.ledger.set_head(1_001);
        let outcome = s.task.cycle().await.unwrap();
        assert!(matches!(outcome, ReportOutcome::Submitted { block: 999, .. }));
    }

    #[tokio::test]
    async fn recorded_period_is_skipped() {
        let s = setup();
        s.source.recorded.store(990, Ordering::SeqCst);

        let outcome = s.task.cycle().await.unwrap();
        assert_eq!(
            outcome,
            ReportOutcome::AlreadyRecorded {
                block: 990,
                last: 990
            }
        );
        assert_eq!(s.f.sends_of::<Submit>(), 0);
    }

    #[tokio::test]
    async fn settled_period_is_not_recomputed() {
        let s = setup();
        s.source.reportable.store(970, Ordering::SeqCst);
        let (coarse, _) = keys(&s.f, 970, 7);
        s.f.set_flag(coarse, true);

        let outcome = s.task.cycle().await.unwrap();
        assert_eq!(outcome, ReportOutcome::Settled { block: 970 });
        assert_eq!(s.source.computed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn untrusted_account_does_nothing() {
        let s = setup();
        s.f.script(
            names::DAO_NODE_TRUSTED,
            IRocketDAONodeTrusted::getMemberIsValidCall {
                node: s.f.ctx.account,
            },
            false,
        );
        s.f.ledger.clear_journal();

        let outcome = s.task.cycle().await.unwrap();
        assert_eq!(outcome, ReportOutcome::Ineligible);
        assert!(!touched_the_mempool(&s.f));
    }

    #[tokio::test]
    async fn reverted_submission_fails_the_task() {
        let s = setup();
        s.f.ledger
            .revert_transactions(s.source.target, Submit::SELECTOR);

        let err = s.task.run().await.unwrap_err();
        assert!(matches!(err, TaskError::Tx(_)));
        assert_eq!(s.f.sends_of::<Submit>(), 1);
    }

    #[tokio::test]
    async fn configured_gate_defers_expensive_submissions() {
        let s = setup();
        // the fixture's max fee is 10 gwei
        let task = ReportingTask::new(s.f.ctx.clone(), s.source.clone(), window())
            .with_gate(CostGate::Threshold(5.0));

        let outcome = task.cycle().await.unwrap();
        assert!(matches!(
            outcome,
            ReportOutcome::Declined {
                reason: SkipReason::FeeAboveThreshold { .. },
                ..
            }
        ));
        assert_eq!(s.f.sends_of::<Submit>(), 0);

        let outcome = s.task.cycle().await.unwrap();
        assert!(matches!(outcome, ReportOutcome::Submitted { .. }));
    }

    #[tokio::test]
    async fn disabled_gate_reports_nothing() {
        let s = setup();
        let task = ReportingTask::new(s.f.ctx.clone(), s.source.clone(), window())
            .with_gate(CostGate::Disabled);

        let outcome = task.cycle().await.unwrap();
        assert!(matches!(
            outcome,
            ReportOutcome::Declined {
                reason: SkipReason::AutomationDisabled,
                ..
            }
        ));
        assert!(!touched_the_mempool(&s.f));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn unfollowed_periods_never_reach_the_mempool(
            head in 1u64..100_000,
            follow_distance in 1u64..1_000,
            ahead in 0u64..1_000,
        ) {
            // any period with period + follow_distance > head
            let period = head.saturating_sub(follow_distance) + 1 + ahead;
            let s = setup_with(
                head,
                period,
                7,
                ReportingWindow {
                    follow_distance,
                    confirm_distance: follow_distance + 30,
                },
            );

            let outcome = runtime().block_on(s.task.cycle()).unwrap();
            prop_assert_eq!(outcome, ReportOutcome::NotFollowed { block: period, head });
            prop_assert!(!touched_the_mempool(&s.f));
            prop_assert_eq!(s.source.computed.load(Ordering::SeqCst), 0);
        }

        #[test]
        fn second_cycle_after_inclusion_sends_nothing(
            period in 1u64..=998,
            value in any::<u64>(),
        ) {
            let s = setup_with(1_000, period, value, window());
            record_on_inclusion(&s, period, value);

            let rt = runtime();
            let first = rt.block_on(s.task.cycle()).unwrap();
            let submitted = matches!(first, ReportOutcome::Submitted { .. });
            prop_assert!(submitted);

            s.f.ledger.clear_journal();
            let second = rt.block_on(s.task.cycle()).unwrap();
            let skipped = matches!(
                second,
                ReportOutcome::Duplicate { .. } | ReportOutcome::Settled { .. }
            );
            prop_assert!(skipped);
            prop_assert!(!touched_the_mempool(&s.f));
        }
    }
}
