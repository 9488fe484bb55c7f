use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use super::dispatcher::BoundedDispatcher;
use super::domain::{OrderContext, RunStats, ScoredVoucher, Selection, Voucher};
use super::observer::{SelectionObserver, TracingObserver};
use super::reducer::RunningBest;
use super::run::{Interruption, RunContext};
use super::scoring::calculate_discount;
use super::source::SourceError;

/// Knobs for one selector instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Maximum number of vouchers scored at the same time within one run.
    pub worker_cap: usize,
    /// Deadline applied to every run on top of the caller's own; `None` disables it.
    pub timeout: Option<Duration>,
}

impl SelectionConfig {
    pub const DEFAULT_WORKER_CAP: usize = 10;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            worker_cap: Self::DEFAULT_WORKER_CAP,
            timeout: Some(Self::DEFAULT_TIMEOUT),
        }
    }
}

/// Run-level failures. `NoEligibleVoucher` means the run completed and found
/// nothing; every other variant means the run could not complete.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("no applicable voucher found")]
    NoEligibleVoucher,
    #[error("order amount must be a finite, non-negative number (got {0})")]
    InvalidOrderAmount(f64),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("selection run was cancelled")]
    Cancelled,
    #[error("selection run exceeded its deadline")]
    DeadlineExceeded,
}

impl SelectionError {
    pub fn is_no_eligible(&self) -> bool {
        matches!(self, SelectionError::NoEligibleVoucher)
    }

    /// Source outages and interrupted runs, as opposed to input or outcome.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            SelectionError::Source(_) | SelectionError::Cancelled | SelectionError::DeadlineExceeded
        )
    }
}

impl From<Interruption> for SelectionError {
    fn from(value: Interruption) -> Self {
        match value {
            Interruption::Cancelled => SelectionError::Cancelled,
            Interruption::DeadlineExceeded => SelectionError::DeadlineExceeded,
        }
    }
}

/// Lifecycle of one `find_best` call. Every call ends in `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPhase {
    Idle,
    Dispatching,
    Draining,
    Done(RunOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunOutcome {
    Winner,
    NoEligible,
    Failed,
}

impl RunOutcome {
    fn of(result: &Result<Selection, SelectionError>) -> Self {
        match result {
            Ok(_) => RunOutcome::Winner,
            Err(err) if err.is_no_eligible() => RunOutcome::NoEligible,
            Err(_) => RunOutcome::Failed,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => f.write_str("idle"),
            RunPhase::Dispatching => f.write_str("dispatching"),
            RunPhase::Draining => f.write_str("draining"),
            RunPhase::Done(RunOutcome::Winner) => f.write_str("done(winner)"),
            RunPhase::Done(RunOutcome::NoEligible) => f.write_str("done(no-eligible)"),
            RunPhase::Done(RunOutcome::Failed) => f.write_str("done(failed)"),
        }
    }
}

fn enter(phase: &mut RunPhase, next: RunPhase) {
    debug!(from = %phase, to = %next, "selection run phase");
    *phase = next;
}

/// Picks the voucher with the largest discount for an order.
///
/// Every call is an independent run: it owns its dispatcher, result channel,
/// and running best, none of which outlive the call.
#[derive(Clone)]
pub struct VoucherSelector {
    config: SelectionConfig,
    observer: Arc<dyn SelectionObserver>,
}

impl VoucherSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    pub fn with_observer(config: SelectionConfig, observer: Arc<dyn SelectionObserver>) -> Self {
        Self { config, observer }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Narrows `run` with the configured timeout, if any.
    pub fn scope(&self, run: &RunContext) -> RunContext {
        match self.config.timeout {
            Some(timeout) => run.clone().with_timeout(timeout),
            None => run.clone(),
        }
    }

    /// Score every voucher against `order_amount` and return the best one.
    ///
    /// Ineligible and malformed vouchers are reported to the observer and
    /// skipped. Among equal discounts the first result delivered wins, which is
    /// not stable across runs. On cancellation or deadline the outstanding
    /// workers are aborted and awaited before the error is returned.
    pub async fn find_best(
        &self,
        run: &RunContext,
        vouchers: &[Voucher],
        order_amount: f64,
    ) -> Result<Selection, SelectionError> {
        let mut phase = RunPhase::Idle;
        let result = self.drive(&mut phase, run, vouchers, order_amount).await;
        enter(&mut phase, RunPhase::Done(RunOutcome::of(&result)));
        result
    }

    async fn drive(
        &self,
        phase: &mut RunPhase,
        run: &RunContext,
        vouchers: &[Voucher],
        order_amount: f64,
    ) -> Result<Selection, SelectionError> {
        let order = OrderContext::new(order_amount)
            .ok_or(SelectionError::InvalidOrderAmount(order_amount))?;
        let run = self.scope(run);
        if let Some(reason) = run.interruption() {
            return Err(reason.into());
        }

        let candidates = vouchers.len();
        let (tx, mut rx) = mpsc::channel::<ScoredVoucher>(candidates.max(1));
        let dispatcher = BoundedDispatcher::new(self.config.worker_cap);

        enter(phase, RunPhase::Dispatching);
        let work = {
            let observer = Arc::clone(&self.observer);
            move |voucher: Voucher| {
                let observer = Arc::clone(&observer);
                async move {
                    match calculate_discount(&voucher, &order) {
                        Ok(discount) => {
                            let scored = ScoredVoucher { voucher, discount };
                            observer.voucher_scored(&scored);
                            Some(scored)
                        }
                        Err(reason) => {
                            observer.voucher_skipped(&voucher, &reason);
                            None
                        }
                    }
                }
            }
        };
        let dispatch = dispatcher
            .submit_all(&run, vouchers.to_vec(), work, tx)
            .await;
        if let Some(reason) = dispatch.interrupted() {
            dispatch.abort().await;
            return Err(reason.into());
        }

        enter(phase, RunPhase::Draining);
        let mut best = RunningBest::new();
        let drained = loop {
            tokio::select! {
                biased;
                reason = run.interrupted() => break Err(reason),
                received = rx.recv() => match received {
                    Some(scored) => {
                        best.offer(scored);
                    }
                    None => break Ok(()),
                },
            }
        };
        if let Err(reason) = drained {
            drop(rx);
            dispatch.abort().await;
            return Err(reason.into());
        }

        let completion = dispatch.wait().await;
        if completion.panicked > 0 {
            self.observer.worker_failed(completion.panicked);
        }

        let eligible = best.offered();
        let stats = RunStats {
            candidates,
            eligible,
            skipped: candidates.saturating_sub(eligible),
        };

        match best.finish() {
            Some(winner) => {
                self.observer.winner_selected(&winner, &stats);
                Ok(Selection {
                    voucher: winner.voucher,
                    discount: winner.discount,
                    stats,
                })
            }
            None => {
                self.observer.no_winner(&stats);
                Err(SelectionError::NoEligibleVoucher)
            }
        }
    }
}

impl Default for VoucherSelector {
    fn default() -> Self {
        Self::new(SelectionConfig::default())
    }
}
