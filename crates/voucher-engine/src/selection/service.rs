use std::sync::Arc;

use tracing::{info_span, Instrument};

use super::domain::{Selection, Voucher};
use super::run::RunContext;
use super::selector::{SelectionError, VoucherSelector};
use super::source::{SourceError, VoucherSource};

/// Service composing the voucher source with the selector.
pub struct VoucherSelectionService<S> {
    source: Arc<S>,
    selector: VoucherSelector,
}

impl<S> VoucherSelectionService<S>
where
    S: VoucherSource + 'static,
{
    pub fn new(source: Arc<S>, selector: VoucherSelector) -> Self {
        Self { source, selector }
    }

    pub fn selector(&self) -> &VoucherSelector {
        &self.selector
    }

    /// Load the catalog and pick the best voucher for `order_amount`.
    ///
    /// The configured timeout covers the fetch as well as the evaluation. The
    /// fetch runs on the blocking pool; when the run is interrupted first, the
    /// call returns at once and the read finishes in the background. A failing
    /// fetch aborts the run before any voucher is dispatched.
    pub async fn best_for_order(
        &self,
        run: &RunContext,
        order_amount: f64,
    ) -> Result<Selection, SelectionError> {
        let run = self.selector.scope(run);
        let span = info_span!("voucher_selection", order_amount);

        async {
            let vouchers = self.fetch(&run).await?;
            self.selector.find_best(&run, &vouchers, order_amount).await
        }
        .instrument(span)
        .await
    }

    async fn fetch(&self, run: &RunContext) -> Result<Vec<Voucher>, SelectionError> {
        if let Some(reason) = run.interruption() {
            return Err(reason.into());
        }

        let source = Arc::clone(&self.source);
        let fetch_run = run.clone();
        let fetch = tokio::task::spawn_blocking(move || source.fetch_vouchers(&fetch_run));

        let fetched = tokio::select! {
            biased;
            reason = run.interrupted() => return Err(reason.into()),
            joined = fetch => joined.map_err(|err| {
                SourceError::Unavailable(format!("voucher fetch did not complete: {err}"))
            })?,
        };

        fetched.map_err(|err| match err {
            SourceError::Interrupted(reason) => SelectionError::from(reason),
            other => SelectionError::Source(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::selection::source::StaticVoucherSource;
    use crate::selection::SelectionConfig;

    struct OfflineSource;

    impl VoucherSource for OfflineSource {
        fn fetch_vouchers(&self, _run: &RunContext) -> Result<Vec<Voucher>, SourceError> {
            Err(SourceError::Unavailable("database offline".to_string()))
        }
    }

    #[tokio::test]
    async fn source_failure_is_surfaced_verbatim() {
        let service =
            VoucherSelectionService::new(Arc::new(OfflineSource), VoucherSelector::default());

        match service.best_for_order(&RunContext::background(), 500.0).await {
            Err(SelectionError::Source(SourceError::Unavailable(reason))) => {
                assert_eq!(reason, "database offline")
            }
            other => panic!("expected source failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_fetch_reports_cancellation() {
        let source = StaticVoucherSource::new(vec![Voucher::flat(1, "FLAT", 0.0, 10.0)]);
        let service = VoucherSelectionService::new(Arc::new(source), VoucherSelector::default());
        let (run, handle) = RunContext::cancellable();
        handle.cancel();

        let result = service.best_for_order(&run, 500.0).await;
        assert!(matches!(result, Err(SelectionError::Cancelled)));
    }

    struct SlowSource {
        delay: Duration,
    }

    impl VoucherSource for SlowSource {
        fn fetch_vouchers(&self, _run: &RunContext) -> Result<Vec<Voucher>, SourceError> {
            std::thread::sleep(self.delay);
            Ok(vec![Voucher::flat(1, "FLAT", 0.0, 10.0)])
        }
    }

    #[tokio::test]
    async fn deadline_interrupts_a_slow_fetch() {
        let source = SlowSource {
            delay: Duration::from_millis(600),
        };
        let selector = VoucherSelector::new(SelectionConfig {
            worker_cap: 2,
            timeout: Some(Duration::from_millis(20)),
        });
        let service = VoucherSelectionService::new(Arc::new(source), selector);

        let started = std::time::Instant::now();
        let result = service.best_for_order(&RunContext::background(), 100.0).await;

        assert!(matches!(result, Err(SelectionError::DeadlineExceeded)));
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn picks_best_from_source() {
        let source = StaticVoucherSource::new(vec![
            Voucher::flat(1, "FLAT50", 100.0, 50.0),
            Voucher::percentage(2, "PCT20", 100.0, 20, Some(90.0)),
        ]);
        let selector = VoucherSelector::new(SelectionConfig {
            worker_cap: 2,
            timeout: None,
        });
        let service = VoucherSelectionService::new(Arc::new(source), selector);

        let selection = service
            .best_for_order(&RunContext::background(), 500.0)
            .await
            .expect("selection succeeds");
        assert_eq!(selection.voucher.code, "PCT20");
        assert_eq!(selection.discount, 90.0);
    }
}
