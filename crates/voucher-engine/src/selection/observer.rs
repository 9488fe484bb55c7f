use tracing::{debug, error, info, warn};

use super::domain::{RunStats, ScoredVoucher, Voucher};
use super::scoring::EvaluationError;

/// Advisory sink for per-run notices. Implementations must return quickly and
/// never fail; workers call these hooks while holding a slot.
pub trait SelectionObserver: Send + Sync {
    fn voucher_skipped(&self, _voucher: &Voucher, _reason: &EvaluationError) {}

    fn voucher_scored(&self, _scored: &ScoredVoucher) {}

    fn worker_failed(&self, _panicked: usize) {}

    fn winner_selected(&self, _winner: &ScoredVoucher, _stats: &RunStats) {}

    fn no_winner(&self, _stats: &RunStats) {}
}

/// Default sink: structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SelectionObserver for TracingObserver {
    fn voucher_skipped(&self, voucher: &Voucher, reason: &EvaluationError) {
        if reason.is_malformed() {
            warn!(
                voucher_id = voucher.id,
                code = %voucher.code,
                malformed = true,
                error = %reason,
                "voucher skipped: bad discount configuration"
            );
        } else {
            warn!(
                voucher_id = voucher.id,
                code = %voucher.code,
                error = %reason,
                "voucher condition not met"
            );
        }
    }

    fn voucher_scored(&self, scored: &ScoredVoucher) {
        debug!(
            voucher_id = scored.voucher.id,
            code = %scored.voucher.code,
            discount = scored.discount,
            "voucher scored"
        );
    }

    fn worker_failed(&self, panicked: usize) {
        error!(panicked, "selection workers panicked; their vouchers were skipped");
    }

    fn winner_selected(&self, winner: &ScoredVoucher, stats: &RunStats) {
        info!(
            voucher_id = winner.voucher.id,
            code = %winner.voucher.code,
            discount = winner.discount,
            candidates = stats.candidates,
            eligible = stats.eligible,
            "best voucher found"
        );
    }

    fn no_winner(&self, stats: &RunStats) {
        info!(
            candidates = stats.candidates,
            skipped = stats.skipped,
            "no applicable voucher found"
        );
    }
}

/// Discards every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SelectionObserver for NoopObserver {}
