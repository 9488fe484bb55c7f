mod csv_file;

pub use csv_file::{parse_vouchers, CsvVoucherSource};

use super::domain::Voucher;
use super::run::{Interruption, RunContext};

/// Supplies the full, ordered voucher catalog for a run. Rows are returned as
/// stored; malformed discount settings are left for the scorer to reject.
pub trait VoucherSource: Send + Sync {
    fn fetch_vouchers(&self, run: &RunContext) -> Result<Vec<Voucher>, SourceError>;
}

/// Failure to produce the catalog at all. Fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read voucher export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid voucher CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("voucher source unavailable: {0}")]
    Unavailable(String),
    #[error("voucher fetch interrupted: {0}")]
    Interrupted(Interruption),
}

/// Fixed catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticVoucherSource {
    vouchers: Vec<Voucher>,
}

impl StaticVoucherSource {
    pub fn new(vouchers: Vec<Voucher>) -> Self {
        Self { vouchers }
    }

    pub fn len(&self) -> usize {
        self.vouchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vouchers.is_empty()
    }
}

impl VoucherSource for StaticVoucherSource {
    fn fetch_vouchers(&self, run: &RunContext) -> Result<Vec<Voucher>, SourceError> {
        if let Some(reason) = run.interruption() {
            return Err(SourceError::Interrupted(reason));
        }
        Ok(self.vouchers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_source_preserves_order() {
        let source = StaticVoucherSource::new(vec![
            Voucher::flat(2, "SECOND", 0.0, 5.0),
            Voucher::flat(1, "FIRST", 0.0, 5.0),
        ]);

        let ids: Vec<i64> = source
            .fetch_vouchers(&RunContext::background())
            .expect("static fetch")
            .iter()
            .map(|voucher| voucher.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn static_source_honors_cancelled_run() {
        let source = StaticVoucherSource::new(vec![Voucher::flat(1, "ONLY", 0.0, 5.0)]);
        let (run, handle) = RunContext::cancellable();
        handle.cancel();

        match source.fetch_vouchers(&run) {
            Err(SourceError::Interrupted(Interruption::Cancelled)) => {}
            other => panic!("expected interrupted fetch, got {other:?}"),
        }
    }
}
