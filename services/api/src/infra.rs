use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use voucher_engine::config::SourceConfig;
use voucher_engine::selection::{
    CsvVoucherSource, RunContext, SourceError, StaticVoucherSource, Voucher, VoucherSource,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Source chosen at startup: a CSV export when one is configured, the
/// built-in catalog otherwise.
#[derive(Debug, Clone)]
pub(crate) enum ConfiguredSource {
    Csv(CsvVoucherSource),
    Builtin(StaticVoucherSource),
}

impl ConfiguredSource {
    pub(crate) fn csv(path: PathBuf) -> Self {
        Self::Csv(CsvVoucherSource::new(path))
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            ConfiguredSource::Csv(source) => source.path().display().to_string(),
            ConfiguredSource::Builtin(_) => "built-in catalog".to_string(),
        }
    }
}

impl VoucherSource for ConfiguredSource {
    fn fetch_vouchers(&self, run: &RunContext) -> Result<Vec<Voucher>, SourceError> {
        match self {
            ConfiguredSource::Csv(source) => source.fetch_vouchers(run),
            ConfiguredSource::Builtin(source) => source.fetch_vouchers(run),
        }
    }
}

pub(crate) fn build_source(config: &SourceConfig) -> ConfiguredSource {
    match &config.csv_path {
        Some(path) => ConfiguredSource::csv(path.clone()),
        None => ConfiguredSource::Builtin(StaticVoucherSource::new(builtin_catalog())),
    }
}

pub(crate) fn builtin_catalog() -> Vec<Voucher> {
    vec![
        Voucher::flat(1, "WELCOME10", 0.0, 10.0),
        Voucher::flat(2, "SAVE50", 100.0, 50.0),
        Voucher::percentage(3, "TWENTYOFF", 100.0, 20, Some(90.0)),
        Voucher::percentage(4, "FIFTEEN", 0.0, 15, None),
        Voucher::flat(5, "BIGBASKET", 1000.0, 150.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_builtin_catalog() {
        let source = build_source(&SourceConfig::default());
        assert_eq!(source.describe(), "built-in catalog");

        let vouchers = source
            .fetch_vouchers(&RunContext::background())
            .expect("builtin fetch");
        assert_eq!(vouchers.len(), builtin_catalog().len());
    }

    #[test]
    fn prefers_configured_csv() {
        let source = build_source(&SourceConfig {
            csv_path: Some(PathBuf::from("exports/vouchers.csv")),
        });
        assert!(matches!(source, ConfiguredSource::Csv(_)));
        assert!(source.describe().ends_with("vouchers.csv"));
    }
}
