use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::selection::domain::Voucher;
use crate::selection::run::RunContext;
use crate::selection::source::{SourceError, StaticVoucherSource, VoucherSource};
use crate::selection::{SelectionConfig, VoucherSelectionService, VoucherSelector};

pub(super) fn selection_config() -> SelectionConfig {
    SelectionConfig {
        worker_cap: 4,
        timeout: None,
    }
}

pub(super) fn catalog() -> Vec<Voucher> {
    let mut malformed = Voucher::flat(3, "BROKEN", 0.0, 0.0);
    malformed.discount_amount = None;

    vec![
        Voucher::flat(1, "FLAT50", 100.0, 50.0),
        Voucher::percentage(2, "PCT20", 100.0, 20, Some(90.0)),
        malformed,
        Voucher::flat(4, "BIGSPEND", 1000.0, 150.0),
    ]
}

pub(super) fn build_service(
    vouchers: Vec<Voucher>,
) -> Arc<VoucherSelectionService<StaticVoucherSource>> {
    Arc::new(VoucherSelectionService::new(
        Arc::new(StaticVoucherSource::new(vouchers)),
        VoucherSelector::new(selection_config()),
    ))
}

#[derive(Default)]
pub(super) struct OfflineSource;

impl VoucherSource for OfflineSource {
    fn fetch_vouchers(&self, _run: &RunContext) -> Result<Vec<Voucher>, SourceError> {
        Err(SourceError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn offline_service() -> Arc<VoucherSelectionService<OfflineSource>> {
    Arc::new(VoucherSelectionService::new(
        Arc::new(OfflineSource),
        VoucherSelector::new(selection_config()),
    ))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
