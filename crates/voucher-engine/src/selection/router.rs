use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::domain::{RunStats, Selection, Voucher};
use super::run::RunContext;
use super::service::VoucherSelectionService;
use super::source::VoucherSource;

/// Router builder exposing the best-voucher endpoint.
pub fn selection_router<S>(service: Arc<VoucherSelectionService<S>>) -> Router
where
    S: VoucherSource + 'static,
{
    Router::new()
        .route("/api/v1/vouchers/best", post(best_voucher_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestVoucherRequest {
    pub order_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestVoucherResponse {
    pub order_amount: f64,
    pub voucher: Voucher,
    pub discount: f64,
    pub stats: RunStats,
}

impl BestVoucherResponse {
    pub fn new(order_amount: f64, selection: Selection) -> Self {
        Self {
            order_amount,
            voucher: selection.voucher,
            discount: selection.discount,
            stats: selection.stats,
        }
    }
}

pub(crate) async fn best_voucher_handler<S>(
    State(service): State<Arc<VoucherSelectionService<S>>>,
    Json(request): Json<BestVoucherRequest>,
) -> Result<Json<BestVoucherResponse>, AppError>
where
    S: VoucherSource + 'static,
{
    let order_amount = request.order_amount;
    let selection = service
        .best_for_order(&RunContext::background(), order_amount)
        .await?;

    Ok(Json(BestVoucherResponse::new(order_amount, selection)))
}
