use super::common::*;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;
use std::time::Duration;
use serde_json::json;
use tower::ServiceExt;

use crate::selection::router::best_voucher_handler;
use crate::selection::source::StaticVoucherSource;
use crate::selection::{
    selection_router, BestVoucherRequest, SelectionConfig, VoucherSelectionService,
    VoucherSelector,
};

#[tokio::test]
async fn best_route_returns_winning_voucher() {
    let router = selection_router(build_service(catalog()));

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/vouchers/best")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&json!({ "order_amount": 500.0 })).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .expect("router responds");

    assert_status(&response, StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["voucher"]["code"], "PCT20");
    assert_eq!(body["discount"], 90.0);
    assert_eq!(body["stats"]["candidates"], 4);
    assert_eq!(body["stats"]["eligible"], 2);
    assert_eq!(body["stats"]["skipped"], 2);
}

#[tokio::test]
async fn handler_returns_not_found_when_nothing_applies() {
    let service = build_service(vec![crate::selection::Voucher::flat(
        9, "BIGSPEND", 1000.0, 10.0,
    )]);

    let response = best_voucher_handler::<StaticVoucherSource>(
        State(service),
        axum::Json(BestVoucherRequest {
            order_amount: 500.0,
        }),
    )
    .await
    .into_response();

    assert_status(&response, StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(
        body["error"],
        "selection failed: no applicable voucher found"
    );
}

#[tokio::test]
async fn handler_rejects_negative_order_amount() {
    let response = best_voucher_handler::<StaticVoucherSource>(
        State(build_service(catalog())),
        axum::Json(BestVoucherRequest {
            order_amount: -10.0,
        }),
    )
    .await
    .into_response();

    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn handler_maps_source_outage_to_service_unavailable() {
    let response = best_voucher_handler::<OfflineSource>(
        State(offline_service()),
        axum::Json(BestVoucherRequest {
            order_amount: 500.0,
        }),
    )
    .await
    .into_response();

    assert_status(&response, StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("database offline"));
}

#[tokio::test]
async fn best_route_reports_expired_deadline_as_gateway_timeout() {
    let service = Arc::new(VoucherSelectionService::new(
        Arc::new(StaticVoucherSource::new(catalog())),
        VoucherSelector::new(SelectionConfig {
            worker_cap: 4,
            timeout: Some(Duration::ZERO),
        }),
    ));

    let response = selection_router(service)
        .oneshot(
            axum::http::Request::post("/api/v1/vouchers/best")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(r#"{"order_amount":500.0}"#))
                .unwrap(),
        )
        .await
        .expect("router responds");

    assert_status(&response, StatusCode::GATEWAY_TIMEOUT);
    let body = read_json_body(response).await;
    assert_eq!(
        body["error"],
        "selection failed: selection run exceeded its deadline"
    );
}
