use crate::cli::ServeArgs;
use crate::infra::{build_source, AppState, ConfiguredSource};
use crate::routes::with_selection_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use voucher_engine::config::AppConfig;
use voucher_engine::error::AppError;
use voucher_engine::selection::{
    SelectionConfig, VoucherSelectionService, VoucherSelector,
};
use voucher_engine::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(workers) = args.workers.take().filter(|cap| *cap > 0) {
        config.selection.worker_cap = workers;
    }
    if let Some(path) = args.voucher_csv.take() {
        config.source.csv_path = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let source = build_source(&config.source);
    let catalog = source.describe();
    let service = build_service(source, config.selection.clone());

    let app = with_selection_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        %catalog,
        worker_cap = config.selection.worker_cap,
        "voucher selection service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn build_service(
    source: ConfiguredSource,
    selection: SelectionConfig,
) -> Arc<VoucherSelectionService<ConfiguredSource>> {
    Arc::new(VoucherSelectionService::new(
        Arc::new(source),
        VoucherSelector::new(selection),
    ))
}
