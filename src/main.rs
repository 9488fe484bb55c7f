use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use voucher_engine::config::AppConfig;
use voucher_engine::error::AppError;
use voucher_engine::selection::{
    BestVoucherResponse, CsvVoucherSource, RunContext, SourceError, VoucherSelectionService,
    VoucherSelector,
};
use voucher_engine::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "voucher-select",
    about = "Find the voucher with the largest discount for an order",
    version
)]
struct Cli {
    /// Order total to score vouchers against
    #[arg(long, default_value_t = 500.0)]
    order_amount: f64,
    /// Voucher CSV export; overrides VOUCHER_CSV
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Number of vouchers scored concurrently; overrides SELECTION_WORKER_CAP
    #[arg(long)]
    workers: Option<usize>,
    /// Run deadline in seconds, 0 for none; overrides SELECTION_TIMEOUT_SECS
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        error!(error = %err, "voucher selection failed");
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(workers) = cli.workers.filter(|cap| *cap > 0) {
        config.selection.worker_cap = workers;
    }
    if let Some(secs) = cli.timeout_secs {
        config.selection.timeout = (secs > 0).then(|| std::time::Duration::from_secs(secs));
    }

    telemetry::init(&config.telemetry)?;

    let path = cli.csv.or(config.source.csv_path).ok_or_else(|| {
        SourceError::Unavailable("no voucher export given; pass --csv or set VOUCHER_CSV".into())
    })?;

    let service = VoucherSelectionService::new(
        Arc::new(CsvVoucherSource::new(path)),
        VoucherSelector::new(config.selection),
    );
    let selection = service
        .best_for_order(&RunContext::background(), cli.order_amount)
        .await?;

    info!(
        id = selection.voucher.id,
        code = %selection.voucher.code,
        discount = selection.discount,
        "best voucher found"
    );

    let response = BestVoucherResponse::new(cli.order_amount, selection);
    match serde_json::to_string_pretty(&response) {
        Ok(body) => println!("{body}"),
        Err(err) => error!(error = %err, "could not render selection"),
    }

    Ok(())
}
