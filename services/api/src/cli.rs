use crate::infra::build_source;
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use voucher_engine::config::{AppConfig, ConfigError};
use voucher_engine::error::AppError;
use voucher_engine::selection::{
    calculate_discount, OrderContext, RunContext, SelectionError, Voucher, VoucherSource,
};
use voucher_engine::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "Voucher Selection Service",
    about = "Serve best-voucher lookups over HTTP or inspect the voucher catalog",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print every voucher in the catalog with its discount for an order
    Catalog(CatalogArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the number of vouchers scored concurrently per request
    #[arg(long)]
    pub(crate) workers: Option<usize>,
    /// Voucher CSV export to serve from instead of VOUCHER_CSV
    #[arg(long)]
    pub(crate) voucher_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogArgs {
    /// Order total to evaluate each voucher against
    #[arg(long)]
    pub(crate) order_amount: f64,
    /// Voucher CSV export; defaults to VOUCHER_CSV or the built-in catalog
    #[arg(long)]
    pub(crate) voucher_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Catalog(args) => run_catalog(args),
    }
}

fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let config = catalog_config(args.voucher_csv)?;
    telemetry::init(&config.telemetry)?;

    let order = OrderContext::new(args.order_amount)
        .ok_or(SelectionError::InvalidOrderAmount(args.order_amount))?;
    let source = build_source(&config.source);

    let vouchers = source.fetch_vouchers(&RunContext::background())?;
    println!("{} voucher(s) from {}", vouchers.len(), source.describe());
    for line in render_catalog(&vouchers, &order) {
        println!("{line}");
    }

    Ok(())
}

/// Environment configuration with the `--voucher-csv` override applied.
fn catalog_config(voucher_csv: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = voucher_csv {
        config.source.csv_path = Some(path);
    }
    Ok(config)
}

fn render_catalog(vouchers: &[Voucher], order: &OrderContext) -> Vec<String> {
    vouchers
        .iter()
        .map(|voucher| match calculate_discount(voucher, order) {
            Ok(discount) => format!("  {:<16} discount {:>10.2}", voucher.code, discount),
            Err(reason) => format!("  {:<16} skipped: {}", voucher.code, reason),
        })
        .collect()
}
