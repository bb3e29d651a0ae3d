//! ec2-price - Look up the hourly price of an EC2 instance type
//!
//! Prints the resolved price on stdout. Logs go to stderr and can be tuned
//! with `RUST_LOG`.

use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ec2_price::cache::CacheManager;
use ec2_price::cli::Cli;
use ec2_price::PriceClient;

/// Installs the stderr log subscriber, defaulting to `info`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Resolves the price for the parsed arguments
async fn run(cli: &Cli) -> Result<f64, Box<dyn std::error::Error>> {
    let query = cli.query()?;
    let config = cli.config();

    // Ensure the cache directory exists
    CacheManager::with_dir(&config.cache_dir).ensure_dir()?;

    let client = PriceClient::new(&config)?;
    let price = client.get_price(&query).await?;

    info!("Price ({}) found for {}", price, query);
    Ok(price)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(price) => {
            println!("{}", price);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ec2-price: {}", e);
            ExitCode::FAILURE
        }
    }
}
