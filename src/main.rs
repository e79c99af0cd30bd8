use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use failback_loader::{FailbackLoader, config::Config};

#[derive(Parser)]
#[command(name = "failback-loader")]
#[command(version = "0.1.0")]
#[command(about = "Censorship-resilient segment loader demo runner")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Number of segments to request
    #[arg(short = 'n', long, default_value_t = 20)]
    segments: usize,

    /// Segment id prefix
    #[arg(long, default_value = "seg")]
    prefix: String,

    /// Classify every failure as blocked (simulation mode)
    #[arg(long)]
    all_blocked: bool,

    /// Print the final counters as JSON
    #[arg(long)]
    json: bool,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = format!("failback_loader={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load_from_file(&cli.config)?;
    let loader = FailbackLoader::from_config(&config)?;

    if cli.all_blocked {
        info!("all-blocked simulation mode enabled");
        loader.set_all_blocked(true);
    }

    let requests = (0..cli.segments)
        .map(|i| loader.request_for(&format!("{}-{i:03}.ts", cli.prefix)))
        .collect::<Result<Vec<_>, _>>()?;

    let summary = loader.load_batch(requests).await;
    println!("{summary}");

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&loader.stats())?);
    }

    Ok(())
}
