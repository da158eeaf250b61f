use clap::Parser;
use tracing_subscriber::EnvFilter;

use craftport::cli::{self, Cli};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,craftport=debug")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
