use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kronos_notifier::app;
use kronos_notifier::application::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables take precedence
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    app::run(cli).await
}
