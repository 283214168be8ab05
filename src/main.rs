use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use web_control::{server, Cli, GatewayConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Optional .env; real environment and flags take precedence
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = GatewayConfig::from(Cli::parse());

    if let Err(e) = config.check_preconditions() {
        error!("❌ {}", e);
        return Err(e.into());
    }

    info!("🦀 web-control {}", env!("CARGO_PKG_VERSION"));
    server::run(config).await
}
