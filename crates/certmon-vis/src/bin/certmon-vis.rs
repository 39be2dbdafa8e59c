//! Certmon dashboard server
//!
//! Usage: `certmon-vis [telemetry.json] [port]`

use certmon_vis::{VisConfig, VisServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certmon_vis=info,certmon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = VisConfig::from_env()?.with_args(std::env::args().skip(1))?;
    tracing::info!(addr = %config.api_addr, telemetry = ?config.telemetry_path, "Starting dashboard");

    let server = VisServer::from_config(&config)?;
    server.serve(config.api_addr).await?;

    Ok(())
}
