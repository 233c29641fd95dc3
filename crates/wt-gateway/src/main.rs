use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wt_gateway::{serve, GatewayConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")))
        .init();

    let config = GatewayConfig::load().context("failed to load gateway configuration")?;
    let gateway = serve(config).await?;
    info!("previews served from {}", gateway.base_url());

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("shutting down");
    gateway.shutdown();

    Ok(())
}
