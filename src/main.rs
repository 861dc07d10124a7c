mod config;
mod error;
mod gateway;
mod judge0;
mod languages;
mod server;
#[cfg(test)]
mod testing;

use anyhow::Result;
use tracing::info;

use crate::config::GatewayConfig;
use crate::languages::get_supported_languages;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("codeverse_gateway=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    info!("Starting Execution Gateway...");

    let config = GatewayConfig::from_env()?;
    info!(
        "Judge service at {} (execute timeout {}ms, catalog timeout {}ms)",
        config.judge_url,
        config.execute_timeout.as_millis(),
        config.catalog_timeout.as_millis()
    );
    info!("Supported languages: {}", get_supported_languages().join(", "));

    server::run_server(config).await
}
