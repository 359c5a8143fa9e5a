use anyhow::Result;
use wattwise_server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    wattwise_core::init()?;

    let (config, _validation) = wattwise_core::Config::load_validated()?;

    let state = AppState::from_config(&config).await?;
    tracing::info!(
        backend = ?config.cache.backend,
        enforce_limits = config.rate_limit.enforce,
        "WattWise API starting"
    );

    wattwise_server::serve(&config.server, state).await
}
