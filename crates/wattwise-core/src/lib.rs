pub mod config;
pub mod error;

pub use config::{
    CacheBackendKind, CacheConfig, Config, ModelConfig, ProvidersConfig, RateLimit,
    RateLimitConfig, ServerConfig, ValidationResult,
};
pub use error::{
    DatabaseError, NetworkError, RedisErrorExt, ReqwestErrorExt, RusqliteErrorExt,
    ValidationErrors,
};

use anyhow::Result;

/// Initialize logging for the process.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!("WattWise core initialized");
    Ok(())
}
