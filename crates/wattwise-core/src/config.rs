use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Prefix for environment overrides, e.g. `WATTWISE__CACHE__BACKEND=redis`.
pub const ENV_PREFIX: &str = "WATTWISE";

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "WATTWISE_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "wattwise.toml";

/// Short environment names accepted for the settings deployments set most often.
const ENV_ALIASES: &[(&str, &str)] = &[
    ("OPENCAGE_KEY", "providers.opencage_key"),
    ("REDIS_URL", "cache.redis_url"),
    ("CACHE_DB", "cache.path"),
];

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where cached upstream responses and rate-limit counters live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Sqlite,
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackendKind,

    /// SQLite database file (sqlite backend)
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    /// Connection URL (redis backend), e.g. `redis://127.0.0.1/`
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Entry lifetime; `None` keeps entries until the backend evicts them
    #[serde(default)]
    pub ttl_seconds: Option<u64>,

    /// Timeout applied to every outbound provider request
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
}

fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("wattwise"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("http_cache.sqlite")
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            path: default_cache_path(),
            redis_url: None,
            ttl_seconds: None,
            http_timeout_seconds: default_http_timeout(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_seconds.map(Duration::from_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}

/// A quota of `amount` hits per fixed window of `window_secs`.
///
/// Parses from the `"<amount> per <unit>"` or `"<amount>/<unit>"` notation,
/// e.g. `"2000 per day"`, `"1000/minute"`, `"10 per 5 minutes"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RateLimit {
    pub amount: u64,
    pub window_secs: u64,
}

impl RateLimit {
    pub const fn new(amount: u64, window_secs: u64) -> Self {
        Self {
            amount,
            window_secs,
        }
    }

    pub const fn per_minute(amount: u64) -> Self {
        Self::new(amount, 60)
    }

    pub const fn per_hour(amount: u64) -> Self {
        Self::new(amount, 3600)
    }

    pub const fn per_day(amount: u64) -> Self {
        Self::new(amount, 86_400)
    }
}

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit.trim_end_matches('s') {
        "second" | "sec" => Some(1),
        "minute" | "min" => Some(60),
        "hour" => Some(3600),
        "day" => Some(86_400),
        "month" => Some(30 * 86_400),
        "year" => Some(365 * 86_400),
        _ => None,
    }
}

impl FromStr for RateLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let (amount, period) = normalized
            .split_once('/')
            .or_else(|| normalized.split_once(" per "))
            .ok_or_else(|| format!("expected '<amount> per <unit>', got '{}'", s))?;

        let amount: u64 = amount
            .trim()
            .parse()
            .map_err(|_| format!("invalid amount in '{}'", s))?;
        if amount == 0 {
            return Err(format!("amount must be greater than 0 in '{}'", s));
        }

        let mut parts = period.split_whitespace();
        let (multiplier, unit) = match (parts.next(), parts.next(), parts.next()) {
            (Some(unit), None, None) => (1, unit),
            (Some(count), Some(unit), None) => {
                let count: u64 = count
                    .parse()
                    .map_err(|_| format!("invalid window multiplier in '{}'", s))?;
                (count, unit)
            }
            _ => return Err(format!("invalid window in '{}'", s)),
        };

        let seconds = unit_seconds(unit).ok_or_else(|| format!("unknown unit '{}'", unit))?;
        if multiplier == 0 {
            return Err(format!("window must be greater than 0 in '{}'", s));
        }

        Ok(Self::new(amount, seconds * multiplier))
    }
}

impl TryFrom<String> for RateLimit {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (count, unit) = match self.window_secs {
            86_400 => (1, "day"),
            3600 => (1, "hour"),
            60 => (1, "minute"),
            1 => (1, "second"),
            secs => (secs, "seconds"),
        };
        if count == 1 {
            write!(f, "{} per {}", self.amount, unit)
        } else {
            write!(f, "{} per {} {}", self.amount, count, unit)
        }
    }
}

impl From<RateLimit> for String {
    fn from(limit: RateLimit) -> Self {
        limit.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Reject over-quota requests with 429 instead of only logging them
    #[serde(default)]
    pub enforce: bool,

    /// Budget shared by all callers
    #[serde(default = "default_global_limit")]
    pub global: RateLimit,

    /// Budget per caller address
    #[serde(default = "default_user_limit")]
    pub user: RateLimit,
}

fn default_global_limit() -> RateLimit {
    RateLimit::per_day(2000)
}

fn default_user_limit() -> RateLimit {
    RateLimit::per_minute(1000)
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enforce: false,
            global: default_global_limit(),
            user: default_user_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// OpenCage API key
    #[serde(default)]
    pub opencage_key: Option<String>,

    #[serde(default = "default_opencage_url")]
    pub opencage_url: String,

    #[serde(default = "default_open_meteo_url")]
    pub open_meteo_url: String,

    /// First day of the climate archive window
    #[serde(default = "default_climate_start")]
    pub climate_start: NaiveDate,

    /// Last day of the climate archive window (inclusive)
    #[serde(default = "default_climate_end")]
    pub climate_end: NaiveDate,
}

fn default_opencage_url() -> String {
    "https://api.opencagedata.com".to_string()
}

fn default_open_meteo_url() -> String {
    "https://archive-api.open-meteo.com".to_string()
}

fn default_climate_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default()
}

fn default_climate_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 12, 31).unwrap_or_default()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            opencage_key: None,
            opencage_url: default_opencage_url(),
            open_meteo_url: default_open_meteo_url(),
            climate_start: default_climate_start(),
            climate_end: default_climate_end(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// JSON export of the trained energy model
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model.json")
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

impl Config {
    /// Load configuration from `WATTWISE_CONFIG` (or `./wattwise.toml`) and the environment.
    ///
    /// A `.env` file in the working directory is read first when present.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        Self::load_from(&path)
    }

    /// Load configuration from an optional file plus environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = config::Config::builder();

        for (alias, key) in ENV_ALIASES {
            if let Ok(value) = std::env::var(alias) {
                builder = builder
                    .set_default(*key, value)
                    .with_context(|| format!("Failed to apply {}", alias))?;
            }
        }

        let settings = builder
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors abort.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.server.port == 0 {
            result.add_error("server.port", "Port cannot be 0");
        }

        match self.cache.backend {
            CacheBackendKind::Redis => match self.cache.redis_url.as_deref() {
                None | Some("") => {
                    result.add_error("cache.redis_url", "Redis backend requires a redis_url")
                }
                Some(url) => self.validate_url(url, &["redis", "rediss"], "cache.redis_url", &mut result),
            },
            CacheBackendKind::Sqlite => {
                if self.cache.path.as_os_str().is_empty() {
                    result.add_error("cache.path", "SQLite backend requires a path");
                }
            }
        }

        if self.cache.ttl_seconds == Some(0) {
            result.add_warning("cache.ttl_seconds", "Cache TTL of 0 disables caching");
        }

        if self.cache.http_timeout_seconds == 0 {
            result.add_error("cache.http_timeout_seconds", "Timeout must be greater than 0");
        }

        self.validate_url(
            &self.providers.opencage_url,
            &["http", "https"],
            "providers.opencage_url",
            &mut result,
        );
        self.validate_url(
            &self.providers.open_meteo_url,
            &["http", "https"],
            "providers.open_meteo_url",
            &mut result,
        );

        if self
            .providers
            .opencage_key
            .as_deref()
            .map_or(true, str::is_empty)
        {
            result.add_warning(
                "providers.opencage_key",
                "OpenCage key not configured - geocoding requests will be rejected upstream",
            );
        }

        if self.providers.climate_start > self.providers.climate_end {
            result.add_error(
                "providers.climate_start",
                "Climate window starts after it ends",
            );
        }

        if !self.model.path.exists() {
            result.add_warning(
                "model.path",
                format!("Model file does not exist: {}", self.model.path.display()),
            );
        }

        result
    }

    fn validate_url(
        &self,
        url_str: &str,
        schemes: &[&str],
        field_name: &str,
        result: &mut ValidationResult,
    ) {
        match Url::parse(url_str) {
            Ok(url) => {
                if !schemes.contains(&url.scheme()) {
                    result.add_error(
                        field_name,
                        format!(
                            "URL must use one of [{}], got: {}",
                            schemes.join(", "),
                            url.scheme()
                        ),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_missing_opencage_key_is_warning() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.field == "providers.opencage_key"));
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let mut config = Config::default();
        config.cache.backend = CacheBackendKind::Redis;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "cache.redis_url"));

        config.cache.redis_url = Some("redis://127.0.0.1:6379/0".to_string());
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_invalid_provider_url_scheme() {
        let mut config = Config::default();
        config.providers.open_meteo_url = "ftp://archive.example".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "providers.open_meteo_url"));
    }

    #[test]
    fn test_climate_window_order() {
        let mut config = Config::default();
        config.providers.climate_start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        config.providers.climate_end = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_default_climate_window_is_2022() {
        let providers = ProvidersConfig::default();
        assert_eq!(providers.climate_start.to_string(), "2022-01-01");
        assert_eq!(providers.climate_end.to_string(), "2022-12-31");
    }

    #[test]
    fn test_rate_limit_parsing() {
        assert_eq!("2000 per day".parse::<RateLimit>(), Ok(RateLimit::per_day(2000)));
        assert_eq!("1000/minute".parse::<RateLimit>(), Ok(RateLimit::per_minute(1000)));
        assert_eq!("5 per Hour".parse::<RateLimit>(), Ok(RateLimit::per_hour(5)));
        assert_eq!(
            "10 per 5 minutes".parse::<RateLimit>(),
            Ok(RateLimit::new(10, 300))
        );
    }

    #[test]
    fn test_rate_limit_parsing_rejects_garbage() {
        assert!("lots".parse::<RateLimit>().is_err());
        assert!("0 per day".parse::<RateLimit>().is_err());
        assert!("10 per fortnight".parse::<RateLimit>().is_err());
        assert!("ten per day".parse::<RateLimit>().is_err());
    }

    #[test]
    fn test_rate_limit_display_round_trips() {
        for limit in [RateLimit::per_day(2000), RateLimit::new(10, 300)] {
            assert_eq!(limit.to_string().parse::<RateLimit>(), Ok(limit));
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080

[cache]
backend = "redis"
redis_url = "redis://cache.internal/"
ttl_seconds = 3600

[rate_limit]
enforce = true
user = "30 per minute"
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.cache.backend, CacheBackendKind::Redis);
        assert_eq!(config.cache.ttl(), Some(Duration::from_secs(3600)));
        assert!(config.rate_limit.enforce);
        assert_eq!(config.rate_limit.user, RateLimit::per_minute(30));
        assert_eq!(config.rate_limit.global, RateLimit::per_day(2000));
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.cache.backend, CacheBackendKind::Sqlite);
        assert!(!config.rate_limit.enforce);
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("server.port", "Port must be greater than 0");
        result.add_error("cache.redis_url", "Required when cache.backend is redis");
        let summary = result.error_summary();
        assert!(summary.contains("server.port"));
        assert!(summary.contains("cache.redis_url"));
    }
}
