/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | REDIS_URL | redis://127.0.0.1:6379 | cache connection |
/// | DATA_DIR | /var/lib/storefront | column store location |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | LOG_LEVEL | info | tracing level filter |
/// | LOG_DIR | (stdout) | daily-rolling log file directory |
/// | CART_TTL_SECS | 604800 | cart hash TTL (7 days) |
/// | STOCK_TTL_SECS | 3600 | stock counter TTL (1 hour) |
/// | STATS_DRAIN_INTERVAL_SECS | 20 | statistics drain interval |
/// | STATS_DRAIN_BATCH_SIZE | 1000 | max orders folded per drain |
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    /// Directory holding the column-store database file
    pub data_dir: String,
    /// Running environment: development | staging | production
    pub environment: String,
    pub log_level: String,
    /// When set, logs roll daily into this directory instead of stdout
    pub log_dir: Option<String>,
    pub cart_ttl_secs: i64,
    pub stock_ttl_secs: i64,
    pub stats_drain_interval_secs: u64,
    pub stats_drain_batch_size: usize,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/var/lib/storefront".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            cart_ttl_secs: env_parse("CART_TTL_SECS", crate::cache::keys::CART_TTL_SECS),
            stock_ttl_secs: env_parse("STOCK_TTL_SECS", crate::cache::keys::STOCK_TTL_SECS),
            stats_drain_interval_secs: env_parse("STATS_DRAIN_INTERVAL_SECS", 20),
            stats_drain_batch_size: env_parse("STATS_DRAIN_BATCH_SIZE", 1000),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
