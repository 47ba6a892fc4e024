use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "pawroute";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Device location sampling cadence.
pub const SAMPLE_INTERVAL_SECS: u64 = 5;
/// How often buffered route samples are pushed while walking.
pub const FLUSH_INTERVAL_SECS: u64 = 30;
/// Maximum samples held between flushes; older ones are dropped.
pub const FLUSH_BATCH_SIZE: usize = 5;
/// Request timeout used by the device-side tracking client.
pub const CLIENT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_DOG_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_DOG_CACHE_CAPACITY: usize = 256;
/// Upper bound for `PAWROUTE_DOG_CACHE_TTL_SECS` (one week).
pub const MAX_DOG_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Get the application data directory.
/// Platform data dir (e.g. ~/.local/share/pawroute), falling back to the
/// working directory when the platform has none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn default_db_path() -> PathBuf {
    app_data_dir().join("pawroute.db")
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "pawroute=info,tower_http=warn"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub dog_cache_ttl: Duration,
    pub dog_cache_capacity: usize,
}

impl ServerConfig {
    /// Read settings from `PAWROUTE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup("PAWROUTE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            var: "PAWROUTE_BIND",
            value: bind_raw.clone(),
        })?;

        let db_path = lookup("PAWROUTE_DB")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let ttl_secs = parse_number(&lookup, "PAWROUTE_DOG_CACHE_TTL_SECS", DEFAULT_DOG_CACHE_TTL_SECS)?;
        if ttl_secs > MAX_DOG_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid {
                var: "PAWROUTE_DOG_CACHE_TTL_SECS",
                value: ttl_secs.to_string(),
            });
        }
        let capacity = parse_number(&lookup, "PAWROUTE_DOG_CACHE_CAPACITY", DEFAULT_DOG_CACHE_CAPACITY)?;

        Ok(Self {
            bind,
            db_path,
            dog_cache_ttl: Duration::from_secs(ttl_secs),
            dog_cache_capacity: capacity,
        })
    }
}

fn parse_number<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}
