//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the chat transport listens on.
    pub port: u16,
    /// Sessions and campaign states idle longer than this are evicted.
    pub session_idle_timeout: Duration,
    /// How often the idle sweep runs.
    pub sweep_interval: Duration,
    /// Identical free-text messages inside this window are ignored.
    pub dedup_window: Duration,
    /// Local lead store, used when no sheet is configured.
    pub db_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            sweep_interval: Duration::from_secs(300),        // 5 minutes
            dedup_window: Duration::from_secs(60),
            db_path: PathBuf::from("./data/leads.db"),
        }
    }
}

impl AppConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Unset keys fall back to
    /// the defaults; set keys that fail to parse are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_var(&lookup, "LEAD_ASSIST_PORT")?.unwrap_or(defaults.port);
        let session_idle_timeout = parse_var(&lookup, "LEAD_ASSIST_SESSION_IDLE_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_idle_timeout);
        let sweep_interval = parse_var(&lookup, "LEAD_ASSIST_SWEEP_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.sweep_interval);
        let dedup_window = parse_var(&lookup, "LEAD_ASSIST_DEDUP_WINDOW_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.dedup_window);
        let db_path = lookup("LEAD_ASSIST_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        if sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "LEAD_ASSIST_SWEEP_INTERVAL_SECS".into(),
                message: "must be greater than zero".into(),
            });
        }

        Ok(Self {
            port,
            session_idle_timeout,
            sweep_interval,
            dedup_window,
            db_path,
        })
    }
}

/// Read and parse an optional variable. Empty values count as unset.
pub(crate) fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        Some(value) if !value.is_empty() => {
            value
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}
