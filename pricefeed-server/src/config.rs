use std::env;
use std::path::PathBuf;

use pricefeed::{PriceFeedConfig, PriceFeedError};
use pricefeed_binance::DEFAULT_BASE_URL;

/// Server configuration read from environment variables (and `.env`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub bind: String,
    pub port: u16,
    /// Fallback filter directive when `RUST_LOG` is unset.
    pub log_level: String,
    pub binance_base_url: String,
    pub feed: PriceFeedConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/trading.db"),
            bind: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            binance_base_url: DEFAULT_BASE_URL.to_string(),
            feed: PriceFeedConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read the process environment.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for unparsable or out-of-range values.
    pub fn from_env() -> Result<Self, PriceFeedError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank variables keep their defaults.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for unparsable or out-of-range values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PriceFeedError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let mut cfg = Self::default();

        if let Some(v) = var("DB_PATH") {
            cfg.db_path = PathBuf::from(v);
        }
        if let Some(v) = var("BIND") {
            cfg.bind = v;
        }
        if let Some(v) = var("LOG_LEVEL") {
            cfg.log_level = log_directive(&v)?;
        }
        if let Some(v) = var("BINANCE_BASE_URL") {
            cfg.binance_base_url = v;
        }
        cfg.port = parsed(&var, "PORT", cfg.port)?;

        let b = &mut cfg.feed.backfill;
        b.backfill_minutes = parsed(&var, "BACKFILL_MINUTES", b.backfill_minutes)?;
        b.gap_fill_enabled = flag(&var, "GAP_FILL_ENABLED", b.gap_fill_enabled)?;
        b.gap_fill_threshold_minutes =
            parsed(&var, "GAP_FILL_THRESHOLD_MINUTES", b.gap_fill_threshold_minutes)?;
        b.max_gap_fill_minutes = parsed(&var, "MAX_GAP_FILL_MINUTES", b.max_gap_fill_minutes)?;

        let h = &mut cfg.feed.heartbeat;
        h.interval_secs = parsed(&var, "HEARTBEAT_INTERVAL", h.interval_secs)?;
        h.buffer_delay_secs = parsed(&var, "HEARTBEAT_BUFFER_DELAY", h.buffer_delay_secs)?;

        cfg.feed.validate()?;
        Ok(cfg)
    }

    /// `bind:port`, as handed to the listener.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn parsed<T, V>(var: &V, name: &str, default: T) -> Result<T, PriceFeedError>
where
    T: std::str::FromStr,
    V: Fn(&str) -> Option<String>,
{
    var(name).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|_| PriceFeedError::InvalidConfig(format!("{name}: cannot parse {raw:?}")))
    })
}

fn flag<V>(var: &V, name: &str, default: bool) -> Result<bool, PriceFeedError>
where
    V: Fn(&str) -> Option<String>,
{
    let Some(raw) = var(name) else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(PriceFeedError::InvalidConfig(format!(
            "{name}: expected a boolean, got {raw:?}"
        ))),
    }
}

// Accepts the python-style level names as well as tracing's.
fn log_directive(level: &str) -> Result<String, PriceFeedError> {
    let d = match level.to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        _ => {
            return Err(PriceFeedError::InvalidConfig(format!(
                "LOG_LEVEL: unknown level {level:?}"
            )));
        }
    };
    Ok(d.to_string())
}
