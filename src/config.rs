//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every key has a development default
//! except the payment provider credentials, which stay empty until set.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::{Money, RoomRules};

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid value for {key}: {value}")]
    Invalid {
        /// Environment variable name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`AppConfig::from_env`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// SQLite connection string (e.g. `sqlite://db.sqlite`).
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Seconds before an HTTP request is aborted.
    pub request_timeout_secs: u64,

    /// Externally reachable base URL, used to build the webhook callback.
    pub public_url: String,

    /// PixUp API base URL.
    pub pixup_api_url: String,

    /// PixUp OAuth client id.
    pub pixup_client_id: String,

    /// PixUp OAuth client secret.
    pub pixup_client_secret: String,

    /// Per-request timeout for PixUp API calls.
    pub pixup_timeout_secs: u64,

    /// Shared secret expected in the `x-webhook-secret` header, if set.
    pub pixup_webhook_secret: Option<String>,

    /// Secret mixed into session-token digests.
    pub session_secret: String,

    /// Session lifetime in hours.
    pub session_ttl_hours: u64,

    /// Minimum stake and per-match platform fee.
    pub room_rules: RoomRules,

    /// Withdrawal fee in basis points (300 = 3%).
    pub withdraw_fee_bps: u32,

    /// Directory of static frontend files served as a fallback, if any.
    pub static_dir: Option<PathBuf>,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: "sqlite://db.sqlite".to_string(),
            database_max_connections: 4,
            database_connect_timeout_secs: 5,
            event_bus_capacity: 10_000,
            request_timeout_secs: 30,
            public_url: "http://localhost:3000".to_string(),
            pixup_api_url: "https://api.pixup.com.br/sandbox".to_string(),
            pixup_client_id: String::new(),
            pixup_client_secret: String::new(),
            pixup_timeout_secs: 10,
            pixup_webhook_secret: None,
            session_secret: "dev_secret".to_string(),
            session_ttl_hours: 24 * 7,
            room_rules: RoomRules::default(),
            withdraw_fee_bps: 300,
            static_dir: None,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to [`AppConfig::default`] values when a variable is not
    /// set. Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `LISTEN_ADDR`, `MIN_STAKE`, or
    /// `PLATFORM_FEE` is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "LISTEN_ADDR",
                value: v,
            })?,
            Err(_) => match std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
                Some(port) => SocketAddr::from(([0, 0, 0, 0], port)),
                None => defaults.listen_addr,
            },
        };

        let room_rules = RoomRules {
            min_stake: parse_money("MIN_STAKE", defaults.room_rules.min_stake)?,
            platform_fee: parse_money("PLATFORM_FEE", defaults.room_rules.platform_fee)?,
        };

        let session_secret = std::env::var("SESSION_SECRET")
            .or_else(|_| std::env::var("JWT_SECRET"))
            .unwrap_or(defaults.session_secret);

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parse_env(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            database_connect_timeout_secs: parse_env(
                "DATABASE_CONNECT_TIMEOUT_SECS",
                defaults.database_connect_timeout_secs,
            ),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            public_url: std::env::var("PUBLIC_URL").unwrap_or_else(|_| {
                format!("http://localhost:{}", listen_addr.port())
            }),
            pixup_api_url: std::env::var("PIXUP_API_URL").unwrap_or(defaults.pixup_api_url),
            pixup_client_id: std::env::var("PIXUP_CLIENT_ID").unwrap_or_default(),
            pixup_client_secret: std::env::var("PIXUP_CLIENT_SECRET").unwrap_or_default(),
            pixup_timeout_secs: parse_env("PIXUP_TIMEOUT_SECS", defaults.pixup_timeout_secs),
            pixup_webhook_secret: non_empty_env("PIXUP_WEBHOOK_SECRET"),
            session_secret,
            session_ttl_hours: parse_env("SESSION_TTL_HOURS", defaults.session_ttl_hours),
            room_rules,
            withdraw_fee_bps: parse_env("WITHDRAW_FEE_BPS", defaults.withdraw_fee_bps),
            static_dir: non_empty_env("STATIC_DIR").map(PathBuf::from),
            log_format,
        })
    }

    /// Returns `true` if both PixUp credentials are configured.
    #[must_use]
    pub fn pixup_configured(&self) -> bool {
        !self.pixup_client_id.is_empty() && !self.pixup_client_secret.is_empty()
    }

    /// Returns the URL the payment provider should post notifications to.
    #[must_use]
    pub fn webhook_callback_url(&self) -> String {
        format!("{}/api/pixup/webhook", self.public_url.trim_end_matches('/'))
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses a decimal amount. Unlike [`parse_env`], a malformed value is an
/// error: silently falling back would change fees.
fn parse_money(key: &'static str, default: Money) -> Result<Money, ConfigError> {
    match std::env::var(key) {
        Ok(v) => v
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: v }),
        Err(_) => Ok(default),
    }
}

/// Returns the variable's value unless it is unset or blank.
fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
