use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::engagement::recommendations::ScoringWeights;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub feed: FeedConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = ScoringWeights::default();
        let weights = ScoringWeights {
            affinity_per_point: weight_var("SCORING_AFFINITY_WEIGHT", defaults.affinity_per_point)?,
            affinity_half_life_days: half_life_var(
                "SCORING_HALF_LIFE_DAYS",
                defaults.affinity_half_life_days,
            )?,
            declared_interest_bonus: weight_var(
                "SCORING_INTEREST_BONUS",
                defaults.declared_interest_bonus,
            )?,
            ..defaults
        };
        let default_limit = numeric_var("FEED_DEFAULT_LIMIT", 20usize)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            feed: FeedConfig {
                weights,
                default_limit,
            },
        })
    }
}

fn numeric_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Signal weights must be finite and non-negative.
fn weight_var(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    bounded_var(key, default, |value| value >= 0.0)
}

fn half_life_var(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    bounded_var(key, default, |value| value > 0.0)
}

fn bounded_var(
    key: &'static str,
    default: f64,
    accept: impl Fn(f64) -> bool,
) -> Result<f64, ConfigError> {
    let value = numeric_var(key, default)?;
    if value.is_finite() && accept(value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Swipe feed tuning: signal weights and the page size used when callers omit `limit`.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub weights: ScoringWeights,
    pub default_limit: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a usable number (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
