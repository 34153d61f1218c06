use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("Config error: {key} must be valid (got {value:?})")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

// --- CONFIG AGGREGATOR ---

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub audit: AuditConfig,
    pub log: LogConfig,
    pub report: ReportConfig,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Ok(Self {
            connection: ConnectionConfig::load()?,
            audit: AuditConfig::load()?,
            log: LogConfig::load()?,
            report: ReportConfig::load()?,
        })
    }
}

// --- MODULES ---

// CONNECTION
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub connect_timeout_ms: u64,
    pub round_trip_timeout_ms: u64,
    pub password: Option<String>,
}

impl ConnectionConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            connect_timeout_ms:    get_env("AUDIT_CONNECT_TIMEOUT_MS", "5000")?,
            round_trip_timeout_ms: get_env("AUDIT_ROUND_TRIP_TIMEOUT_MS", "5000")?,
            password:              env::var("AUDIT_PASSWORD").ok().filter(|p| !p.is_empty()),
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn round_trip_timeout(&self) -> Duration {
        Duration::from_millis(self.round_trip_timeout_ms)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5000,
            round_trip_timeout_ms: 5000,
            password: None,
        }
    }
}

// AUDIT
#[derive(Debug, Clone, Default)]
pub struct AuditConfig {
    /// 0 disables the overall deadline.
    pub run_deadline_secs: u64,
}

impl AuditConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            run_deadline_secs: get_env("AUDIT_RUN_DEADLINE_SECS", "0")?,
        })
    }

    pub fn run_deadline(&self) -> Option<Duration> {
        (self.run_deadline_secs > 0).then(|| Duration::from_secs(self.run_deadline_secs))
    }
}

// LOG
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
}

impl LogConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            level: get_env("AUDIT_LOG", "warn")?,
        })
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// REPORT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    pub format: ReportFormat,
}

impl ReportConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            format: get_env("AUDIT_REPORT_FORMAT", "text")?,
        })
    }
}

// --- PRIVATE HELPER ---

fn get_env<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|_| ConfigError { key, value })
}
