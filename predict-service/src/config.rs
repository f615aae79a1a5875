//! Service configuration read from the environment at start-up.

use ml_pipeline::DEFAULT_PIPELINE_PATH;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Address the HTTP server listens on
const BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8501);

/// Rows shown in table previews
const PREVIEW_ROWS: usize = 5;

/// Lifetime of an upload session
const SESSION_TTL_SECS: u64 = 3600;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub pipeline_path: PathBuf,
    pub preview_rows: usize,
    pub session_ttl: Duration,
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(BIND_ADDR),
            pipeline_path: PathBuf::from(DEFAULT_PIPELINE_PATH),
            preview_rows: PREVIEW_ROWS,
            session_ttl: Duration::from_secs(SESSION_TTL_SECS),
            log_format: LogFormat::Text,
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind_addr: parse_var(&lookup, "PREDICT_BIND_ADDR")
                .unwrap_or_else(|| SocketAddr::from(BIND_ADDR)),
            pipeline_path: lookup("PIPELINE_PATH")
                .filter(|v| !v.trim().is_empty())
                .map_or_else(|| PathBuf::from(DEFAULT_PIPELINE_PATH), PathBuf::from),
            preview_rows: parse_var(&lookup, "PREVIEW_ROWS")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(PREVIEW_ROWS),
            session_ttl: Duration::from_secs(
                parse_var(&lookup, "SESSION_TTL_SECS").unwrap_or(SESSION_TTL_SECS),
            ),
            log_format: parse_var(&lookup, "LOG_FORMAT").unwrap_or_default(),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}
