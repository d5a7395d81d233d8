use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// Where and how verbosely the server logs.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub production: bool,
    pub level: LogLevel,
    pub dir: PathBuf,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Production logs JSON at info; everything else logs pretty at debug.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let production = get("ENVIRONMENT").as_deref() == Some("production");
        let fallback = if production {
            LogLevel::Info
        } else {
            LogLevel::Debug
        };

        Self {
            production,
            level: get("LOG_LEVEL")
                .and_then(|s| s.parse().ok())
                .unwrap_or(fallback),
            dir: get("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs")),
        }
    }

    /// Default directive used when `RUST_LOG` is not set.
    pub fn directive(&self) -> String {
        format!(
            "portfolio_cms={},tower_http=debug,axum=debug,sqlx=warn",
            self.level
        )
    }
}
