use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{EnvSource, Environment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
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

/// Logging setup, read before `AppConfig` so config errors get logged.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub environment: Environment,
    pub level: LogLevel,
    pub directory: PathBuf,
}

impl LoggingSettings {
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let environment = match env.var("ENVIRONMENT").as_deref() {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        };
        let default_level = if environment.is_production() {
            LogLevel::Info
        } else {
            LogLevel::Debug
        };

        Self {
            environment,
            level: env
                .var("LOG_LEVEL")
                .and_then(|v| LogLevel::parse(&v))
                .unwrap_or(default_level),
            directory: env
                .var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs")),
        }
    }

    /// Directive used when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> String {
        format!("cms_backend={},tower_http=debug,axum=debug", self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapEnv;

    #[test]
    fn test_level_defaults_follow_environment() {
        let dev = LoggingSettings::from_env(&MapEnv::default());
        assert_eq!(dev.level, LogLevel::Debug);
        assert_eq!(dev.directory, PathBuf::from("logs"));

        let prod = LoggingSettings::from_env(&MapEnv::new([("ENVIRONMENT", "production")]));
        assert_eq!(prod.level, LogLevel::Info);
    }

    #[test]
    fn test_log_level_override() {
        let settings = LoggingSettings::from_env(&MapEnv::new([("LOG_LEVEL", "WARN")]));
        assert_eq!(settings.level, LogLevel::Warn);
        assert_eq!(
            settings.default_directive(),
            "cms_backend=warn,tower_http=debug,axum=debug"
        );
    }

    #[test]
    fn test_unknown_level_falls_back() {
        let settings = LoggingSettings::from_env(&MapEnv::new([("LOG_LEVEL", "loud")]));
        assert_eq!(settings.level, LogLevel::Debug);
    }
}
