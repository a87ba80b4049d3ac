/*!
 * Application Configuration
 * Built once at startup from the environment and shared through `AppState`
 */
use std::{collections::HashMap, fmt, path::PathBuf};

use chrono::Duration;
use thiserror::Error;

use crate::db::DbConfig;

/// Source of configuration values.
///
/// The process environment in production, a plain map in tests.
pub trait EnvSource: Send + Sync + fmt::Debug {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads `std::env`, treating blank values as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Fixed set of variables, used for tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
    pub fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Admin session cookie settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub ttl: Duration,
    pub secure_cookie: bool,
}

/// External automation services reached through the proxy routes.
#[derive(Debug, Clone, Default)]
pub struct ProxySettings {
    pub doubleclicker_url: Option<String>,
    pub flash_url: Option<String>,
    pub shared_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub database: DbConfig,
    pub run_migrations: bool,
    pub session: SessionSettings,
    pub proxy: ProxySettings,
    pub allowed_origins: Vec<String>,
    pub admin_ui_dir: Option<PathBuf>,
}

const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
/// One year.
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;
const DEFAULT_COOKIE_NAME: &str = "admin_session";

impl AppConfig {
    /// Build the configuration, failing on anything the service cannot run without.
    pub fn from_env(env: &dyn EnvSource) -> Result<Self, ConfigError> {
        let environment = match env.var("ENVIRONMENT").as_deref() {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        };

        let port = parse_or(env, "PORT", 3001u16)?;
        let ttl_hours = parse_or(env, "SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;
        let session_ttl = Some(ttl_hours)
            .filter(|h| (1..=MAX_SESSION_TTL_HOURS).contains(h))
            .and_then(Duration::try_hours)
            .ok_or_else(|| ConfigError::Invalid {
                name: "SESSION_TTL_HOURS",
                value: ttl_hours.to_string(),
            })?;

        let allowed_origins = env
            .var("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(Self {
            environment,
            host: env.var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            database: DbConfig::from_env(env)?,
            run_migrations: parse_or(env, "DB_RUN_MIGRATIONS", false)?,
            session: SessionSettings {
                cookie_name: env
                    .var("SESSION_COOKIE_NAME")
                    .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string()),
                ttl: session_ttl,
                secure_cookie: environment.is_production(),
            },
            proxy: ProxySettings {
                doubleclicker_url: env.var("DOUBLECLICKER_URL").map(trim_base_url),
                flash_url: env.var("FLASH_ORCHESTRATOR_URL").map(trim_base_url),
                shared_secret: env.var("PROVISION_SECRET"),
            },
            allowed_origins,
            admin_ui_dir: env.var("ADMIN_UI_DIR").map(PathBuf::from),
        })
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

pub(crate) fn parse_or<T>(env: &dyn EnvSource, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env.var(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
