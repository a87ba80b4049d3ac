pub mod models;
pub mod postgres;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;
pub use store::{AdminStore, ContentStore, PostQuery, PostStatus, StoreError, WriteOutcome};

#[cfg(test)]
pub use store::{MockAdminStore, MockContentStore};

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::{str::FromStr, time::Duration};

use crate::config::{parse_or, ConfigError, EnvSource};

#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Connection used for public reads.
    pub url: String,
    /// Privileged connection for writes; falls back to `url`.
    pub service_url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl DbConfig {
    pub fn from_env(env: &dyn EnvSource) -> Result<Self, ConfigError> {
        Ok(Self {
            url: env
                .var("DATABASE_URL")
                .ok_or(ConfigError::Missing("DATABASE_URL"))?,
            service_url: env.var("DATABASE_SERVICE_URL"),
            max_connections: parse_or(env, "DB_POOL_MAX", 10)?,
            min_connections: parse_or(env, "DB_POOL_MIN", 2)?,
            connect_timeout_secs: parse_or(env, "DB_CONNECT_TIMEOUT", 10)?,
            idle_timeout_secs: parse_or(env, "DB_IDLE_TIMEOUT", 300)?,
        })
    }
}

/// Where a connection URL points, without its credentials.
fn redact(url: &str) -> String {
    match PgConnectOptions::from_str(url) {
        Ok(options) => format!(
            "postgres://{}@{}:{}/{}",
            options.get_username(),
            options.get_host(),
            options.get_port(),
            options.get_database().unwrap_or_default()
        ),
        Err(_) => "<unparseable database url>".to_string(),
    }
}

pub async fn init_pool(config: &DbConfig, url: &str) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!("Database URL: {}", redact(url));

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

/// Idempotent schema bootstrap for local development databases.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS admin_users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            last_login TIMESTAMPTZ
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS admin_sessions (
            token_hash TEXT PRIMARY KEY,
            admin_id UUID NOT NULL REFERENCES admin_users(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            expires_at TIMESTAMPTZ NOT NULL
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_admin_sessions_expires_at ON admin_sessions(expires_at)",
        r#"
        CREATE TABLE IF NOT EXISTS blog_posts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            slug TEXT NOT NULL,
            title TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft',
            user_name TEXT NOT NULL,
            category TEXT,
            tags TEXT[] NOT NULL DEFAULT '{}',
            meta_description TEXT,
            featured_image TEXT,
            content TEXT,
            created_date TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_date TIMESTAMPTZ,
            published_date TIMESTAMPTZ,
            UNIQUE (user_name, slug)
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_blog_posts_tenant_status ON blog_posts(user_name, status, created_date DESC)",
        "CREATE INDEX IF NOT EXISTS idx_blog_posts_tags ON blog_posts USING GIN(tags)",
        r#"
        CREATE TABLE IF NOT EXISTS authors (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            slug TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            bio TEXT,
            linkedin_url TEXT,
            avatar_url TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS blog_categories (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            slug TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            description TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS sitemaps (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_name TEXT NOT NULL,
            path TEXT NOT NULL,
            changefreq TEXT,
            priority REAL,
            lastmod TIMESTAMPTZ
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS leads (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            topic TEXT NOT NULL,
            username TEXT NOT NULL,
            source TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS cta_conversions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            cta_id TEXT NOT NULL,
            page_path TEXT NOT NULL,
            username TEXT NOT NULL,
            variant TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database migrations completed successfully");

    Ok(())
}
