//! CMS Backend - library for app logic and testing

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod routes;
pub mod seo;
pub mod sitemap;
pub mod tenant;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Instant};
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    auth::SessionManager,
    config::{AppConfig, ConfigError, EnvSource, ProcessEnv},
    db::{AdminStore, ContentStore, PgStore},
    logging::LoggingSettings,
    proxy::ProxyClient,
};

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared handler state. Everything in here is immutable or internally pooled.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub env: Arc<dyn EnvSource>,
    pub admins: Arc<dyn AdminStore>,
    pub content: Arc<dyn ContentStore>,
    pub sessions: SessionManager,
    pub proxy: ProxyClient,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        env: Arc<dyn EnvSource>,
        admins: Arc<dyn AdminStore>,
        content: Arc<dyn ContentStore>,
        http: reqwest::Client,
    ) -> Self {
        let sessions = SessionManager::new(admins.clone(), config.session.clone());
        let proxy = ProxyClient::new(http, config.proxy.clone());
        Self {
            config: Arc::new(config),
            env,
            admins,
            content,
            sessions,
            proxy,
            started_at: Instant::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database initialization failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("invalid bind address {0}")]
    Address(String),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// CORS for the configured origins, or the local frontend when none are set.
pub fn configure_cors(origins: &[String]) -> CorsLayer {
    let mut allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    if allowed.is_empty() {
        allowed = vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ];
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config.allowed_origins);

    let mut app = Router::new()
        .route("/api/admin/login", post(routes::admin::login))
        .route("/api/admin/logout", post(routes::admin::logout))
        .route("/api/admin/verify", get(routes::admin::verify))
        .route("/api/admin/posts", get(routes::admin::list_posts))
        .route(
            "/api/admin/dc-proxy",
            get(routes::proxy::doubleclicker_get).post(routes::proxy::doubleclicker_post),
        )
        .route(
            "/api/admin/flash/provision",
            post(routes::proxy::flash_provision),
        )
        .route(
            "/api/authors",
            get(routes::authors::list_authors).post(routes::authors::create_author),
        )
        .route("/api/authors/{slug}", get(routes::authors::get_author))
        .route("/api/blog/categories", get(routes::blog::list_categories))
        .route("/api/blog/posts", get(routes::blog::list_posts))
        .route("/api/blog/posts/{slug}", get(routes::blog::get_post))
        .route("/api/blog/tags/{tag}", get(routes::blog::list_posts_by_tag))
        .route("/api/leads", post(routes::leads::capture_lead))
        .route("/api/cta-conversions", post(routes::leads::record_conversion))
        .route("/api/site", get(routes::site::site_metadata))
        .route(sitemap::INDEX_PATH, get(routes::sitemap::sitemap_index))
        .route(sitemap::BLOG_SITEMAP_PATH, get(routes::sitemap::blog_sitemap))
        .route(
            sitemap::SERVICES_SITEMAP_PATH,
            get(routes::sitemap::services_sitemap),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/health/database", get(routes::health::health_database));

    if let Some(dir) = &state.config.admin_ui_dir {
        tracing::info!("Serving admin UI from {}", dir.display());
        let admin_ui = ServeDir::new(dir)
            .append_index_html_on_directories(true)
            .fallback(ServeFile::new(dir.join("index.html")));
        app = app.nest_service(auth::gate::ADMIN_PREFIX, admin_ui);
    }

    app.layer(middleware::from_fn_with_state(
        state.clone(),
        auth::gate::session_cookie_gate,
    ))
    .layer(logging::middleware::propagate_request_id_layer())
    .layer(middleware::from_fn(logging::middleware::log_request))
    .layer(logging::middleware::request_id_layer())
    .layer(TraceLayer::new_for_http())
    .layer(CompressionLayer::new())
    .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
    .layer(cors)
    .with_state(state)
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();
    let env: Arc<dyn EnvSource> = Arc::new(ProcessEnv);

    // Dropping the guards stops the background log writers.
    let _log_guards = logging::init(&LoggingSettings::from_env(env.as_ref()));

    let config = AppConfig::from_env(env.as_ref())?;
    tracing::info!(environment = %config.environment, "configuration loaded");

    let store = Arc::new(PgStore::connect(&config.database).await?);
    if config.run_migrations {
        db::run_migrations(store.service_pool()).await?;
    }

    let http = reqwest::Client::builder()
        .user_agent(concat!("cms-backend/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let bind = format!("{}:{}", config.host, config.port);
    let addr: SocketAddr = bind.parse().map_err(|_| StartupError::Address(bind))?;

    let state = AppState::new(config, env, store.clone(), store, http);
    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
