//! Portfolio CMS - library for app logic and testing

pub mod config;
pub mod db;
pub mod editor;
pub mod error;
pub mod forms;
pub mod logging;
pub mod routes;
pub mod slug;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use config::AppConfig;
use routes::auth::DEFAULT_JWT_SECRET;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// CORS for the configured frontend origins. Unparseable origins are skipped.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(config: &AppConfig) -> Router {
    let cors = configure_cors(config);

    Router::new()
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/verify", post(routes::auth::verify_token))
        .route("/api/auth/refresh", post(routes::auth::refresh))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/blog", get(routes::blog::list_posts))
        .route("/api/blog/{slug}", get(routes::blog::get_post))
        .route("/api/categories", get(routes::blog::list_categories))
        .route("/api/portfolio", get(routes::portfolio::get_portfolio))
        .route(
            "/api/portfolio/{section}",
            get(routes::portfolio::get_section),
        )
        .route("/api/contact", post(routes::contact::submit_contact))
        .nest("/api/cms", routes::cms::router())
        .route("/rss.xml", get(routes::rss::rss_feed))
        .route("/health", get(routes::health::health_ping))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        .layer(Extension(Arc::new(config.clone())))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
}

/// Production must not sign tokens with the built-in secret.
pub fn check_jwt_secret(config: &AppConfig, secret: Option<&str>) -> Result<(), String> {
    if !config.is_production() {
        return Ok(());
    }
    match secret.map(str::trim) {
        Some(s) if !s.is_empty() && s != DEFAULT_JWT_SECRET => Ok(()),
        _ => Err(
            "JWT_SECRET must be set to a secure, unique value in production. \
             Refusing to start with the default secret."
                .to_string(),
        ),
    }
}

fn warn_on_default_admin(config: &AppConfig) {
    if !config.is_production() {
        return;
    }
    let admin_email = std::env::var("ADMIN_EMAIL").unwrap_or_default();
    if admin_email.is_empty() || admin_email == "admin@example.com" {
        tracing::warn!("SECURITY: ADMIN_EMAIL is using an insecure default");
    }
    if std::env::var("ADMIN_PASSWORD_HASH").is_err() && std::env::var("ADMIN_PASSWORD").is_err() {
        tracing::warn!(
            "SECURITY: neither ADMIN_PASSWORD_HASH nor ADMIN_PASSWORD is set; \
             the fallback password 'admin123' is in use"
        );
    }
}

/// Run the server (used by main).
pub async fn run() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();

    let _log_guards = logging::init(&logging::LogSettings::from_env());
    routes::health::init_start_time();

    let config = AppConfig::from_env();
    check_jwt_secret(&config, std::env::var("JWT_SECRET").ok().as_deref())?;
    warn_on_default_admin(&config);

    if std::env::var("DATABASE_URL").is_ok() {
        match db::init_pool(None).await {
            Ok(pool) => {
                if let Err(e) = db::run_migrations(&pool).await {
                    tracing::error!(error = %e, "failed to run database migrations");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to initialize database pool; continuing without database");
            }
        }
    } else {
        tracing::info!("DATABASE_URL not set. Running without database connection.");
    }

    let app = create_app(&config);
    let addr = config.bind_addr()?;
    tracing::info!(
        %addr,
        environment = %config.environment,
        origins = ?config.allowed_origins,
        "starting server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
