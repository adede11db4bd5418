/// Vistagram Service - HTTP Server
///
/// Serves the `/api` REST surface backed by PostgreSQL and an S3-compatible
/// image store.
use actix_cors::Cors;
use actix_middleware::{FixedWindowLimiter, JwtAuthMiddleware, RateLimitMiddleware};
use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vistagram_service::config::{Config, LogFormat, StorageBackend};
use vistagram_service::db::{PgStore, SocialStore};
use vistagram_service::storage::{ImageStore, MemoryImageStore, S3ImageStore};
use vistagram_service::{configure_api, error, handlers, AppState};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LogFormat::Text);
    init_tracing(log_format);

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;
    tracing::info!(
        environment = config.app.env.as_str(),
        host = %config.app.host,
        port = config.app.port,
        "Starting vistagram-service"
    );

    error::expose_error_details(!config.is_production());

    crypto_core::jwt::initialize_jwt_secret(&config.auth.jwt_secret, config.auth.token_ttl_hours)
        .map_err(|e| startup_error("Failed to initialize JWT", e))?;

    let db_config = db_pool::DbConfig::new("vistagram-service", config.database.url.clone())
        .with_connections(config.database.max_connections, config.database.min_connections);
    db_config.log_config();
    let pool = db_pool::create_pool(db_config)
        .await
        .map_err(|e| startup_error("Failed to connect to database", e))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;
    tracing::info!("Database migrations applied");

    let store: Arc<dyn SocialStore> = Arc::new(PgStore::new(pool));
    let images: Arc<dyn ImageStore> = match config.storage.backend {
        StorageBackend::S3 => Arc::new(S3ImageStore::from_config(&config.storage).await),
        StorageBackend::Memory => {
            tracing::warn!("STORAGE_BACKEND=memory: uploaded images are kept in process memory");
            Arc::new(MemoryImageStore::new(config.storage.public_base_url.clone()))
        }
    };

    let state = AppState::new(store, images, config.app.client_url.clone(), config.app.env)
        .with_trusted_proxies(config.rate_limit.trusted_proxies.clone());

    let limiter = Arc::new(FixedWindowLimiter::new(config.rate_limit.clone()));
    let purge_limiter = limiter.clone();
    let purge_every = Duration::from_secs(config.rate_limit.window_seconds);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_every);
        loop {
            ticker.tick().await;
            let purged = purge_limiter.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Expired rate limit windows removed");
            }
        }
    });

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &allowed_origins {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure_api)
            .default_service(web::to(handlers::not_found))
            .wrap(JwtAuthMiddleware)
            .wrap(RateLimitMiddleware::new(limiter.clone()))
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(cors)
    })
    .bind(config.bind_address())?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        handle.stop(true).await;
    });

    server.await
}
