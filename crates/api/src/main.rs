use std::net::SocketAddr;
use std::sync::Arc;

use beatstore_cache::CacheConfig;
use beatstore_cloud::media::{CloudinaryClient, CloudinaryConfig};
use beatstore_cloud::storage::{S3Config, S3Storage};
use beatstore_cloud::{MediaCdn, ObjectStorage};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beatstore_api::bootstrap::{ensure_admin, AdminBootstrap};
use beatstore_api::config::ServerConfig;
use beatstore_api::router::build_app_router;
use beatstore_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    // Loaded before tracing so LOG_FORMAT can pick the output layer.
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "beatstore_api=debug,tower_http=debug".into());
    if config.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    if config.cron_secret.is_none() {
        tracing::warn!("CRON_SECRET is not set; scheduled activation calls will be rejected");
    }

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = beatstore_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    beatstore_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    beatstore_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    if let Some(admin) = AdminBootstrap::from_env() {
        ensure_admin(&pool, &admin)
            .await
            .expect("Failed to provision the admin account");
    }

    // --- Cache ---
    let cache = CacheConfig::from_env()
        .connect()
        .await
        .expect("Failed to connect to the cache store");

    // --- Remote assets ---
    let s3_config = S3Config::from_env().expect("Invalid object storage configuration");
    let storage: Arc<dyn ObjectStorage> = Arc::new(S3Storage::new(&s3_config).await);
    tracing::info!(bucket = %s3_config.bucket, region = %s3_config.region, "Object storage configured");

    let cdn_config = CloudinaryConfig::from_env().expect("Invalid media CDN configuration");
    tracing::info!(cloud = %cdn_config.cloud_name, "Media CDN configured");
    let media: Arc<dyn MediaCdn> = Arc::new(CloudinaryClient::new(cdn_config));

    // --- App ---
    let state = AppState::new(pool, config.clone(), cache, storage, media);
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server shut down");
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
