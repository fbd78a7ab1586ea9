//! Rollcall API Server
//!
//! Serves the tenant subscription API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use rollcall_api::{create_router, AppState, Config, LogFormat};
use rollcall_billing::{PgSubscriptionRepository, SubscriptionService};
use rollcall_shared::{create_migration_pool, create_pool, run_migrations};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,rollcall_api=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Pick the subscription store: PostgreSQL when configured, memory otherwise
async fn build_subscription_service(config: &Config) -> anyhow::Result<SubscriptionService> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set - using in-memory subscription store");
        return Ok(SubscriptionService::in_memory());
    };

    if config.run_migrations {
        tracing::info!("Running database migrations...");
        let migration_pool = create_migration_pool(database_url).await?;
        run_migrations(&migration_pool).await?;
        migration_pool.close().await;
        tracing::info!("Database migrations complete");
    } else {
        tracing::info!("Database migrations skipped (RUN_MIGRATIONS=false)");
    }

    tracing::info!("Connecting to database...");
    let pool = create_pool(database_url, config.database_max_connections).await?;
    tracing::info!("Database connection established");

    Ok(SubscriptionService::new(Arc::new(
        PgSubscriptionRepository::new(pool),
    )))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    tracing::info!(
        allowed_origins = ?allowed_origins,
        "CORS configured with {} allowed origins",
        allowed_origins.len()
    );

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!("Starting Rollcall API Server v{}", env!("CARGO_PKG_VERSION"));

    let subscriptions = build_subscription_service(&config).await?;
    let cors = cors_layer(&config);
    let addr: SocketAddr = config.bind_address.parse()?;

    let state = AppState::new(config, subscriptions);
    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
