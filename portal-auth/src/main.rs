use portal_auth::{
    build_router,
    config::AuthConfig,
    db::MemoryStore,
    services::{LinuxDoProvider, OAuthService, RegistrationService},
    AppState,
};
use portal_core::middleware::rate_limit::create_ip_rate_limiter;
use portal_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), portal_core::error::AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting authentication service"
    );

    // The account store is an external collaborator; the in-memory backend
    // is the built-in default and does not survive a restart.
    let store: Arc<dyn portal_auth::db::UserStore> = Arc::new(MemoryStore::new());
    tracing::warn!("Using the in-memory account store; accounts are not persisted");

    let provider = Arc::new(LinuxDoProvider::new()?);
    tracing::info!("LinuxDo provider client initialized");

    let oauth = OAuthService::new(store.clone(), provider);
    let registration = RegistrationService::new(store.clone());

    let register_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.register_attempts,
        config.rate_limit.register_window_seconds,
    );
    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );
    tracing::info!("Rate limiters initialized: Register and Global IP");

    let state = AppState {
        config: config.clone(),
        store,
        oauth,
        registration,
        register_rate_limiter,
        ip_rate_limiter,
    };

    let app = build_router(state).await?;

    let addr: SocketAddr = format!("{}:{}", config.common.host, config.common.port)
        .parse()
        .map_err(|e: std::net::AddrParseError| {
            portal_core::error::AppError::ConfigError(anyhow::anyhow!(e.to_string()))
        })?;

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    portal_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
