use std::sync::Arc;
use std::time::Duration;
use mockable::DefaultClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_events::{
    api::{create_router, AppState},
    config::Config,
    error::AppError,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,campus_events=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting Campus Events server v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    tracing::info!("✅ Configuration loaded");

    // Create shared application state
    let state = AppState::new(config.clone(), Arc::new(DefaultClock));

    if config.seed_sample_data {
        state.registry.write().await.seed_sample_data();
        tracing::info!("👥 Sample users: alice/123456, bob/123456");
    }

    // Spawn background task for session cleanup
    {
        let sessions = state.sessions.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3600)); // Every hour
            loop {
                interval.tick().await;
                let removed = sessions.lock().await.cleanup_expired();
                tracing::debug!("🧹 Expired sessions cleaned up ({})", removed);
            }
        });
        tracing::info!("✅ Session cleanup task started (runs hourly)");
    }

    // Build router
    let app = create_router(state);

    // Bind and serve
    let addr = config.server_address();
    tracing::info!("🌐 Server listening on http://{}", addr);
    tracing::info!("📚 API index: http://{}/", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
