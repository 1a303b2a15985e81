use anyhow::Context;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pastime_server::{build_router, config::Settings, db::Database, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pastime_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new().context("Failed to load settings")?;

    let db = Database::new(&settings.database.path).context("Failed to create database")?;
    db.initialize()?;

    if settings.database.seed_demo_data {
        db.seed_demo_data()?;
        tracing::info!("Demo data seeded");
    }

    tracing::info!("Database initialized at {}", settings.database.path);

    let state = AppState::new(db, settings.clone());

    match state.session_manager.cleanup_expired_sessions() {
        Ok(count) => {
            if count > 0 {
                tracing::info!("Cleaned up {} expired sessions on startup", count);
            } else {
                tracing::info!("No expired sessions to clean up");
            }
        }
        Err(e) => {
            tracing::error!("Failed to cleanup expired sessions on startup: {:#}", e);
        }
    }

    // Hourly session cleanup
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            tracing::debug!("Running periodic session cleanup...");
            match cleanup_state.session_manager.cleanup_expired_sessions() {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!("Periodic cleanup: removed {} expired sessions", count);
                    }
                }
                Err(e) => {
                    tracing::error!("Periodic session cleanup failed: {:#}", e);
                }
            }
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Failed to parse server address")?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
