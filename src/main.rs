//! MtgDb.Info moderation service
//!
//! Planeswalkers propose edits to cards and card sets; moderators review them
//! field by field and push accepted fields to the live card database.

mod auth;
mod carddb;
mod change;
mod config;
mod error;
mod models;
mod moderation;
mod repository;
mod routes;
mod state;

use crate::auth::{AuthProvider, LocalAuthProvider};
use crate::carddb::{CardDatabase, HttpCardDatabase};
use crate::config::Settings;
use crate::repository::{MemoryRepository, PgRepository, Repository};
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting MtgDb.Info moderation service...");

    let settings = Settings::load()?;
    info!("Configuration loaded");

    let repository: Arc<dyn Repository> = match &settings.database {
        Some(db) => Arc::new(PgRepository::connect(db).await?),
        None => {
            warn!("DATABASE_URL not set, change requests are kept in memory only");
            Arc::new(MemoryRepository::new())
        }
    };

    let card_db: Arc<dyn CardDatabase> = Arc::new(HttpCardDatabase::new(&settings.card_api)?);
    info!("Card database at {}", settings.card_api.base_url);

    let auth: Arc<dyn AuthProvider> = Arc::new(LocalAuthProvider::new(
        repository.clone(),
        &settings.auth.jwt_secret,
    ));

    let state = Arc::new(AppState::new(repository, card_db, auth));
    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));
    info!("Server listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mtgdb_moderation=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
