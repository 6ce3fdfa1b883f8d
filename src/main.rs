mod config;
mod engine;
mod handlers;
mod models;
mod router;
mod seeds;
mod store;
mod utils;

use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use models::Snapshot;
use store::Store;

/// Application state shared across handlers
pub struct AppState {
    pub store: Store,
    pub config: Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "template_stacks=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let cfg = Config::load();
    tracing::info!("Starting Template Stacks Server");
    tracing::info!("Listen: {}", cfg.listen_addr);
    tracing::info!("Frontend: {}", cfg.frontend_dir);

    let snapshot = if cfg.seed_demo_data {
        seeds::demo_snapshot()
    } else {
        Snapshot::default()
    };
    tracing::info!(
        "Loaded {} template(s), {} stack(s), {} object(s)",
        snapshot.templates.len(),
        snapshot.stacks.len(),
        snapshot.entities.len()
    );

    // Create app state
    let state = Arc::new(AppState {
        store: Store::new(snapshot),
        config: cfg.clone(),
    });

    // Build router
    let app = router::build(state, &cfg.frontend_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    tracing::info!("Template Stacks listening on {}", cfg.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Template Stacks shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
