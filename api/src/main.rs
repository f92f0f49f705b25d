use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use api::{AppState, build_router, config::ServerConfig};
use application::{CandidateService, StatsService};
use infrastructure::{FilesystemAttachmentStore, InMemoryCandidateRepository};

// Application entry point
#[tokio::main]
async fn main() {
    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let config = ServerConfig::from_env();
    info!(?config, "Configuration loaded.");

    // --- Dependency Injection ---
    // 1. Create infrastructure components
    let attachment_store = match FilesystemAttachmentStore::open(&config.upload_dir).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(
                "Failed to prepare upload directory {}: {}",
                config.upload_dir.display(),
                e
            );
            std::process::exit(1);
        }
    };
    let candidate_repository = Arc::new(InMemoryCandidateRepository::new());
    info!("Infrastructure components initialized.");

    // 2. Create application services, injecting dependencies
    let candidate_service = Arc::new(CandidateService::new(
        candidate_repository.clone(),
        attachment_store,
    ));
    let stats_service = Arc::new(StatsService::new(
        candidate_repository,
        config.upload_dir.clone(),
    ));
    info!("Application services initialized.");

    // 3. Create the application state and routes
    let app = build_router(
        AppState::new(candidate_service, stats_service),
        config.max_upload_bytes,
    );
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server starting on {}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
