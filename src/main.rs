use std::sync::Arc;

use img2pdf_service::{
    adapters::{routes::build_router, state::AppState},
    domain::config::server::ServerConfig,
    services::{self, TempStorage},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().expect("ERROR: Invalid server configuration");

    // Fail at startup rather than on the first request if the directory is unusable
    let storage = TempStorage::init(&config.upload_dir)
        .await
        .expect("ERROR: Failed to prepare upload directory. Check UPLOAD_DIR and permissions.");
    tracing::info!("Using upload directory {}", storage.dir().display());

    let app_state = AppState {
        storage: Arc::new(storage),
        document_generator: services::create_document_generator(),
    };

    let router = build_router(app_state, &config);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("Failed to bind to port");

    tracing::info!("Backend listening on port {}", config.port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        _ = terminate => tracing::info!("Received terminate signal"),
    }

    tracing::info!("Shutting down gracefully...");
}
