use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskrelay_api::config::ServerConfig;
use taskrelay_api::router::build_app_router;
use taskrelay_api::state::AppState;
use taskrelay_core::shutdown::shutdown_signal;
use taskrelay_pipeline::{Dispatcher, Pipeline, ShutdownCoordinator};
use taskrelay_processing::ProcessingClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "taskrelay_api=debug,taskrelay_pipeline=debug,tower_http=debug".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });
    tracing::info!(
        host = %config.host,
        port = config.port,
        processing_url = %config.processing_url,
        queue_capacity = config.queue_capacity,
        max_attempts = config.max_attempts,
        retry_backoff_ms = config.retry_backoff_ms,
        upload_dir = %config.upload_dir.display(),
        "Loaded server configuration",
    );

    // --- Processing client ---
    let processor = ProcessingClient::new(
        config.processing_url.clone(),
        config.processing_timeout(),
        config.classification(),
    )
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build processing client");
        std::process::exit(1);
    });

    // --- Pipeline + dispatcher ---
    let (pipeline, receiver) = Pipeline::new(config.queue_capacity);
    let dispatcher = Dispatcher::new(
        receiver,
        pipeline.store(),
        processor,
        config.retry_policy(),
    );
    let coordinator = ShutdownCoordinator::start(pipeline.clone(), dispatcher);
    tracing::info!("Task dispatcher spawned");

    // --- Router ---
    let addr = SocketAddr::new(config.host, config.port);
    let shutdown_timeout = config.shutdown_timeout();
    let app = build_app_router(AppState::new(pipeline, config));

    // --- Start server ---
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            if let Err(e) = coordinator.wait(shutdown_timeout).await {
                tracing::error!(error = %e, "Dispatcher did not stop cleanly");
            }
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "Starting server");

    let trigger = coordinator.trigger();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Cancel the dispatcher and close intake before the listener stops.
            trigger.fire();
        })
        .await;

    if let Err(e) = served {
        tracing::error!(error = %e, "Server error");
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, waiting for dispatcher");

    match coordinator.wait(shutdown_timeout).await {
        Ok(report) => tracing::info!(
            completed = report.completed,
            failed = report.failed,
            interrupted = report.interrupted,
            abandoned = report.abandoned,
            "Dispatcher stopped",
        ),
        Err(e) => tracing::error!(error = %e, "Dispatcher did not stop cleanly"),
    }

    tracing::info!("Graceful shutdown complete");
}
