// Main entry point for the harvester server

use std::sync::Arc;

use anyhow::{Context, Result};
use harvester::Orchestrator;
use server_core::kernel::{build_orchestrator, start_scheduler};
use server_core::{server::build_app, Config};
use tokio_cron_scheduler::JobScheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,harvester=debug,server=debug,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Channel Job Harvester");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        channels = ?config.telegram_channels,
        poll_interval_minutes = config.poll_interval_minutes,
        storage = %config.storage_type,
        model = %config.gemini_model,
        rate_limit_delay_seconds = config.rate_limit_delay_seconds,
        resume_enabled = config.resume_enabled,
        "Configuration loaded"
    );

    let orchestrator = build_orchestrator(&config)
        .await
        .context("Failed to build harvester")?;

    // Prepare storage; failures degrade to the fallback backend
    let storage = orchestrator.initialize_storage().await;
    tracing::info!(storage = %storage, "Storage initialized");

    let scheduler = start_scheduler(orchestrator.clone(), config.poll_interval_minutes)
        .await
        .context("Failed to start scheduler")?;

    let app = build_app(orchestrator.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/api/jobs/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(orchestrator, scheduler))
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl-C, then stop in-flight work and the scheduler.
async fn shutdown_signal(orchestrator: Arc<Orchestrator>, mut scheduler: JobScheduler) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");

    orchestrator.shutdown();
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler shutdown failed");
    }
}
