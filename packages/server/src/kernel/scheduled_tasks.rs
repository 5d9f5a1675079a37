//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! One harvest runs at startup, then a repeated job runs a cycle every poll
//! interval. Overlap is prevented by the orchestrator's cycle lock: a tick
//! that fires while a cycle is still running is skipped.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use harvester::Orchestrator;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Start the periodic harvest job and kick off the first harvest.
pub async fn start_scheduler(
    orchestrator: Arc<Orchestrator>,
    poll_interval_minutes: u64,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let interval = Duration::from_secs(poll_interval_minutes.max(1) * 60);

    let periodic = orchestrator.clone();
    let harvest_job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let orchestrator = periodic.clone();
        Box::pin(async move {
            run_periodic_harvest(&orchestrator).await;
        })
    })?;

    scheduler.add(harvest_job).await?;
    scheduler.start().await?;

    tracing::info!(
        interval_minutes = poll_interval_minutes.max(1),
        "Scheduled tasks started (periodic harvest)"
    );

    spawn_initial_harvest(orchestrator);
    Ok(scheduler)
}

/// Run one harvest in the background without waiting for the first tick.
pub fn spawn_initial_harvest(orchestrator: Arc<Orchestrator>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Running initial harvest");
        run_periodic_harvest(&orchestrator).await;
    })
}

async fn run_periodic_harvest(orchestrator: &Orchestrator) {
    match orchestrator.run_scheduled_cycle().await {
        Some(outcome) => tracing::info!(
            status = %outcome.status,
            new_messages = outcome.new_messages_found,
            processed = outcome.processed_count,
            saved = outcome.saved_count,
            "Periodic harvest finished"
        ),
        None => tracing::debug!("Periodic harvest skipped"),
    }
}
