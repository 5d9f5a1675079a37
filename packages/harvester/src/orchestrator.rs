//! Orchestrator: owns the harvester state and runs cycles.
//!
//! A cycle is one sweep over the configured channels followed by one
//! enrichment batch. Scheduled cycles, on-demand cycles and single-message
//! runs share a lock so they never overlap.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::cursor::{normalize_channel, CursorStore};
use crate::feed::FeedFetcher;
use crate::pipeline::{EnrichmentPipeline, MessageOutcome, MANUAL_SOURCE};
use crate::types::report::{
    BatchCounters, CycleOutcome, ProcessingCounters, SingleMessageOutcome, StatusSnapshot,
};

/// Name reported by the status endpoint.
pub const SERVICE_NAME: &str = "Channel Job Harvester";

pub struct Orchestrator {
    channels: Vec<String>,
    cursors: CursorStore,
    counters: RwLock<ProcessingCounters>,
    fetcher: FeedFetcher,
    pipeline: EnrichmentPipeline,
    cycle_lock: Mutex<()>,
    shutdown: CancellationToken,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    pub fn new(channels: Vec<String>, fetcher: FeedFetcher, pipeline: EnrichmentPipeline) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            channels: channels.iter().filter_map(|c| normalize_channel(c)).collect(),
            cursors: CursorStore::with_clock(clock.clone()),
            counters: RwLock::new(ProcessingCounters::default()),
            fetcher,
            pipeline,
            cycle_lock: Mutex::new(()),
            shutdown: CancellationToken::new(),
            clock,
        }
    }

    /// Replace the clock used for cursors and run timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cursors = CursorStore::with_clock(clock.clone());
        self.clock = clock;
        self
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn cursors(&self) -> &CursorStore {
        &self.cursors
    }

    pub fn counters(&self) -> ProcessingCounters {
        self.counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Token fired by [`Orchestrator::shutdown`].
    pub fn cancel_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run a full cycle, waiting for any running cycle to finish first.
    pub async fn run_cycle_now(&self) -> CycleOutcome {
        let _guard = self.cycle_lock.lock().await;
        info!("Manual processing triggered");
        self.run_cycle().await
    }

    /// Run a full cycle unless one is already in progress.
    ///
    /// Returns `None` when the cycle was skipped.
    pub async fn run_scheduled_cycle(&self) -> Option<CycleOutcome> {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            info!("Previous cycle still running, skipping scheduled run");
            return None;
        };
        info!("Starting scheduled job processing");
        Some(self.run_cycle().await)
    }

    async fn run_cycle(&self) -> CycleOutcome {
        let started = self.clock.now();

        let sweep = self
            .fetcher
            .fetch_new_messages(&self.channels, &self.cursors, &self.shutdown)
            .await;
        let found = sweep.messages.len();

        if sweep.cancelled {
            warn!(new_messages = found, "Sweep interrupted, skipping enrichment");
            self.record_run(&BatchCounters::default());
            return CycleOutcome::interrupted(&BatchCounters::default(), found, started);
        }

        if found == 0 {
            info!("No new messages found");
            self.record_run(&BatchCounters::default());
            return CycleOutcome::completed(&BatchCounters::default(), 0, started);
        }

        let report = self.pipeline.process_batch(&sweep.messages, &self.shutdown).await;
        self.record_run(&report.counters);

        info!(
            processed = report.counters.processed,
            saved = report.counters.saved,
            "Cycle completed"
        );

        if report.cancelled {
            CycleOutcome::interrupted(&report.counters, found, started)
        } else {
            CycleOutcome::completed(&report.counters, found, started)
        }
    }

    fn record_run(&self, batch: &BatchCounters) {
        let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
        counters.record_run(self.clock.now(), batch);
    }

    /// Run one operator-supplied message through the pipeline.
    ///
    /// Does not touch cursors or the global counters.
    pub async fn process_single_message(&self, content: &str) -> SingleMessageOutcome {
        let _guard = self.cycle_lock.lock().await;
        info!(preview = %crate::types::message::truncate(content, 100), "Processing manual message");

        let mut gate = self.pipeline.gate(&self.shutdown);
        let mut counters = BatchCounters::default();
        let result = self
            .pipeline
            .process(content, MANUAL_SOURCE, self.clock.now(), &mut gate, &mut counters)
            .await;

        match result {
            Ok(MessageOutcome::Saved(record)) => SingleMessageOutcome::saved(content, record),
            Ok(MessageOutcome::Dropped(record)) => SingleMessageOutcome::not_saved(content, record),
            Ok(MessageOutcome::Unextracted) => SingleMessageOutcome::unextracted(content),
            Ok(MessageOutcome::NotRelevant) => SingleMessageOutcome::not_relevant(content),
            Err(e) => {
                warn!(error = %e, "Manual message processing interrupted");
                SingleMessageOutcome::interrupted(content, counters.relevant > 0)
            }
        }
    }

    /// Initialize the configured backend and describe it.
    ///
    /// Failures are logged; the router falls back per save.
    pub async fn initialize_storage(&self) -> String {
        let router = self.pipeline.storage();
        if let Err(e) = router.init().await {
            error!(backend = router.backend_name(), error = %e, "Storage initialization failed");
        }
        let description = router.describe().await;
        info!(storage = %description, "Storage ready");
        description
    }

    pub async fn storage_description(&self) -> String {
        self.pipeline.storage().describe().await
    }

    /// Forget every cursor; the next sweep looks back the default window.
    pub fn reset_channel_cursors(&self) {
        self.cursors.reset_all();
        info!("Channel timestamps reset");
    }

    pub fn reset_counters(&self) {
        self.counters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
        info!("Processing counters reset");
    }

    pub async fn status(&self) -> StatusSnapshot {
        let counters = self.counters();
        StatusSnapshot {
            service_name: SERVICE_NAME.to_string(),
            last_run: counters.last_run,
            total_processed: counters.processed_today,
            total_saved: counters.saved_today,
            channels_configured: self.channels.len(),
            channels: self.channels.iter().map(|c| format!("@{}", c)).collect(),
            channel_cursors: self.cursors.snapshot(),
            storage: self.storage_description().await,
            cycle_running: self.cycle_lock.try_lock().is_err(),
        }
    }

    /// Fire the stop signal. In-flight delays end and the batch stops
    /// before the next message.
    pub fn shutdown(&self) {
        info!("Shutdown requested");
        self.shutdown.cancel();
    }
}
