//! Channel Job Harvester
//!
//! Polls public messaging-channel web previews, keeps only unseen posts,
//! asks a reasoning service which of them are job openings, extracts
//! structured fields, optionally generates a tailored resume, and persists
//! the result through a storage router with a CSV fallback.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use harvester::{EnrichmentPipeline, FeedFetcher, Orchestrator, StorageRouter, TokioPacer};
//! use harvester::services::{GeminiClient, TelegramFeedSource};
//!
//! let pacer = Arc::new(TokioPacer);
//! let fetcher = FeedFetcher::new(Arc::new(TelegramFeedSource::new()?), pacer.clone(), Default::default());
//! let router = Arc::new(StorageRouter::from_config(&config.storage));
//! let pipeline = EnrichmentPipeline::new(Arc::new(GeminiClient::new(key)?), router, pacer, Default::default());
//!
//! let orchestrator = Orchestrator::new(channels, fetcher, pipeline);
//! let outcome = orchestrator.run_cycle_now().await;
//! ```
//!
//! # Modules
//!
//! - [`cursor`] - Per-channel incremental-fetch cursors
//! - [`feed`] - Channel page fetching, parsing and pre-filtering
//! - [`pipeline`] - Relevance, extraction, resume generation and persistence
//! - [`storage`] - Storage backends and the fallback router
//! - [`services`] - HTTP adapters (feed, reasoning, compiler, object store)
//! - [`orchestrator`] - Cycle control, counters and status
//! - [`testing`] - Mock implementations for testing

pub mod clock;
pub mod cursor;
pub mod error;
pub mod feed;
pub mod orchestrator;
pub mod pacing;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use clock::{Clock, SystemClock};
pub use cursor::CursorStore;
pub use error::{FeedError, HarvestError, Result, ServiceError, StorageError};
pub use feed::{is_candidate_post, parse_channel_page, FeedFetcher, SweepResult};
pub use orchestrator::Orchestrator;
pub use pacing::{Pacer, TokioPacer};
pub use pipeline::{EnrichmentPipeline, MessageOutcome, ResumeGenerator};
pub use storage::{SaveOutcome, StorageRouter};
pub use traits::{
    backend::StorageBackend,
    document::{DocumentCompiler, ObjectStore, UploadMetadata},
    feed::FeedSource,
    reasoning::ReasoningService,
};
pub use types::{
    config::{
        BackendKind, FetchConfig, HarvesterConfig, NotionConfig, PipelineConfig, ResumeConfig,
        StorageConfig,
    },
    job::{ExtractedFields, JobRecord},
    message::RawMessage,
    report::{
        BatchCounters, BatchReport, CycleOutcome, ProcessingCounters, SingleMessageOutcome,
        StatusSnapshot,
    },
};
