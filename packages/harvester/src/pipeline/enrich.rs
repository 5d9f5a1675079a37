//! Enrichment pipeline: relevance, extraction, resume, persistence.
//!
//! Messages are processed strictly one after another. Each message exits at
//! the first failing or negative stage; failures are logged and counted but
//! never abort the batch. Only the stop signal ends a batch early.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::gate::RateGate;
use super::prompts::{format_extract_prompt, format_relevance_prompt, is_affirmative, strip_json_fences};
use super::resume::ResumeGenerator;
use crate::error::{HarvestError, Result, ServiceError};
use crate::pacing::Pacer;
use crate::storage::{SaveOutcome, StorageRouter};
use crate::traits::reasoning::ReasoningService;
use crate::types::config::PipelineConfig;
use crate::types::job::{ExtractedFields, JobRecord};
use crate::types::message::RawMessage;
use crate::types::report::{BatchCounters, BatchReport};

/// Source channel label for operator-submitted text.
pub const MANUAL_SOURCE: &str = "manual_input";

/// Source channel label for a scraped channel.
pub fn channel_source(channel: &str) -> String {
    format!("telegram_channel_{}", channel)
}

/// How far one message got through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    NotRelevant,
    /// Relevant, but field extraction failed
    Unextracted,
    /// Record built and persisted
    Saved(JobRecord),
    /// Record built, but every backend failed
    Dropped(JobRecord),
}

/// The multi-stage enrichment pipeline.
pub struct EnrichmentPipeline {
    reasoning: Arc<dyn ReasoningService>,
    resume: Option<ResumeGenerator>,
    storage: Arc<StorageRouter>,
    pacer: Arc<dyn Pacer>,
    config: PipelineConfig,
}

impl EnrichmentPipeline {
    pub fn new(
        reasoning: Arc<dyn ReasoningService>,
        storage: Arc<StorageRouter>,
        pacer: Arc<dyn Pacer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            reasoning,
            resume: None,
            storage,
            pacer,
            config,
        }
    }

    /// Enable resume generation for relevant, extracted jobs.
    pub fn with_resume(mut self, generator: ResumeGenerator) -> Self {
        self.resume = Some(generator);
        self
    }

    pub fn resume_enabled(&self) -> bool {
        self.resume.is_some()
    }

    pub fn storage(&self) -> &Arc<StorageRouter> {
        &self.storage
    }

    /// Start a rate gate for a new batch.
    pub fn gate<'a>(&self, cancel: &'a CancellationToken) -> RateGate<'a> {
        RateGate::new(self.pacer.clone(), self.config.rate_limit_delay, cancel)
    }

    /// Run every message through the pipeline.
    ///
    /// Stops between messages once `cancel` fires; counters cover completed
    /// work only.
    pub async fn process_batch(&self, messages: &[RawMessage], cancel: &CancellationToken) -> BatchReport {
        let mut report = BatchReport::default();
        let mut gate = self.gate(cancel);

        info!(messages = messages.len(), "Processing batch");

        for message in messages {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let source = channel_source(&message.channel);
            debug!(channel = %message.channel, preview = %message.preview(80), "Processing message");
            match self
                .process(&message.content, &source, message.posted_at, &mut gate, &mut report.counters)
                .await
            {
                Ok(MessageOutcome::Saved(record)) => report.saved.push(record),
                Ok(_) => {}
                Err(e) if e.is_cancelled() => {
                    info!(channel = %message.channel, "Batch interrupted during rate-limit delay");
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    warn!(channel = %message.channel, error = %e, "Message processing failed");
                }
            }
        }

        if cancel.is_cancelled() {
            report.cancelled = true;
        }

        let c = &report.counters;
        info!(
            processed = c.processed,
            relevant = c.relevant,
            saved = c.saved,
            unextracted = c.unextracted,
            dropped = c.dropped,
            cancelled = report.cancelled,
            "Batch complete"
        );
        report
    }

    /// Run one message through every stage.
    ///
    /// Returns `Err(Cancelled)` only when the stop signal fired during a
    /// delay ahead of relevance or extraction; a stop during the resume delay
    /// still persists the record, without a link.
    pub async fn process(
        &self,
        content: &str,
        source_channel: &str,
        posted_at: DateTime<Utc>,
        gate: &mut RateGate<'_>,
        counters: &mut BatchCounters,
    ) -> Result<MessageOutcome> {
        gate.before_call().await?;
        counters.processed += 1;

        if !self.classify(content).await {
            debug!(source = %source_channel, "Message not relevant");
            return Ok(MessageOutcome::NotRelevant);
        }
        counters.relevant += 1;

        gate.before_call().await?;
        let mut record = match self.extract(content, source_channel, posted_at).await {
            Ok(record) => record,
            Err(e) => {
                warn!(source = %source_channel, error = %e, "Relevant message but extraction failed");
                counters.unextracted += 1;
                return Ok(MessageOutcome::Unextracted);
            }
        };
        info!(source = %source_channel, company = %record.company, role = %record.role, "Job extracted");

        if let Some(generator) = &self.resume {
            match gate.before_call().await {
                Ok(()) => match generator.generate(&record).await {
                    Ok(link) => record = record.with_resume_link(link),
                    Err(e) => {
                        warn!(company = %record.company, error = %e, "Resume generation failed, saving without link")
                    }
                },
                Err(_) => {
                    info!(company = %record.company, "Resume generation skipped, stop requested");
                }
            }
        }

        match self.storage.save(&record).await {
            SaveOutcome::Primary | SaveOutcome::Fallback => {
                counters.saved += 1;
                Ok(MessageOutcome::Saved(record))
            }
            SaveOutcome::Dropped => {
                counters.dropped += 1;
                Ok(MessageOutcome::Dropped(record))
            }
        }
    }

    /// Yes/no relevance call. Any failure counts as "not relevant".
    pub async fn classify(&self, content: &str) -> bool {
        let prompt = format_relevance_prompt(&self.config.relevance_prompt, content);
        match self.reasoning.generate(&prompt).await {
            Ok(answer) => {
                debug!(answer = %answer.trim(), "Relevance response");
                is_affirmative(&answer)
            }
            Err(ServiceError::RateLimited) => {
                warn!(
                    delay_secs = self.config.rate_limit_delay.as_secs(),
                    "Relevance call rate limited, treating as not relevant"
                );
                false
            }
            Err(e) => {
                warn!(error = %e, "Relevance call failed, treating as not relevant");
                false
            }
        }
    }

    /// Structured field extraction.
    pub async fn extract(
        &self,
        content: &str,
        source_channel: &str,
        posted_at: DateTime<Utc>,
    ) -> Result<JobRecord> {
        let response = self.reasoning.generate(&format_extract_prompt(content)).await?;
        let json = strip_json_fences(&response);
        if json.is_empty() {
            return Err(HarvestError::Service(ServiceError::EmptyResponse));
        }
        let fields: ExtractedFields = serde_json::from_str(json)?;
        Ok(JobRecord::from_fields(fields, source_channel, posted_at))
    }
}
