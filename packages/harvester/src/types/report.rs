//! Counters and outcome objects returned to operators.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::job::JobRecord;
use super::message::truncate;

/// Counters accumulated over one enrichment batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounters {
    /// Messages that entered the pipeline
    pub processed: usize,
    /// Messages the reasoning service classified as job posts
    pub relevant: usize,
    /// Records persisted (primary or fallback backend)
    pub saved: usize,
    /// Relevant messages whose field extraction failed
    pub unextracted: usize,
    /// Records lost because both primary and fallback saves failed
    pub dropped: usize,
}

/// Result of running a batch through the pipeline.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub counters: BatchCounters,
    /// Records that reached storage, in processing order
    pub saved: Vec<JobRecord>,
    /// The batch stopped early on a stop signal
    pub cancelled: bool,
}

/// Process-lifetime totals, reset only by an operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingCounters {
    pub last_run: Option<DateTime<Utc>>,
    pub processed_today: usize,
    pub saved_today: usize,
}

impl ProcessingCounters {
    /// Fold one finished run into the totals.
    pub fn record_run(&mut self, at: DateTime<Utc>, counters: &BatchCounters) {
        self.last_run = Some(at);
        self.processed_today += counters.processed;
        self.saved_today += counters.saved;
    }

    pub fn reset(&mut self) {
        self.processed_today = 0;
        self.saved_today = 0;
    }
}

/// Response for a full fetch-then-enrich cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub status: String,
    pub message: String,
    pub processed_count: usize,
    pub relevant_count: usize,
    pub saved_count: usize,
    pub new_messages_found: usize,
    pub processing_time: DateTime<Utc>,
    pub cancelled: bool,
}

impl CycleOutcome {
    pub fn completed(
        counters: &BatchCounters,
        new_messages_found: usize,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: "success".to_string(),
            message: "Messages processed successfully".to_string(),
            processed_count: counters.processed,
            relevant_count: counters.relevant,
            saved_count: counters.saved,
            new_messages_found,
            processing_time: at,
            cancelled: false,
        }
    }

    pub fn interrupted(
        counters: &BatchCounters,
        new_messages_found: usize,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: "cancelled".to_string(),
            message: "Processing stopped early; partial results recorded".to_string(),
            cancelled: true,
            ..Self::completed(counters, new_messages_found, at)
        }
    }
}

/// Response for processing one operator-supplied message.
#[derive(Debug, Clone, Serialize)]
pub struct SingleMessageOutcome {
    pub status: String,
    pub message: String,
    pub message_content: String,
    pub is_relevant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_details: Option<JobRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SingleMessageOutcome {
    fn base(content: &str, is_relevant: bool) -> Self {
        Self {
            status: String::new(),
            message: String::new(),
            message_content: truncate(content, 100),
            is_relevant,
            job_details: None,
            resume_link: None,
            error: None,
        }
    }

    pub fn saved(content: &str, record: JobRecord) -> Self {
        Self {
            status: "success".to_string(),
            message: "Job details extracted and saved".to_string(),
            resume_link: record.resume_link.clone(),
            job_details: Some(record),
            ..Self::base(content, true)
        }
    }

    pub fn not_saved(content: &str, record: JobRecord) -> Self {
        Self {
            status: "error".to_string(),
            message: "Job details extracted but every storage backend failed".to_string(),
            error: Some("storage unavailable".to_string()),
            job_details: Some(record),
            ..Self::base(content, true)
        }
    }

    pub fn unextracted(content: &str) -> Self {
        Self {
            status: "warning".to_string(),
            message: "Message is relevant but failed to extract job details".to_string(),
            ..Self::base(content, true)
        }
    }

    pub fn not_relevant(content: &str) -> Self {
        Self {
            status: "info".to_string(),
            message: "Message is not job-relevant".to_string(),
            ..Self::base(content, false)
        }
    }

    pub fn interrupted(content: &str, is_relevant: bool) -> Self {
        Self {
            status: "error".to_string(),
            message: "Processing interrupted".to_string(),
            error: Some("cancelled".to_string()),
            ..Self::base(content, is_relevant)
        }
    }
}

/// Point-in-time view of the harvester for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub service_name: String,
    pub last_run: Option<DateTime<Utc>>,
    pub total_processed: usize,
    pub total_saved: usize,
    pub channels_configured: usize,
    pub channels: Vec<String>,
    /// Cursor per channel, keyed `@name`
    pub channel_cursors: BTreeMap<String, DateTime<Utc>>,
    pub storage: String,
    pub cycle_running: bool,
}
