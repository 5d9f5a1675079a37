//! Configuration types for fetching, enrichment and storage.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default relevance prompt sent ahead of every post.
pub const DEFAULT_RELEVANCE_PROMPT: &str = "You are screening posts from public job channels. \
Answer YES if the post advertises a specific job opening, contract or hiring call, \
otherwise answer NO. Reply with a single word.";

/// Configuration for the feed fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Delay between consecutive channel fetches.
    pub channel_pacing: Duration,

    /// Maximum accepted messages extracted from one channel page.
    pub max_messages_per_page: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            channel_pacing: Duration::from_secs(1),
            max_messages_per_page: 20,
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel_pacing(mut self, pacing: Duration) -> Self {
        self.channel_pacing = pacing;
        self
    }

    pub fn with_max_messages_per_page(mut self, max: usize) -> Self {
        self.max_messages_per_page = max;
        self
    }
}

/// Configuration for the enrichment pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Prompt prefix for the yes/no relevance call.
    pub relevance_prompt: String,

    /// Delay inserted before every reasoning call after the first in a batch.
    pub rate_limit_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            relevance_prompt: DEFAULT_RELEVANCE_PROMPT.to_string(),
            rate_limit_delay: Duration::from_secs(10),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relevance_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.relevance_prompt = prompt.into();
        self
    }

    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }
}

/// Configuration for resume document generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeConfig {
    pub enabled: bool,
    pub template_path: PathBuf,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            template_path: PathBuf::from("resume-template.tex"),
        }
    }
}

/// Backend selector values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Csv,
    Json,
    Sqlite,
    Notion,
    Memory,
}

impl BackendKind {
    /// The backend used whenever the configured one is unknown or fails.
    pub const DEFAULT: BackendKind = BackendKind::Csv;

    /// Parse a selector value; unknown values yield `None`.
    pub fn parse(selector: &str) -> Option<Self> {
        match selector.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "sqlite" => Some(Self::Sqlite),
            "notion" => Some(Self::Notion),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Sqlite => "sqlite",
            Self::Notion => "notion",
            Self::Memory => "memory",
        }
    }
}

/// Notion database credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotionConfig {
    pub integration_token: String,
    pub database_id: String,
    pub version: String,
}

impl NotionConfig {
    pub fn is_configured(&self) -> bool {
        !self.integration_token.is_empty() && !self.database_id.is_empty()
    }
}

/// Configuration for the storage router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Raw selector as configured (`csv`, `json`, `sqlite`, `notion`, `memory`).
    pub selector: String,

    /// Base path for file backends; `.csv` / `.json` is appended.
    pub file_path: String,

    /// sqlx connection URL for the SQLite backend.
    pub sqlite_url: String,

    pub notion: NotionConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            selector: BackendKind::DEFAULT.as_str().to_string(),
            file_path: "job_listings".to_string(),
            sqlite_url: "sqlite://jobs.db?mode=rwc".to_string(),
            notion: NotionConfig {
                version: "2022-06-28".to_string(),
                ..Default::default()
            },
        }
    }
}

impl StorageConfig {
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = path.into();
        self
    }
}

/// Top-level harvester configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvesterConfig {
    /// Channel names as configured; `@` prefixes and blanks are tolerated.
    pub channels: Vec<String>,
    pub fetch: FetchConfig,
    pub pipeline: PipelineConfig,
    pub resume: ResumeConfig,
    pub storage: StorageConfig,
}
