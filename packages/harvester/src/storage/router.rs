//! Storage router: backend selection and fallback policy.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::{CsvBackend, JsonBackend, MemoryBackend, NotionBackend, SqliteBackend};
use crate::error::StorageResult;
use crate::traits::backend::StorageBackend;
use crate::types::config::{BackendKind, StorageConfig};
use crate::types::job::JobRecord;

/// Where a record ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Saved by the configured backend
    Primary,
    /// Primary failed; saved by the fallback backend
    Fallback,
    /// Both backends failed; the record is lost
    Dropped,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        !matches!(self, SaveOutcome::Dropped)
    }
}

/// Routes saves to the configured backend and retries once on the fallback.
pub struct StorageRouter {
    primary: Arc<dyn StorageBackend>,
    fallback: Arc<dyn StorageBackend>,
}

impl StorageRouter {
    pub fn new(primary: Arc<dyn StorageBackend>, fallback: Arc<dyn StorageBackend>) -> Self {
        Self { primary, fallback }
    }

    /// Build the router from configuration.
    ///
    /// An unknown selector, or a backend that cannot be constructed, degrades
    /// to the CSV backend with a warning. CSV is always the fallback.
    pub fn from_config(config: &StorageConfig) -> Self {
        let fallback: Arc<dyn StorageBackend> = Arc::new(CsvBackend::new(&config.file_path));

        let kind = BackendKind::parse(&config.selector).unwrap_or_else(|| {
            warn!(selector = %config.selector, "Unknown storage type, defaulting to CSV");
            BackendKind::DEFAULT
        });

        let primary: Arc<dyn StorageBackend> = match kind {
            BackendKind::Csv => fallback.clone(),
            BackendKind::Json => Arc::new(JsonBackend::new(&config.file_path)),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
            BackendKind::Sqlite => match SqliteBackend::new(&config.sqlite_url) {
                Ok(backend) => Arc::new(backend),
                Err(e) => {
                    warn!(error = %e, url = %config.sqlite_url, "SQLite unavailable, defaulting to CSV");
                    fallback.clone()
                }
            },
            BackendKind::Notion if !config.notion.is_configured() => {
                warn!("Notion token or database id missing, defaulting to CSV");
                fallback.clone()
            }
            BackendKind::Notion => match NotionBackend::new(config.notion.clone()) {
                Ok(backend) => Arc::new(backend),
                Err(e) => {
                    warn!(error = %e, "Notion client unavailable, defaulting to CSV");
                    fallback.clone()
                }
            },
        };

        info!(backend = primary.name(), "Storage router configured");
        Self::new(primary, fallback)
    }

    pub fn backend_name(&self) -> &'static str {
        self.primary.name()
    }

    /// Prepare the configured backend.
    pub async fn init(&self) -> StorageResult<()> {
        self.primary.init().await
    }

    /// Save through the primary backend, falling back exactly once.
    ///
    /// Never returns an error: both failures are logged and reported as
    /// [`SaveOutcome::Dropped`].
    pub async fn save(&self, record: &JobRecord) -> SaveOutcome {
        let primary_err = match self.primary.save(record).await {
            Ok(()) => return SaveOutcome::Primary,
            Err(e) => e,
        };
        error!(
            backend = self.primary.name(),
            company = %record.company,
            error = %primary_err,
            "Failed to save job, falling back"
        );

        match self.fallback.save(record).await {
            Ok(()) => {
                info!(backend = self.fallback.name(), job = %record.label(), "Saved job via fallback");
                SaveOutcome::Fallback
            }
            Err(fallback_err) => {
                error!(
                    primary = self.primary.name(),
                    primary_error = %primary_err,
                    fallback = self.fallback.name(),
                    fallback_error = %fallback_err,
                    company = %record.company,
                    "Fallback save failed too, record dropped"
                );
                SaveOutcome::Dropped
            }
        }
    }

    /// Description of the configured backend. Errors are rendered inline.
    pub async fn describe(&self) -> String {
        match self.primary.describe().await {
            Ok(description) => description,
            Err(e) => format!("Storage error ({}): {}", self.primary.name(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::job::ExtractedFields;
    use chrono::Utc;

    fn record() -> JobRecord {
        JobRecord::from_fields(
            ExtractedFields {
                company: "Acme".into(),
                ..Default::default()
            },
            "manual_input",
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary = Arc::new(MemoryBackend::new());
        let fallback = Arc::new(MemoryBackend::new());
        let router = StorageRouter::new(primary.clone(), fallback.clone());

        assert_eq!(router.save(&record()).await, SaveOutcome::Primary);
        assert_eq!(primary.len(), 1);
        assert_eq!(fallback.save_attempts(), 0);
    }

    #[tokio::test]
    async fn test_failure_uses_fallback_once() {
        let primary = Arc::new(MemoryBackend::failing());
        let fallback = Arc::new(MemoryBackend::new());
        let router = StorageRouter::new(primary.clone(), fallback.clone());

        assert_eq!(router.save(&record()).await, SaveOutcome::Fallback);
        assert_eq!(primary.save_attempts(), 1);
        assert_eq!(fallback.save_attempts(), 1);
        assert_eq!(fallback.records()[0].company, "Acme");
    }

    #[tokio::test]
    async fn test_both_failing_drops_record() {
        let primary = Arc::new(MemoryBackend::failing());
        let fallback = Arc::new(MemoryBackend::failing());
        let router = StorageRouter::new(primary.clone(), fallback.clone());

        let outcome = router.save(&record()).await;

        assert_eq!(outcome, SaveOutcome::Dropped);
        assert!(!outcome.is_saved());
        assert_eq!(fallback.save_attempts(), 1);
    }

    #[tokio::test]
    async fn test_unknown_selector_defaults_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::default()
            .with_selector("google-sheets")
            .with_file_path(dir.path().join("jobs").to_string_lossy());

        let router = StorageRouter::from_config(&config);

        assert_eq!(router.backend_name(), "csv");
        router.init().await.unwrap();
        assert!(router.describe().await.starts_with("CSV file:"));
    }

    #[tokio::test]
    async fn test_unconfigured_notion_defaults_to_csv() {
        let config = StorageConfig::default().with_selector("notion");
        assert_eq!(StorageRouter::from_config(&config).backend_name(), "csv");
    }

    #[tokio::test]
    async fn test_describe_renders_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            selector: "sqlite".into(),
            // Parent directory does not exist, so connecting fails
            sqlite_url: format!("sqlite://{}?mode=rwc", dir.path().join("no/such/dir/jobs.db").display()),
            ..Default::default()
        };
        let router = StorageRouter::from_config(&config);

        let description = router.describe().await;

        assert!(description.starts_with("Storage error (sqlite)"));
    }
}
