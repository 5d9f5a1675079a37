//! CSV file backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::SecondsFormat;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::StorageResult;
use crate::traits::backend::StorageBackend;
use crate::types::job::JobRecord;

pub const CSV_HEADER: &str =
    "Posted At,Company,Role,Location,Salary,URL,Raw Snippet,Source Channel,Resume Link\n";

/// Appends one quoted line per record to `<base>.csv`.
pub struct CsvBackend {
    path: PathBuf,
}

impl CsvBackend {
    /// `base_path` gets a `.csv` extension appended.
    pub fn new(base_path: impl AsRef<str>) -> Self {
        Self {
            path: PathBuf::from(format!("{}.csv", base_path.as_ref())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_header(&self) -> StorageResult<()> {
        if !tokio::fs::try_exists(&self.path).await? {
            tokio::fs::write(&self.path, CSV_HEADER).await?;
            info!(path = %self.path.display(), "Created CSV file");
        }
        Ok(())
    }
}

/// Quote a field, doubling embedded quotes.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

pub fn format_csv_line(record: &JobRecord) -> String {
    let posted_at = record.posted_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let fields: [&str; 9] = [
        posted_at.as_str(),
        &record.company,
        &record.role,
        &record.location,
        &record.salary,
        &record.url,
        &record.raw_snippet,
        &record.source_channel,
        record.resume_link.as_deref().unwrap_or(""),
    ];
    let mut line = fields.iter().map(|f| quote(f)).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

#[async_trait]
impl StorageBackend for CsvBackend {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn init(&self) -> StorageResult<()> {
        self.ensure_header().await
    }

    async fn save(&self, record: &JobRecord) -> StorageResult<()> {
        self.ensure_header().await?;
        let mut file = OpenOptions::new().append(true).open(&self.path).await?;
        file.write_all(format_csv_line(record).as_bytes()).await?;
        file.flush().await?;
        info!(job = %record.label(), "Saved job to CSV");
        Ok(())
    }

    async fn describe(&self) -> StorageResult<String> {
        Ok(format!("CSV file: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::job::ExtractedFields;
    use chrono::{TimeZone, Utc};

    fn record(company: &str) -> JobRecord {
        JobRecord::from_fields(
            ExtractedFields {
                company: company.into(),
                role: "Engineer".into(),
                raw_snippet: "Say \"hi\", please".into(),
                ..Default::default()
            },
            "telegram_channel_jobs",
            Utc.with_ymd_and_hms(2024, 8, 25, 4, 15, 51).unwrap(),
        )
    }

    #[test]
    fn test_line_quotes_every_field() {
        let line = format_csv_line(&record("Acme"));
        assert_eq!(
            line,
            "\"2024-08-25T04:15:51Z\",\"Acme\",\"Engineer\",\"\",\"\",\"\",\"Say \"\"hi\"\", please\",\"telegram_channel_jobs\",\"\"\n"
        );
    }

    #[tokio::test]
    async fn test_init_then_save_appends_after_header() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("jobs");
        let backend = CsvBackend::new(base.to_string_lossy());

        backend.init().await.unwrap();
        backend.init().await.unwrap();
        backend.save(&record("Acme")).await.unwrap();
        backend.save(&record("Globex")).await.unwrap();

        let contents = std::fs::read_to_string(backend.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(format!("{}\n", lines[0]), CSV_HEADER);
        assert!(lines[2].contains("\"Globex\""));
    }

    #[tokio::test]
    async fn test_save_without_init_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let backend = CsvBackend::new(dir.path().join("jobs").to_string_lossy());

        backend.save(&record("Acme")).await.unwrap();

        let contents = std::fs::read_to_string(backend.path()).unwrap();
        assert!(contents.starts_with("Posted At,"));
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let backend = CsvBackend::new(dir.path().join("missing/jobs").to_string_lossy());
        assert!(backend.save(&record("Acme")).await.is_err());
    }
}
