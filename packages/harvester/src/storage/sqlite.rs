//! SQLite backend.

use async_trait::async_trait;
use chrono::SecondsFormat;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::StorageResult;
use crate::traits::backend::StorageBackend;
use crate::types::job::JobRecord;

/// Stores records in a `jobs` table.
pub struct SqliteBackend {
    pool: SqlitePool,
    url: String,
}

impl SqliteBackend {
    /// Create a backend for `database_url`.
    ///
    /// The pool connects lazily; the first real connection happens in
    /// [`StorageBackend::init`] or the first save.
    ///
    /// # Example URLs
    /// - `sqlite://jobs.db?mode=rwc` - file database, created if missing
    /// - `sqlite::memory:` - ephemeral
    pub fn new(database_url: &str) -> StorageResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy(database_url)?;
        Ok(Self {
            pool,
            url: database_url.to_string(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_migrations(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                posted_at TEXT,
                company TEXT,
                role TEXT,
                location TEXT,
                salary TEXT,
                url TEXT,
                raw_snippet TEXT,
                source_channel TEXT,
                resume_link TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn job_count(&self) -> StorageResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn init(&self) -> StorageResult<()> {
        self.run_migrations().await?;
        info!(url = %self.url, "SQLite database initialized");
        Ok(())
    }

    async fn save(&self, record: &JobRecord) -> StorageResult<()> {
        self.run_migrations().await?;
        sqlx::query(
            r#"
            INSERT INTO jobs (posted_at, company, role, location, salary, url, raw_snippet, source_channel, resume_link)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.posted_at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .bind(&record.company)
        .bind(&record.role)
        .bind(&record.location)
        .bind(&record.salary)
        .bind(&record.url)
        .bind(&record.raw_snippet)
        .bind(&record.source_channel)
        .bind(record.resume_link.as_deref())
        .execute(&self.pool)
        .await?;

        info!(job = %record.label(), "Saved job to SQLite");
        Ok(())
    }

    async fn describe(&self) -> StorageResult<String> {
        let count = self.job_count().await?;
        Ok(format!("SQLite database: {} (Jobs stored: {})", self.url, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::job::ExtractedFields;
    use chrono::Utc;

    async fn test_backend(dir: &tempfile::TempDir) -> SqliteBackend {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("jobs.db").display());
        let backend = SqliteBackend::new(&url).unwrap();
        backend.init().await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_save_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let backend = test_backend(&dir).await;
        let record = JobRecord::from_fields(
            ExtractedFields {
                company: "Acme".into(),
                role: "Engineer".into(),
                ..Default::default()
            },
            "telegram_channel_jobs",
            Utc::now(),
        )
        .with_resume_link("https://cdn.example.com/r.pdf");

        backend.save(&record).await.unwrap();
        backend.save(&record).await.unwrap();

        assert_eq!(backend.job_count().await.unwrap(), 2);
        let link: Option<String> = sqlx::query_scalar("SELECT resume_link FROM jobs LIMIT 1")
            .fetch_one(backend.pool())
            .await
            .unwrap();
        assert_eq!(link.as_deref(), Some("https://cdn.example.com/r.pdf"));
    }

    #[tokio::test]
    async fn test_describe_includes_count() {
        let dir = tempfile::tempdir().unwrap();
        let backend = test_backend(&dir).await;
        let description = backend.describe().await.unwrap();
        assert!(description.ends_with("(Jobs stored: 0)"));
    }
}
