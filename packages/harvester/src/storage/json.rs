//! JSON file backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::StorageResult;
use crate::traits::backend::StorageBackend;
use crate::types::job::JobRecord;

/// Keeps all records in a pretty-printed JSON array at `<base>.json`.
///
/// Each save loads the array, appends and rewrites the file.
pub struct JsonBackend {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonBackend {
    pub fn new(base_path: impl AsRef<str>) -> Self {
        Self {
            path: PathBuf::from(format!("{}.json", base_path.as_ref())),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Existing records; an unreadable file starts a fresh array.
    pub async fn load(&self) -> Vec<JobRecord> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read JSON file, starting fresh");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Could not parse JSON file, starting fresh");
            Vec::new()
        })
    }
}

#[async_trait]
impl StorageBackend for JsonBackend {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn init(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn save(&self, record: &JobRecord) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await;
        records.push(record.clone());
        let body = serde_json::to_string_pretty(&records)?;
        tokio::fs::write(&self.path, body).await?;
        info!(job = %record.label(), total = records.len(), "Saved job to JSON");
        Ok(())
    }

    async fn describe(&self) -> StorageResult<String> {
        Ok(format!("JSON file: {}", self.path.display()))
    }
}
