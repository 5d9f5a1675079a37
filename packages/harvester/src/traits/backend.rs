//! Storage backend trait.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::job::JobRecord;

/// A persistence target for job records.
///
/// One concrete type per backend. The router decides which backend a save
/// goes to and what happens when it fails.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name for log lines (`csv`, `notion`, ...).
    fn name(&self) -> &'static str;

    /// Prepare the backend (create files, tables, verify credentials).
    async fn init(&self) -> StorageResult<()>;

    /// Persist one record.
    async fn save(&self, record: &JobRecord) -> StorageResult<()>;

    /// Human-readable description of the backend and its target.
    async fn describe(&self) -> StorageResult<String>;
}
