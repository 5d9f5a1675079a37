//! In-memory backend for tests and `memory` storage.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::traits::backend::StorageBackend;
use crate::types::job::JobRecord;

/// Keeps saved records in a vector. Data is lost on restart.
///
/// The fail switch makes every `save` return an error, which is how the
/// router's fallback path is exercised.
#[derive(Default)]
pub struct MemoryBackend {
    records: RwLock<Vec<JobRecord>>,
    failing: AtomicBool,
    save_attempts: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose saves always fail.
    pub fn failing() -> Self {
        let backend = Self::new();
        backend.set_failing(true);
        backend
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<JobRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `save` calls, successful or not.
    pub fn save_attempts(&self) -> usize {
        self.save_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn init(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn save(&self, record: &JobRecord) -> StorageResult<()> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory backend set to fail".into()));
        }
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    async fn describe(&self) -> StorageResult<String> {
        Ok(format!("In-memory store ({} jobs)", self.len()))
    }
}
