//! Persistence backends and the router that chooses between them.

pub mod csv;
pub mod json;
pub mod memory;
pub mod notion;
pub mod router;
pub mod sqlite;

pub use csv::CsvBackend;
pub use json::JsonBackend;
pub use memory::MemoryBackend;
pub use notion::NotionBackend;
pub use router::{SaveOutcome, StorageRouter};
pub use sqlite::SqliteBackend;
