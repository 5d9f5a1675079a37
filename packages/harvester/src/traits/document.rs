//! Document compiler and object store traits.

use async_trait::async_trait;

use crate::error::ServiceResult;

/// Compiles document markup into a binary document.
#[async_trait]
pub trait DocumentCompiler: Send + Sync {
    /// Compile `markup`, returning the document bytes.
    ///
    /// Implementations must reject output that is not a PDF.
    async fn compile(&self, markup: &str) -> ServiceResult<Vec<u8>>;
}

/// Descriptive metadata attached to an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub company: String,
    pub role: String,
    /// Milliseconds since the epoch, used to keep object names unique
    pub timestamp_millis: i64,
}

/// Stores a document and returns a publicly reachable link.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, metadata: &UploadMetadata) -> ServiceResult<String>;
}
