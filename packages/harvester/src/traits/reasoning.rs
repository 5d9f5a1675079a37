//! Reasoning service trait for text generation.

use async_trait::async_trait;

use crate::error::ServiceResult;

/// A text-in, text-out generation service.
///
/// Used for relevance classification, field extraction and resume
/// customization. Implementations should return the raw model text; callers
/// own all prompt construction and response parsing.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn generate(&self, prompt: &str) -> ServiceResult<String>;
}
