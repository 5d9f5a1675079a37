//! Feed source trait for retrieving channel pages.

use async_trait::async_trait;

use crate::error::FeedResult;

/// Retrieves the rendered public page of a channel.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the raw HTML for `channel` (normalized name, no `@`).
    ///
    /// Transport failures are reported as [`crate::error::FeedError`]
    /// variants so the fetcher can log a status-specific line.
    async fn fetch_page(&self, channel: &str) -> FeedResult<String>;
}
