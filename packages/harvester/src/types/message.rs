//! Raw channel messages produced by the feed fetcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message scraped from a channel page.
///
/// Immutable once produced; lives for one pipeline pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Cleaned message text
    pub content: String,

    /// When the message was posted (or a synthesized ordering timestamp)
    pub posted_at: DateTime<Utc>,

    /// Normalized channel name (no leading `@`)
    pub channel: String,
}

impl RawMessage {
    pub fn new(
        content: impl Into<String>,
        posted_at: DateTime<Utc>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            posted_at,
            channel: channel.into(),
        }
    }

    /// First `max` characters of the content, for log lines.
    pub fn preview(&self, max: usize) -> String {
        truncate(&self.content, max)
    }
}

/// Truncate to `max` characters, appending an ellipsis when shortened.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
