//! Feed source for public channel previews (`https://t.me/s/<channel>`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::debug;

use crate::error::{FeedError, FeedResult};
use crate::traits::feed::FeedSource;

const DEFAULT_BASE_URL: &str = "https://t.me/s";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches channel preview pages with browser-like headers.
#[derive(Clone)]
pub struct TelegramFeedSource {
    client: Client,
    base_url: String,
}

impl TelegramFeedSource {
    pub fn new() -> FeedResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FeedError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn page_url(&self, channel: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), channel)
    }
}

/// Map a non-success status to the matching feed error.
pub fn status_error(channel: &str, status: StatusCode) -> FeedError {
    let channel = channel.to_string();
    match status {
        StatusCode::NOT_FOUND => FeedError::NotFound { channel },
        StatusCode::FORBIDDEN => FeedError::Forbidden { channel },
        StatusCode::TOO_MANY_REQUESTS => FeedError::RateLimited { channel },
        other => FeedError::Http {
            channel,
            status: other.as_u16(),
        },
    }
}

#[async_trait]
impl FeedSource for TelegramFeedSource {
    async fn fetch_page(&self, channel: &str) -> FeedResult<String> {
        let url = self.page_url(channel);
        debug!(url = %url, "Fetching channel page");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(channel, status));
        }

        response
            .text()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error("jobs", StatusCode::NOT_FOUND),
            FeedError::NotFound { .. }
        ));
        assert!(matches!(
            status_error("jobs", StatusCode::TOO_MANY_REQUESTS),
            FeedError::RateLimited { .. }
        ));
        assert!(matches!(
            status_error("jobs", StatusCode::BAD_GATEWAY),
            FeedError::Http { status: 502, .. }
        ));
    }

    #[test]
    fn test_page_url() {
        let source = TelegramFeedSource::new().unwrap();
        assert_eq!(source.page_url("remote_jobs"), "https://t.me/s/remote_jobs");
    }
}
