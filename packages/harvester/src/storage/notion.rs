//! Notion database backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::traits::backend::StorageBackend;
use crate::types::config::NotionConfig;
use crate::types::job::JobRecord;
use crate::types::message::truncate;

const DEFAULT_BASE_URL: &str = "https://api.notion.com";

/// Longest raw snippet sent as rich text.
pub const MAX_SNIPPET_CHARS: usize = 2000;

/// Creates one page per record in a Notion database.
///
/// Expected columns: Company (title), Role, Location, Salary, Source,
/// Raw Snippet (text), URL and Resume Link (url), Posted Date (date).
pub struct NotionBackend {
    client: Client,
    base_url: String,
    config: NotionConfig,
}

impl NotionBackend {
    pub fn new(config: NotionConfig) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StorageError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            config,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.config.integration_token)
            .header("Notion-Version", &self.config.version)
    }

    async fn check(response: reqwest::Response) -> StorageResult<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(StorageError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }
}

fn rich_text(text: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": text } }] })
}

/// Page-creation payload for `record`. Empty fields are omitted.
pub fn page_payload(database_id: &str, record: &JobRecord) -> Value {
    let mut properties = Map::new();

    if !record.company.is_empty() {
        properties.insert(
            "Company".into(),
            json!({ "title": [{ "text": { "content": record.company } }] }),
        );
    }
    for (name, value) in [
        ("Role", &record.role),
        ("Location", &record.location),
        ("Salary", &record.salary),
        ("Source", &record.source_channel),
    ] {
        if !value.is_empty() {
            properties.insert(name.into(), rich_text(value));
        }
    }
    if !record.url.is_empty() {
        properties.insert("URL".into(), json!({ "url": record.url }));
    }
    properties.insert(
        "Posted Date".into(),
        json!({ "date": { "start": record.posted_at.format("%Y-%m-%d").to_string() } }),
    );
    if !record.raw_snippet.is_empty() {
        properties.insert(
            "Raw Snippet".into(),
            rich_text(&truncate(&record.raw_snippet, MAX_SNIPPET_CHARS)),
        );
    }
    if let Some(link) = record.resume_link.as_deref().filter(|l| !l.is_empty()) {
        properties.insert("Resume Link".into(), json!({ "url": link }));
    }

    json!({
        "parent": { "database_id": database_id },
        "properties": Value::Object(properties),
    })
}

#[async_trait]
impl StorageBackend for NotionBackend {
    fn name(&self) -> &'static str {
        "notion"
    }

    async fn init(&self) -> StorageResult<()> {
        let path = format!("/v1/databases/{}", self.config.database_id);
        let response = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;
        Self::check(response).await?;
        info!(database_id = %self.config.database_id, "Notion database reachable");
        Ok(())
    }

    async fn save(&self, record: &JobRecord) -> StorageResult<()> {
        let payload = page_payload(&self.config.database_id, record);
        let response = self
            .request(reqwest::Method::POST, "/v1/pages")
            .json(&payload)
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;
        let body = Self::check(response).await?;

        debug!(response_len = body.len(), "Notion page created");
        info!(job = %record.label(), has_resume = record.resume_link.is_some(), "Saved job to Notion");
        Ok(())
    }

    async fn describe(&self) -> StorageResult<String> {
        let token_prefix: String = self.config.integration_token.chars().take(15).collect();
        Ok(format!(
            "Notion Database: {} (Integration: {}...)",
            self.config.database_id, token_prefix
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::job::ExtractedFields;
    use chrono::{TimeZone, Utc};

    fn record() -> JobRecord {
        JobRecord::from_fields(
            ExtractedFields {
                company: "Acme".into(),
                role: "Engineer".into(),
                url: "https://acme.example/jobs".into(),
                raw_snippet: "x".repeat(2500),
                ..Default::default()
            },
            "telegram_channel_jobs",
            Utc.with_ymd_and_hms(2024, 8, 25, 4, 15, 51).unwrap(),
        )
    }

    #[test]
    fn test_payload_properties() {
        let payload = page_payload("db-1", &record());
        let props = &payload["properties"];

        assert_eq!(payload["parent"]["database_id"], "db-1");
        assert_eq!(props["Company"]["title"][0]["text"]["content"], "Acme");
        assert_eq!(props["URL"]["url"], "https://acme.example/jobs");
        assert_eq!(props["Posted Date"]["date"]["start"], "2024-08-25");
        assert!(props.get("Location").is_none());
        assert!(props.get("Resume Link").is_none());
    }

    #[test]
    fn test_payload_truncates_snippet() {
        let payload = page_payload("db-1", &record());
        let snippet = payload["properties"]["Raw Snippet"]["rich_text"][0]["text"]["content"]
            .as_str()
            .unwrap();
        assert_eq!(snippet.chars().count(), MAX_SNIPPET_CHARS);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn test_payload_includes_resume_link() {
        let payload = page_payload("db-1", &record().with_resume_link("https://cdn/r.pdf"));
        assert_eq!(payload["properties"]["Resume Link"]["url"], "https://cdn/r.pdf");
    }

    #[tokio::test]
    async fn test_describe_shows_database_and_token_prefix() {
        let backend = NotionBackend::new(NotionConfig {
            integration_token: "secret_abcdefghijklmnopqrstuvwxyz".into(),
            database_id: "db-1".into(),
            version: "2022-06-28".into(),
        })
        .unwrap();

        let description = backend.describe().await.unwrap();
        assert_eq!(description, "Notion Database: db-1 (Integration: secret_abcdefgh...)");
    }
}
