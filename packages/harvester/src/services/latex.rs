//! Remote LaTeX compiler.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::traits::document::DocumentCompiler;
use crate::types::message::truncate;

/// Default synchronous build endpoint.
pub const DEFAULT_SERVICE_URL: &str = "https://latex.ytotech.com/builds/sync";

const PDF_MAGIC: &[u8] = b"%PDF";

/// Compiles LaTeX with `pdflatex` through a remote build service.
#[derive(Clone)]
pub struct LatexOnlineCompiler {
    client: Client,
    service_url: String,
}

impl LatexOnlineCompiler {
    pub fn new(service_url: impl Into<String>) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        Ok(Self {
            client,
            service_url: service_url.into(),
        })
    }
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

#[async_trait]
impl DocumentCompiler for LatexOnlineCompiler {
    async fn compile(&self, markup: &str) -> ServiceResult<Vec<u8>> {
        if markup.trim().is_empty() {
            return Err(ServiceError::Validation("document is empty".into()));
        }
        debug!(chars = markup.len(), "Compiling LaTeX document");

        let body = json!({
            "compiler": "pdflatex",
            "resources": [{ "main": true, "content": markup }],
        });

        let response = self
            .client
            .post(&self.service_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            warn!(status = %status, body = %truncate(&text, 200), "LaTeX service error");
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message: truncate(&text, 200),
            });
        }
        if !is_pdf(&bytes) {
            let text = String::from_utf8_lossy(&bytes);
            warn!(body = %truncate(&text, 200), "LaTeX service returned non-PDF content");
            return Err(ServiceError::Validation("response is not a PDF".into()));
        }

        info!(bytes = bytes.len(), "LaTeX compilation successful");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(b"%PDF-1.5\n..."));
        assert!(!is_pdf(b"<html>error</html>"));
        assert!(!is_pdf(b"%PD"));
    }

    #[tokio::test]
    async fn test_empty_document_rejected_before_request() {
        let compiler = LatexOnlineCompiler::new("http://127.0.0.1:9/never").unwrap();
        let err = compiler.compile("   ").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
