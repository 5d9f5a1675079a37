//! Cloudinary raw-file upload.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::traits::document::{ObjectStore, UploadMetadata};

const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com/v1_1";

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Account credentials.
#[derive(Debug, Clone, Default)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryConfig {
    pub fn is_configured(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

/// Object store that uploads documents as Cloudinary raw resources.
#[derive(Clone)]
pub struct CloudinaryStore {
    client: Client,
    config: CloudinaryConfig,
    base_url: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> ServiceResult<Self> {
        if !config.is_configured() {
            return Err(ServiceError::Config(
                "cloud name, api key and api secret are required".into(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        Ok(Self {
            client,
            config,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/raw/upload", self.base_url, self.config.cloud_name)
    }
}

/// Lowercase, collapse non-alphanumerics to `_`, trim underscores.
pub fn clean_name(input: &str) -> String {
    let lowered = input.to_lowercase();
    let cleaned = NON_ALNUM.replace_all(&lowered, "_");
    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `resumes/<company>_<role>_<millis>`
pub fn public_id(metadata: &UploadMetadata) -> String {
    format!(
        "resumes/{}_{}_{}",
        clean_name(&metadata.company),
        clean_name(&metadata.role),
        metadata.timestamp_millis
    )
}

/// Upload parameters that take part in the signature.
pub fn signed_params(metadata: &UploadMetadata) -> BTreeMap<&'static str, String> {
    let mut params = BTreeMap::new();
    params.insert("public_id", public_id(metadata));
    params.insert(
        "context",
        format!(
            "company={}|role={}|generated_at={}",
            metadata.company.replace(['|', '='], " "),
            metadata.role.replace(['|', '='], " "),
            metadata.timestamp_millis
        ),
    );
    params.insert(
        "tags",
        format!("resume,job-application,{}", clean_name(&metadata.company)),
    );
    params.insert("timestamp", (metadata.timestamp_millis / 1000).to_string());
    params
}

/// SHA-256 hex signature over `k=v&k=v` (sorted) followed by the secret.
pub fn sign(params: &BTreeMap<&'static str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ObjectStore for CloudinaryStore {
    async fn upload(&self, bytes: Vec<u8>, metadata: &UploadMetadata) -> ServiceResult<String> {
        if bytes.is_empty() {
            return Err(ServiceError::Validation("document is empty".into()));
        }
        let size = bytes.len();
        let params = signed_params(metadata);
        let signature = sign(&params, &self.config.api_secret);

        let file = Part::bytes(bytes)
            .file_name("resume.pdf")
            .mime_str("application/pdf")
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in &params {
            form = form.text(*key, value.clone());
        }

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Cloudinary upload failed");
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;
        let url = body
            .secure_url
            .filter(|u| !u.is_empty())
            .ok_or(ServiceError::EmptyResponse)?;

        info!(bytes = size, public_id = %params["public_id"], "Resume uploaded to Cloudinary");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> UploadMetadata {
        UploadMetadata {
            company: "Acme, Inc.".into(),
            role: "Senior Rust Engineer".into(),
            timestamp_millis: 1_724_560_000_123,
        }
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("Acme, Inc."), "acme_inc");
        assert_eq!(clean_name("  --  "), "unknown");
    }

    #[test]
    fn test_public_id() {
        assert_eq!(
            public_id(&metadata()),
            "resumes/acme_inc_senior_rust_engineer_1724560000123"
        );
    }

    #[test]
    fn test_signature_is_sha256_over_sorted_params() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1315060510".to_string());
        params.insert("public_id", "sample_image".to_string());

        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(b"public_id=sample_image&timestamp=1315060510abcd");
            hex::encode(hasher.finalize())
        };
        assert_eq!(sign(&params, "abcd"), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn test_signed_params_use_seconds() {
        let params = signed_params(&metadata());
        assert_eq!(params["timestamp"], "1724560000");
        assert!(params["tags"].ends_with(",acme_inc"));
    }

    #[test]
    fn test_requires_credentials() {
        assert!(CloudinaryStore::new(CloudinaryConfig::default()).is_err());
    }
}
