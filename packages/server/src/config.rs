use anyhow::{Context, Result};
use dotenvy::dotenv;
use harvester::services::gemini::DEFAULT_MODEL;
use harvester::services::latex::DEFAULT_SERVICE_URL;
use harvester::services::CloudinaryConfig;
use harvester::types::config::DEFAULT_RELEVANCE_PROMPT;
use harvester::{
    FetchConfig, HarvesterConfig, NotionConfig, PipelineConfig, ResumeConfig, StorageConfig,
};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub telegram_channels: Vec<String>,
    pub poll_interval_minutes: u64,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub relevance_prompt: String,
    pub rate_limit_delay_seconds: u64,
    pub channel_pacing_millis: u64,
    pub storage_type: String,
    pub storage_file_path: String,
    pub sqlite_database_url: String,
    pub notion_token: String,
    pub notion_database_id: String,
    pub notion_version: String,
    pub resume_enabled: bool,
    pub resume_template_path: PathBuf,
    pub latex_service_url: String,
    pub cloudinary: CloudinaryConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            port: or("PORT", "8080")
                .parse()
                .context("PORT must be a valid number")?,
            telegram_channels: parse_channels(&or("TELEGRAM_CHANNELS", "")),
            poll_interval_minutes: or("POLL_INTERVAL_MINUTES", "30")
                .parse()
                .context("POLL_INTERVAL_MINUTES must be a valid number")?,
            gemini_api_key: get("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?,
            gemini_model: or("GEMINI_MODEL", DEFAULT_MODEL),
            relevance_prompt: or("GEMINI_RELEVANCE_PROMPT", DEFAULT_RELEVANCE_PROMPT),
            rate_limit_delay_seconds: or("RATE_LIMIT_DELAY_SECONDS", "10")
                .parse()
                .context("RATE_LIMIT_DELAY_SECONDS must be a valid number")?,
            channel_pacing_millis: or("CHANNEL_PACING_MILLIS", "1000")
                .parse()
                .context("CHANNEL_PACING_MILLIS must be a valid number")?,
            storage_type: or("STORAGE_TYPE", "notion"),
            storage_file_path: or("STORAGE_FILE_PATH", "job_listings"),
            sqlite_database_url: or("SQLITE_DATABASE_URL", "sqlite://jobs.db?mode=rwc"),
            notion_token: or("NOTION_TOKEN", ""),
            notion_database_id: or("NOTION_DATABASE_ID", ""),
            notion_version: or("NOTION_VERSION", "2022-06-28"),
            resume_enabled: or("RESUME_GENERATE_ENABLED", "false")
                .trim()
                .eq_ignore_ascii_case("true"),
            resume_template_path: PathBuf::from(or("RESUME_TEMPLATE_PATH", "resume-template.tex")),
            latex_service_url: or("LATEX_SERVICE_URL", DEFAULT_SERVICE_URL),
            cloudinary: CloudinaryConfig {
                cloud_name: or("CLOUDINARY_CLOUD_NAME", ""),
                api_key: or("CLOUDINARY_API_KEY", ""),
                api_secret: or("CLOUDINARY_API_SECRET", ""),
            },
        })
    }

    /// Library-side configuration for the harvester core.
    pub fn harvester(&self) -> HarvesterConfig {
        HarvesterConfig {
            channels: self.telegram_channels.clone(),
            fetch: FetchConfig::default()
                .with_channel_pacing(Duration::from_millis(self.channel_pacing_millis)),
            pipeline: PipelineConfig::default()
                .with_relevance_prompt(self.relevance_prompt.clone())
                .with_rate_limit_delay(Duration::from_secs(self.rate_limit_delay_seconds)),
            resume: ResumeConfig {
                enabled: self.resume_enabled,
                template_path: self.resume_template_path.clone(),
            },
            storage: StorageConfig {
                selector: self.storage_type.clone(),
                file_path: self.storage_file_path.clone(),
                sqlite_url: self.sqlite_database_url.clone(),
                notion: NotionConfig {
                    integration_token: self.notion_token.clone(),
                    database_id: self.notion_database_id.clone(),
                    version: self.notion_version.clone(),
                },
            },
        }
    }
}

/// Split a comma-separated channel list, dropping blanks.
pub fn parse_channels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.poll_interval_minutes, 30);
        assert_eq!(config.storage_type, "notion");
        assert!(config.telegram_channels.is_empty());
        assert!(!config.resume_enabled);

        let harvester = config.harvester();
        assert_eq!(harvester.pipeline.rate_limit_delay, Duration::from_secs(10));
        assert_eq!(harvester.fetch.channel_pacing, Duration::from_millis(1000));
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let result = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k"), ("PORT", "http")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("TELEGRAM_CHANNELS", "@remote_jobs, rustjobs,,"),
            ("STORAGE_TYPE", "sqlite"),
            ("RESUME_GENERATE_ENABLED", "TRUE"),
        ]))
        .unwrap();
        assert_eq!(config.telegram_channels, vec!["@remote_jobs", "rustjobs"]);
        assert_eq!(config.harvester().storage.selector, "sqlite");
        assert!(config.resume_enabled);
    }
}
