//! Job records produced by the enrichment pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A structured job posting ready for persistence.
///
/// Immutable after creation except for the single optional resume link,
/// which is attached through [`JobRecord::with_resume_link`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub company: String,
    pub role: String,
    pub location: String,
    pub url: String,
    pub salary: String,
    pub source_channel: String,
    pub raw_snippet: String,
    pub posted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_link: Option<String>,
}

impl JobRecord {
    /// Build a record from extracted fields.
    pub fn from_fields(
        fields: ExtractedFields,
        source_channel: impl Into<String>,
        posted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            company: fields.company,
            role: fields.role,
            location: fields.location,
            url: fields.url,
            salary: fields.salary,
            source_channel: source_channel.into(),
            raw_snippet: fields.raw_snippet,
            posted_at,
            resume_link: None,
        }
    }

    /// Attach the generated resume link.
    pub fn with_resume_link(mut self, link: impl Into<String>) -> Self {
        self.resume_link = Some(link.into());
        self
    }

    /// `Company - Role` label for log lines.
    pub fn label(&self) -> String {
        format!("{} - {}", self.company, self.role)
    }
}

/// Fields returned by the extraction prompt.
///
/// Every field is optional in the response; missing or null values become
/// empty strings and present values are trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExtractedFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub salary: String,
    #[serde(default, rename = "rawSnippet", deserialize_with = "lenient_string")]
    pub raw_snippet: String,
}

/// Accept strings, numbers, booleans or null and render them as a trimmed string.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let fields: ExtractedFields = serde_json::from_str(r#"{"company":"Acme"}"#).unwrap();
        assert_eq!(fields.company, "Acme");
        assert_eq!(fields.role, "");
        assert_eq!(fields.raw_snippet, "");
    }

    #[test]
    fn test_values_are_trimmed_and_nulls_emptied() {
        let fields: ExtractedFields = serde_json::from_str(
            r#"{"company":"  Acme ","salary":150000,"url":null,"rawSnippet":" apply now "}"#,
        )
        .unwrap();
        assert_eq!(fields.company, "Acme");
        assert_eq!(fields.salary, "150000");
        assert_eq!(fields.url, "");
        assert_eq!(fields.raw_snippet, "apply now");
    }

    #[test]
    fn test_record_round_trips_through_json_with_camel_case() {
        let record = JobRecord::from_fields(
            ExtractedFields {
                company: "Acme".into(),
                role: "Engineer".into(),
                ..Default::default()
            },
            "telegram_channel_jobs",
            Utc::now(),
        )
        .with_resume_link("https://cdn.example.com/r.pdf");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["sourceChannel"], "telegram_channel_jobs");
        assert_eq!(json["resumeLink"], "https://cdn.example.com/r.pdf");
    }
}
