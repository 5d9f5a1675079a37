//! Resume document generation: customize, validate, compile, upload.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::prompts::{format_resume_prompt, missing_marker, strip_latex_fences};
use crate::clock::{Clock, SystemClock};
use crate::error::{HarvestError, Result, ServiceError, ServiceResult};
use crate::traits::document::{DocumentCompiler, ObjectStore, UploadMetadata};
use crate::traits::reasoning::ReasoningService;
use crate::types::job::JobRecord;

/// Produces a tailored resume PDF for a job and returns its public link.
///
/// Rate limiting is the caller's concern; `generate` issues exactly one
/// reasoning call.
pub struct ResumeGenerator {
    reasoning: Arc<dyn ReasoningService>,
    compiler: Arc<dyn DocumentCompiler>,
    store: Arc<dyn ObjectStore>,
    template: String,
    clock: Arc<dyn Clock>,
}

impl ResumeGenerator {
    pub fn new(
        reasoning: Arc<dyn ReasoningService>,
        compiler: Arc<dyn DocumentCompiler>,
        store: Arc<dyn ObjectStore>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            reasoning,
            compiler,
            store,
            template: template.into(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Read the template file.
    pub async fn load_template(path: &Path) -> Result<String> {
        let template = tokio::fs::read_to_string(path).await.map_err(|e| {
            HarvestError::Config(format!(
                "failed to read resume template {}: {}",
                path.display(),
                e
            ))
        })?;
        if template.trim().is_empty() {
            return Err(HarvestError::Config(format!(
                "resume template {} is empty",
                path.display()
            )));
        }
        info!(path = %path.display(), "Resume template loaded");
        Ok(template)
    }

    /// Customize, compile and upload a resume for `record`.
    pub async fn generate(&self, record: &JobRecord) -> ServiceResult<String> {
        info!(company = %record.company, role = %record.role, "Generating resume");

        let prompt = format_resume_prompt(
            &record.company,
            &record.role,
            &record.location,
            &record.salary,
            &record.raw_snippet,
            &self.template,
        );
        let response = self.reasoning.generate(&prompt).await?;
        let markup = strip_latex_fences(&response);
        if markup.is_empty() {
            return Err(ServiceError::EmptyResponse);
        }
        if let Some(marker) = missing_marker(markup) {
            return Err(ServiceError::Validation(format!("document is missing {}", marker)));
        }
        debug!(chars = markup.len(), "Customized markup validated");

        let pdf = self.compiler.compile(markup).await?;
        if pdf.is_empty() {
            return Err(ServiceError::EmptyResponse);
        }

        let metadata = UploadMetadata {
            company: record.company.clone(),
            role: record.role.clone(),
            timestamp_millis: self.clock.now().timestamp_millis(),
        };
        let link = self.store.upload(pdf, &metadata).await?;
        if link.trim().is_empty() {
            warn!(company = %record.company, "Upload returned no link");
            return Err(ServiceError::EmptyResponse);
        }

        info!(company = %record.company, link = %link, "Resume uploaded");
        Ok(link)
    }
}
