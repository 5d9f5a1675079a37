//! Dependency wiring: turns [`Config`] into a running [`Orchestrator`].

pub mod scheduled_tasks;

use std::sync::Arc;

use anyhow::{Context, Result};
use harvester::services::{CloudinaryStore, GeminiClient, LatexOnlineCompiler, TelegramFeedSource};
use harvester::{
    EnrichmentPipeline, FeedFetcher, HarvesterConfig, Orchestrator, ReasoningService,
    ResumeGenerator, StorageRouter, TokioPacer,
};

use crate::config::Config;

pub use scheduled_tasks::start_scheduler;

/// Build the orchestrator and every adapter behind it.
///
/// Only a missing or invalid reasoning client is fatal. Storage and resume
/// problems degrade with a warning.
pub async fn build_orchestrator(config: &Config) -> Result<Arc<Orchestrator>> {
    let settings = config.harvester();
    let pacer = Arc::new(TokioPacer);

    let feed = TelegramFeedSource::new().context("Failed to create channel feed client")?;
    let fetcher = FeedFetcher::new(Arc::new(feed), pacer.clone(), settings.fetch.clone());

    let reasoning: Arc<dyn ReasoningService> = Arc::new(
        GeminiClient::new(config.gemini_api_key.clone())
            .context("Failed to create reasoning client")?
            .with_model(config.gemini_model.clone()),
    );

    let router = Arc::new(StorageRouter::from_config(&settings.storage));
    let mut pipeline = EnrichmentPipeline::new(
        reasoning.clone(),
        router,
        pacer,
        settings.pipeline.clone(),
    );

    if let Some(generator) = build_resume_generator(config, &settings, reasoning).await {
        pipeline = pipeline.with_resume(generator);
    }

    if settings.channels.is_empty() {
        tracing::warn!("TELEGRAM_CHANNELS is empty, scheduled sweeps will do nothing");
    }

    Ok(Arc::new(Orchestrator::new(
        settings.channels.clone(),
        fetcher,
        pipeline,
    )))
}

async fn build_resume_generator(
    config: &Config,
    settings: &HarvesterConfig,
    reasoning: Arc<dyn ReasoningService>,
) -> Option<ResumeGenerator> {
    if !settings.resume.enabled {
        tracing::info!("Resume generation disabled");
        return None;
    }

    let template = match ResumeGenerator::load_template(&settings.resume.template_path).await {
        Ok(template) => template,
        Err(e) => {
            tracing::warn!(error = %e, "Resume generation disabled: template unavailable");
            return None;
        }
    };

    let compiler = match LatexOnlineCompiler::new(config.latex_service_url.clone()) {
        Ok(compiler) => compiler,
        Err(e) => {
            tracing::warn!(error = %e, "Resume generation disabled: compiler unavailable");
            return None;
        }
    };

    let store = match CloudinaryStore::new(config.cloudinary.clone()) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(error = %e, "Resume generation disabled: object store not configured");
            return None;
        }
    };

    tracing::info!(template = %settings.resume.template_path.display(), "Resume generation enabled");
    Some(ResumeGenerator::new(
        reasoning,
        Arc::new(compiler),
        Arc::new(store),
        template,
    ))
}
