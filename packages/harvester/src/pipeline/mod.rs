//! The enrichment pipeline and its supporting pieces.

pub mod enrich;
pub mod gate;
pub mod prompts;
pub mod resume;

pub use enrich::{channel_source, EnrichmentPipeline, MessageOutcome, MANUAL_SOURCE};
pub use gate::RateGate;
pub use resume::ResumeGenerator;
