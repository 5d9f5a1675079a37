//! HTTP adapters for the external services the harvester consumes.

pub mod cloudinary;
pub mod gemini;
pub mod latex;
pub mod telegram;

pub use cloudinary::{CloudinaryConfig, CloudinaryStore};
pub use gemini::GeminiClient;
pub use latex::LatexOnlineCompiler;
pub use telegram::TelegramFeedSource;
