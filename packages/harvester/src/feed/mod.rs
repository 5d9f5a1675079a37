//! Channel feed retrieval, page parsing and pre-filtering.

pub mod fetcher;
pub mod filter;
pub mod parse;

pub use fetcher::{FeedFetcher, SweepResult};
pub use filter::is_candidate_post;
pub use parse::{is_channel_unavailable, parse_channel_page};
