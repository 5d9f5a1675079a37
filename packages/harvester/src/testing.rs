//! Testing utilities including mock implementations.
//!
//! These let applications and tests drive the harvester without network
//! calls or wall-clock waits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::{FeedError, FeedResult, HarvestError, Result, ServiceError, ServiceResult};
use crate::pacing::Pacer;
use crate::traits::{
    document::{DocumentCompiler, ObjectStore, UploadMetadata},
    feed::FeedSource,
    reasoning::ReasoningService,
};

pub use crate::storage::MemoryBackend;

/// A clock frozen at one instant (adjustable).
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap()
    }
}

/// A pacer that never sleeps.
///
/// Records every requested delay and honours the stop signal. With
/// [`ImmediatePacer::cancel_on_pause`] it fires a token on the first pause
/// (or the n-th, via [`ImmediatePacer::cancel_on_nth_pause`]), simulating a
/// shutdown arriving mid-delay.
#[derive(Default)]
pub struct ImmediatePacer {
    pauses: RwLock<Vec<Duration>>,
    trigger: RwLock<Option<(usize, CancellationToken)>>,
}

impl ImmediatePacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel `token` as soon as any pause is requested.
    pub fn cancel_on_pause(&self, token: CancellationToken) {
        self.cancel_on_nth_pause(1, token);
    }

    /// Cancel `token` when the `n`-th pause is requested.
    pub fn cancel_on_nth_pause(&self, n: usize, token: CancellationToken) {
        *self.trigger.write().unwrap() = Some((n, token));
    }

    /// Durations requested so far.
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.read().unwrap().clone()
    }
}

#[async_trait]
impl Pacer for ImmediatePacer {
    async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> Result<()> {
        let requested = {
            let mut pauses = self.pauses.write().unwrap();
            pauses.push(duration);
            pauses.len()
        };
        if let Some((n, token)) = self.trigger.read().unwrap().as_ref() {
            if requested >= *n {
                token.cancel();
            }
        }
        if cancel.is_cancelled() {
            return Err(HarvestError::Cancelled);
        }
        Ok(())
    }
}

/// Scripted reply for [`MockReasoning`].
#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Fail,
    RateLimited,
}

/// A mock reasoning service.
///
/// Replies are consumed in order. When the script runs out, the default
/// response is returned (or an error if none is set). Every prompt is
/// recorded for assertions.
#[derive(Default)]
pub struct MockReasoning {
    script: RwLock<VecDeque<Scripted>>,
    default_response: Option<String>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockReasoning {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.script.write().unwrap().push_back(Scripted::Text(text.into()));
        self
    }

    /// Queue a network failure.
    pub fn with_failure(self) -> Self {
        self.script.write().unwrap().push_back(Scripted::Fail);
        self
    }

    /// Queue a 429-style rejection.
    pub fn with_rate_limit(self) -> Self {
        self.script.write().unwrap().push_back(Scripted::RateLimited);
        self
    }

    /// Reply used once the script is exhausted.
    pub fn with_default_response(mut self, text: impl Into<String>) -> Self {
        self.default_response = Some(text.into());
        self
    }

    /// Prompts received, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningService for MockReasoning {
    async fn generate(&self, prompt: &str) -> ServiceResult<String> {
        self.calls.write().unwrap().push(prompt.to_string());

        let next = self.script.write().unwrap().pop_front();
        match next {
            Some(Scripted::Text(text)) => Ok(text),
            Some(Scripted::Fail) => Err(ServiceError::Network("mock failure".into())),
            Some(Scripted::RateLimited) => Err(ServiceError::RateLimited),
            None => self
                .default_response
                .clone()
                .ok_or(ServiceError::EmptyResponse),
        }
    }
}

/// A mock feed source serving canned pages per channel.
#[derive(Default)]
pub struct MockFeedSource {
    pages: HashMap<String, String>,
    errors: HashMap<String, FeedError>,
    requests: Arc<RwLock<Vec<String>>>,
}

impl MockFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, channel: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(channel.into(), html.into());
        self
    }

    pub fn with_error(mut self, channel: impl Into<String>, error: FeedError) -> Self {
        self.errors.insert(channel.into(), error);
        self
    }

    /// Channels requested, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.read().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for MockFeedSource {
    async fn fetch_page(&self, channel: &str) -> FeedResult<String> {
        self.requests.write().unwrap().push(channel.to_string());

        if let Some(err) = self.errors.get(channel) {
            return Err(err.clone());
        }
        self.pages
            .get(channel)
            .cloned()
            .ok_or_else(|| FeedError::NotFound {
                channel: channel.to_string(),
            })
    }
}

/// Render a channel preview page with one block per `(text, timestamp)`.
pub fn channel_page(channel: &str, posts: &[(&str, Option<DateTime<Utc>>)]) -> String {
    let blocks: Vec<String> = posts
        .iter()
        .enumerate()
        .map(|(i, (text, posted_at))| {
            let time = posted_at
                .map(|ts| {
                    format!(
                        r#"<a class="tgme_widget_message_date" href="https://t.me/{c}/{n}"><time datetime="{ts}" class="time">{hm}</time></a>"#,
                        c = channel,
                        n = i + 1,
                        ts = ts.to_rfc3339(),
                        hm = ts.format("%H:%M"),
                    )
                })
                .unwrap_or_default();
            format!(
                r#"<div class="tgme_widget_message_wrap js-widget_message_wrap"><div class="tgme_widget_message text_not_supported_wrap js-widget_message" data-post="{c}/{n}"><div class="tgme_widget_message_text js-message_text" dir="auto">{text}</div>{time}</div>
</div>"#,
                c = channel,
                n = i + 1,
                text = text,
                time = time,
            )
        })
        .collect();

    format!(
        "<html><body><section class=\"tgme_channel_history js-message_history\">\n{}\n</section></body></html>",
        blocks.join("\n")
    )
}

/// A mock document compiler that wraps markup in a fake PDF.
#[derive(Default)]
pub struct MockCompiler {
    fail: bool,
    compiled: Arc<RwLock<Vec<String>>>,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Markup received, in order.
    pub fn compiled(&self) -> Vec<String> {
        self.compiled.read().unwrap().clone()
    }
}

#[async_trait]
impl DocumentCompiler for MockCompiler {
    async fn compile(&self, markup: &str) -> ServiceResult<Vec<u8>> {
        self.compiled.write().unwrap().push(markup.to_string());
        if self.fail {
            return Err(ServiceError::Api {
                status: 400,
                message: "mock compile error".into(),
            });
        }
        let mut pdf = b"%PDF-1.5\n".to_vec();
        pdf.extend_from_slice(markup.as_bytes());
        Ok(pdf)
    }
}

/// A mock object store returning predictable links.
#[derive(Default)]
pub struct MockObjectStore {
    fail: bool,
    uploads: Arc<RwLock<Vec<UploadMetadata>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<UploadMetadata> {
        self.uploads.read().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn upload(&self, _bytes: Vec<u8>, metadata: &UploadMetadata) -> ServiceResult<String> {
        self.uploads.write().unwrap().push(metadata.clone());
        if self.fail {
            return Err(ServiceError::Network("mock upload failure".into()));
        }
        Ok(format!(
            "https://files.example.com/resumes/{}_{}.pdf",
            metadata.company, metadata.timestamp_millis
        ))
    }
}
