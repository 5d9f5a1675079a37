//! Feed fetcher: one sweep over all configured channels.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::parse::{is_channel_unavailable, parse_channel_page_capped};
use crate::cursor::{normalize_channel, CursorStore};
use crate::error::FeedError;
use crate::pacing::Pacer;
use crate::traits::feed::FeedSource;
use crate::types::config::FetchConfig;
use crate::types::message::RawMessage;

/// Result of a sweep over the configured channels.
#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    /// Unseen messages from every channel, in channel then page order
    pub messages: Vec<RawMessage>,
    /// Channels that completed a pass (cursor advanced)
    pub channels_swept: usize,
    /// Channels whose fetch failed; their cursors move to the sweep start
    pub channels_failed: usize,
    /// The sweep stopped early on a stop signal
    pub cancelled: bool,
}

/// Fetches channel pages and emits only messages newer than each cursor.
pub struct FeedFetcher {
    source: Arc<dyn FeedSource>,
    pacer: Arc<dyn Pacer>,
    config: FetchConfig,
}

impl FeedFetcher {
    pub fn new(source: Arc<dyn FeedSource>, pacer: Arc<dyn Pacer>, config: FetchConfig) -> Self {
        Self {
            source,
            pacer,
            config,
        }
    }

    /// Sweep `channels` sequentially.
    ///
    /// Transport failures are logged per channel, count as a pass with no
    /// messages and never abort the sweep. After each pass the channel's
    /// cursor moves to the newest accepted timestamp, or to the sweep start
    /// time when nothing was new.
    pub async fn fetch_new_messages(
        &self,
        channels: &[String],
        cursors: &CursorStore,
        cancel: &CancellationToken,
    ) -> SweepResult {
        let mut sweep = SweepResult::default();
        let names: Vec<String> = channels.iter().filter_map(|c| normalize_channel(c)).collect();

        if names.is_empty() {
            warn!("No channels configured, nothing to fetch");
            return sweep;
        }

        info!(channels = names.len(), "Fetching new messages");
        let sweep_start = cursors.now();

        for (index, channel) in names.iter().enumerate() {
            if index > 0 {
                if let Err(e) = self.pacer.pause(self.config.channel_pacing, cancel).await {
                    debug!(error = %e, "Channel pacing interrupted");
                    sweep.cancelled = true;
                    break;
                }
            } else if cancel.is_cancelled() {
                sweep.cancelled = true;
                break;
            }

            let html = match self.source.fetch_page(channel).await {
                Ok(html) => html,
                Err(e) => {
                    // A failed fetch counts as an empty pass
                    log_fetch_failure(channel, &e);
                    cursors.advance(channel, sweep_start);
                    sweep.channels_failed += 1;
                    continue;
                }
            };

            let candidates = if is_channel_unavailable(&html) {
                warn!(channel = %channel, "Channel doesn't exist or is not accessible");
                Vec::new()
            } else {
                parse_channel_page_capped(
                    &html,
                    channel,
                    cursors.now(),
                    self.config.max_messages_per_page,
                )
            };

            let total = candidates.len();
            let fresh: Vec<RawMessage> = candidates
                .into_iter()
                .filter(|m| cursors.is_new(channel, m.posted_at))
                .collect();

            let next_cursor = fresh
                .iter()
                .map(|m| m.posted_at)
                .max()
                .unwrap_or(sweep_start);
            cursors.advance(channel, next_cursor);

            info!(
                channel = %channel,
                total = total,
                new = fresh.len(),
                cursor = %next_cursor,
                "Channel pass complete"
            );

            sweep.channels_swept += 1;
            sweep.messages.extend(fresh);
        }

        info!(
            new_messages = sweep.messages.len(),
            failed = sweep.channels_failed,
            cancelled = sweep.cancelled,
            "Sweep finished"
        );
        sweep
    }
}

fn log_fetch_failure(channel: &str, err: &FeedError) {
    match err {
        FeedError::NotFound { .. } => warn!(channel = %channel, "Channel not found (404)"),
        FeedError::Forbidden { .. } => {
            warn!(channel = %channel, "Channel access forbidden (403), may be private")
        }
        FeedError::RateLimited { .. } => {
            warn!(channel = %channel, "Rate limited (429), will retry next cycle")
        }
        FeedError::Http { status, .. } => {
            error!(channel = %channel, status = status, "HTTP error accessing channel")
        }
        FeedError::Network(e) => error!(channel = %channel, error = %e, "Failed to reach channel"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{channel_page, FixedClock, ImmediatePacer, MockFeedSource};
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::time::Duration;

    const POST: &str = "Hiring: senior backend engineer, remote friendly, salary 120k. \
        Apply with your CV and two references.";

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 25, 12, 0, 0).unwrap()
    }

    fn fixture(source: MockFeedSource) -> (FeedFetcher, CursorStore, Arc<ImmediatePacer>) {
        let pacer = Arc::new(ImmediatePacer::new());
        let fetcher = FeedFetcher::new(
            Arc::new(source),
            pacer.clone(),
            FetchConfig::default().with_channel_pacing(Duration::from_millis(1500)),
        );
        let cursors = CursorStore::with_clock(Arc::new(FixedClock::new(now())));
        (fetcher, cursors, pacer)
    }

    #[tokio::test]
    async fn test_advances_cursor_to_newest_message() {
        let older = now() - ChronoDuration::hours(3);
        let newer = now() - ChronoDuration::hours(1);
        let source = MockFeedSource::new()
            .with_page("jobs", channel_page("jobs", &[(POST, Some(older)), (POST, Some(newer))]));
        let (fetcher, cursors, _) = fixture(source);

        let sweep = fetcher
            .fetch_new_messages(&["@jobs".to_string()], &cursors, &CancellationToken::new())
            .await;

        assert_eq!(sweep.messages.len(), 2);
        assert_eq!(cursors.last_fetch("jobs"), newer);
    }

    #[tokio::test]
    async fn test_no_new_messages_moves_cursor_to_sweep_start() {
        let stale = now() - ChronoDuration::hours(30);
        let source =
            MockFeedSource::new().with_page("jobs", channel_page("jobs", &[(POST, Some(stale))]));
        let (fetcher, cursors, _) = fixture(source);

        let sweep = fetcher
            .fetch_new_messages(&["jobs".to_string()], &cursors, &CancellationToken::new())
            .await;

        assert!(sweep.messages.is_empty());
        assert_eq!(cursors.last_fetch("jobs"), now());
    }

    #[tokio::test]
    async fn test_second_sweep_skips_seen_messages() {
        let ts = now() - ChronoDuration::hours(1);
        let source =
            MockFeedSource::new().with_page("jobs", channel_page("jobs", &[(POST, Some(ts))]));
        let (fetcher, cursors, _) = fixture(source);
        let channels = vec!["jobs".to_string()];
        let cancel = CancellationToken::new();

        let first = fetcher.fetch_new_messages(&channels, &cursors, &cancel).await;
        let second = fetcher.fetch_new_messages(&channels, &cursors, &cancel).await;

        assert_eq!(first.messages.len(), 1);
        assert!(second.messages.is_empty());
    }

    #[tokio::test]
    async fn test_failed_channel_does_not_abort_sweep() {
        let ts = now() - ChronoDuration::minutes(5);
        let source = MockFeedSource::new()
            .with_error("gone", FeedError::NotFound { channel: "gone".into() })
            .with_page("jobs", channel_page("jobs", &[(POST, Some(ts))]));
        let (fetcher, cursors, pacer) = fixture(source);

        let sweep = fetcher
            .fetch_new_messages(
                &["gone".to_string(), " ".to_string(), "jobs".to_string()],
                &cursors,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(sweep.channels_failed, 1);
        assert_eq!(sweep.messages.len(), 1);
        assert_eq!(cursors.snapshot().get("@gone"), Some(&now()));
        assert_eq!(pacer.pauses(), vec![Duration::from_millis(1500)]);
    }

    #[tokio::test]
    async fn test_rate_limited_channel_moves_cursor_to_sweep_start() {
        let source = MockFeedSource::new()
            .with_error("busy", FeedError::RateLimited { channel: "busy".into() });
        let (fetcher, cursors, _) = fixture(source);
        assert_eq!(cursors.last_fetch("busy"), now() - ChronoDuration::hours(24));

        let sweep = fetcher
            .fetch_new_messages(&["@busy".to_string()], &cursors, &CancellationToken::new())
            .await;

        assert!(sweep.messages.is_empty());
        assert_eq!(sweep.channels_failed, 1);
        assert_eq!(cursors.last_fetch("busy"), now());
    }

    #[tokio::test]
    async fn test_unavailable_channel_yields_nothing() {
        let source = MockFeedSource::new().with_page(
            "ghost",
            r#"<div class="tgme_page_description">This channel doesn't exist</div>"#,
        );
        let (fetcher, cursors, _) = fixture(source);

        let sweep = fetcher
            .fetch_new_messages(&["ghost".to_string()], &cursors, &CancellationToken::new())
            .await;

        assert!(sweep.messages.is_empty());
        assert_eq!(sweep.channels_failed, 0);
    }

    #[tokio::test]
    async fn test_cancellation_stops_between_channels() {
        let ts = now() - ChronoDuration::minutes(5);
        let source = Arc::new(
            MockFeedSource::new()
                .with_page("a", channel_page("a", &[(POST, Some(ts))]))
                .with_page("b", channel_page("b", &[(POST, Some(ts))])),
        );
        let pacer = Arc::new(ImmediatePacer::new());
        let fetcher = FeedFetcher::new(source.clone(), pacer.clone(), FetchConfig::default());
        let cursors = CursorStore::with_clock(Arc::new(FixedClock::new(now())));
        let cancel = CancellationToken::new();
        pacer.cancel_on_pause(cancel.clone());

        let sweep = fetcher
            .fetch_new_messages(&["a".to_string(), "b".to_string()], &cursors, &cancel)
            .await;

        assert!(sweep.cancelled);
        assert_eq!(sweep.channels_swept, 1);
        assert!(!cursors.snapshot().contains_key("@b"));
        assert_eq!(source.requests(), vec!["a".to_string()]);
    }
}
