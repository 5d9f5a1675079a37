//! Cancellable delays.
//!
//! Every intentional suspension in the harvester (channel pacing, rate-limit
//! waits before reasoning calls) goes through a [`Pacer`] so that a stop
//! signal ends the wait immediately and tests can run without sleeping.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{HarvestError, Result};

/// A delay primitive that honours a stop signal.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait for `duration`, or return [`HarvestError::Cancelled`] as soon as
    /// `cancel` fires.
    async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> Result<()>;
}

/// Pacer backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(HarvestError::Cancelled);
        }
        if duration.is_zero() {
            return Ok(());
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(HarvestError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
