//! Per-batch rate gate for reasoning calls.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::pacing::Pacer;

/// Inserts the configured delay before every reasoning call except the
/// first one made through the gate.
///
/// One gate lives for one batch (or one operator-submitted message).
pub struct RateGate<'a> {
    pacer: Arc<dyn Pacer>,
    delay: Duration,
    cancel: &'a CancellationToken,
    calls: usize,
}

impl<'a> RateGate<'a> {
    pub fn new(pacer: Arc<dyn Pacer>, delay: Duration, cancel: &'a CancellationToken) -> Self {
        Self {
            pacer,
            delay,
            cancel,
            calls: 0,
        }
    }

    /// Wait (if needed) before issuing a call.
    ///
    /// Returns [`crate::error::HarvestError::Cancelled`] when the stop signal
    /// fires during the wait; the call must then not be made.
    pub async fn before_call(&mut self) -> Result<()> {
        if self.calls > 0 {
            self.pacer.pause(self.delay, self.cancel).await?;
        }
        self.calls += 1;
        Ok(())
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ImmediatePacer;

    #[tokio::test]
    async fn test_first_call_is_not_delayed() {
        let pacer = Arc::new(ImmediatePacer::new());
        let cancel = CancellationToken::new();
        let mut gate = RateGate::new(pacer.clone(), Duration::from_secs(10), &cancel);

        gate.before_call().await.unwrap();
        assert!(pacer.pauses().is_empty());

        gate.before_call().await.unwrap();
        gate.before_call().await.unwrap();
        assert_eq!(pacer.pauses(), vec![Duration::from_secs(10); 2]);
        assert_eq!(gate.calls(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_wait_does_not_count_as_call() {
        let pacer = Arc::new(ImmediatePacer::new());
        let cancel = CancellationToken::new();
        let mut gate = RateGate::new(pacer, Duration::from_secs(10), &cancel);

        gate.before_call().await.unwrap();
        cancel.cancel();

        assert!(gate.before_call().await.unwrap_err().is_cancelled());
        assert_eq!(gate.calls(), 1);
    }
}
