//! Fixed-interval polling with an injectable clock.
//!
//! The follower retries "not found" responses forever at a fixed interval.
//! Every wait goes through a [`Clock`] and is raced against cancellation,
//! so tests can substitute a clock that returns immediately and records
//! what it was asked to wait for.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Source of delays.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real time, backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A clock that returns immediately and records each requested delay.
#[derive(Debug, Clone, Default)]
pub struct RecordingClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, oldest first.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        tokio::task::yield_now().await;
    }
}

/// Outcome of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    Elapsed,
    Cancelled,
}

/// Constant-interval retry schedule. No backoff and no attempt limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingStrategy {
    pub interval: Duration,
}

impl PollingStrategy {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Wait one interval, or less if `cancel` fires first.
    pub async fn wait<C: Clock + ?Sized>(&self, clock: &C, cancel: &CancellationToken) -> Wait {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Wait::Cancelled,
            _ = clock.sleep(self.interval) => Wait::Elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_clock_records_waits() {
        let clock = RecordingClock::new();
        let strategy = PollingStrategy::new(Duration::from_millis(500));
        let cancel = CancellationToken::new();

        assert_eq!(strategy.wait(&clock, &cancel).await, Wait::Elapsed);
        assert_eq!(strategy.wait(&clock, &cancel).await, Wait::Elapsed);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(500); 2]);
    }

    #[tokio::test]
    async fn cancelled_wait_returns_immediately() {
        let strategy = PollingStrategy::new(Duration::from_secs(3600));
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(strategy.wait(&TokioClock, &cancel).await, Wait::Cancelled);
    }

    #[tokio::test]
    async fn cancel_interrupts_real_sleep() {
        let strategy = PollingStrategy::new(Duration::from_secs(3600));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let outcome = tokio::time::timeout(Duration::from_secs(5), strategy.wait(&TokioClock, &cancel))
            .await
            .expect("wait should be interrupted");
        assert_eq!(outcome, Wait::Cancelled);
    }
}
