//! Retry backoff policy.
//!
//! Rate limiting (pacing requests to a shared provider) and retry backoff
//! (waiting after a failure) are distinct concerns; this module owns the
//! latter. Pacing lives in [`crate::pacing`].

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Delay policy for retry loops.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base: Duration,

    /// Multiplier applied per attempt. `1.0` gives a fixed delay.
    pub factor: f64,

    /// Upper bound on any single delay.
    pub max: Duration,
}

impl BackoffPolicy {
    /// Fixed delay between attempts.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base: delay,
            factor: 1.0,
            max: delay,
        }
    }

    /// Exponential backoff starting at `base`, capped at `max`.
    pub fn exponential(base: Duration, max: Duration) -> Self {
        Self {
            base,
            factor: 2.0,
            max,
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let scaled = self.base.as_secs_f64() * self.factor.powi(attempt as i32);
        Duration::from_secs_f64(scaled).min(self.max)
    }

    /// Sleep before retry `attempt`, waking early on cancellation.
    ///
    /// Returns `false` if cancelled while sleeping; a retry loop must not
    /// ignore the cancellation signal inside its backoff.
    pub async fn wait(&self, attempt: u32, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.delay(attempt)) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay() {
        let policy = BackoffPolicy::fixed(Duration::from_secs(1));
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(5), Duration::from_secs(1));
    }

    #[test]
    fn test_exponential_caps_at_max() {
        let policy = BackoffPolicy::exponential(Duration::from_secs(1), Duration::from_secs(8));
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(10), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_wait_returns_false_on_cancel() {
        let policy = BackoffPolicy::fixed(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!policy.wait(0, &cancel).await);
    }
}
