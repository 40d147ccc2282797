//! Per-provider request pacing.
//!
//! Every worker that talks to the same external provider shares one limiter,
//! so the whole pool is throttled together. The jitter matters: workers that
//! all wait exactly the same interval fire in synchronized bursts, which
//! themselves look automated.

use governor::{Jitter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::time::Duration;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Shared, jittered pacer for one external provider.
pub struct ProviderPacer {
    limiter: DefaultRateLimiter,
    jitter: Jitter,
}

impl ProviderPacer {
    /// `min_delay` between requests, plus up to `jitter` of random extra.
    pub fn new(min_delay: Duration, jitter: Duration) -> Self {
        let quota = Quota::with_period(min_delay).unwrap_or_else(|| Quota::per_second(nonzero!(1u32)));
        Self {
            limiter: RateLimiter::direct(quota),
            jitter: Jitter::up_to(jitter),
        }
    }

    /// Wait for a permit before calling the provider.
    pub async fn pace(&self) {
        self.limiter.until_ready_with_jitter(self.jitter).await;
    }
}

/// One pacer per external provider the pipeline talks to.
pub struct ProviderPacers {
    pub search: ProviderPacer,
    pub fetch: ProviderPacer,
    pub model: ProviderPacer,
}

impl ProviderPacers {
    pub fn new(min_delay: Duration, jitter: Duration) -> Self {
        Self {
            search: ProviderPacer::new(min_delay, jitter),
            fetch: ProviderPacer::new(min_delay, jitter),
            model: ProviderPacer::new(min_delay, jitter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_pacer_spaces_requests() {
        let pacer = ProviderPacer::new(Duration::from_millis(100), Duration::from_millis(1));

        let start = Instant::now();
        pacer.pace().await;
        pacer.pace().await;
        pacer.pace().await;
        let elapsed = start.elapsed();

        // First permit is immediate, the next two wait ~100ms each
        assert!(elapsed.as_millis() >= 150, "pacing not applied: {:?}", elapsed);
    }
}
