//! Ordered fetch-strategy fallback chain.
//!
//! Remote e-commerce sites enforce bot detection differently; no single
//! access method is reliably best across all targets. Strategies run in a
//! fixed priority order and the first acceptable result wins. The whole
//! chain shares a hard wall-clock budget per URL, so one slow strategy
//! cannot starve the rest.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::types::product::{FetchOutcome, FetchStatus, StrategyAttempt};
use crate::traits::strategy::FetchStrategy;

/// Runs an ordered chain of fetch strategies against one URL.
pub struct ContentFetcher {
    strategies: Vec<Arc<dyn FetchStrategy>>,
    url_budget: Duration,
}

impl ContentFetcher {
    /// Build a fetcher from strategies in priority order.
    pub fn new(strategies: Vec<Arc<dyn FetchStrategy>>, url_budget: Duration) -> Self {
        Self {
            strategies,
            url_budget,
        }
    }

    /// Names of the registered strategies, in order.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Fetch one URL, trying each strategy until one yields acceptable
    /// content or all are exhausted.
    ///
    /// On total failure the outcome carries the **last** error observed:
    /// later strategies are simpler and their failures more diagnostic.
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> FetchOutcome {
        let deadline = Instant::now() + self.url_budget;
        let mut attempts: Vec<StrategyAttempt> = Vec::with_capacity(self.strategies.len());
        let mut last_error: Option<FetchError> = None;

        for strategy in &self.strategies {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(url = %url, "per-URL fetch budget exhausted, abandoning remaining strategies");
                last_error = Some(FetchError::BudgetExhausted {
                    url: url.to_string(),
                });
                break;
            }

            let allowance = strategy.timeout().min(remaining);
            let started = Instant::now();

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    return FetchOutcome {
                        url: url.to_string(),
                        page: None,
                        strategy: None,
                        error: Some(FetchError::BudgetExhausted { url: url.to_string() }),
                        attempts,
                    };
                }
                result = tokio::time::timeout(allowance, strategy.fetch(url)) => result,
            };
            let latency_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(Ok(page)) => {
                    let min = strategy.min_content_len();
                    if page.content.chars().count() >= min {
                        debug!(
                            url = %url,
                            strategy = strategy.name(),
                            chars = page.content.len(),
                            "fetch accepted"
                        );
                        attempts.push(StrategyAttempt {
                            strategy: strategy.name().to_string(),
                            status: FetchStatus::Ok,
                            detail: String::new(),
                            latency_ms,
                        });
                        return FetchOutcome {
                            url: url.to_string(),
                            page: Some(page),
                            strategy: Some(strategy.name().to_string()),
                            error: None,
                            attempts,
                        };
                    }

                    // Soft failure: an undersized page is usually an error
                    // shell, not a result.
                    let error = FetchError::Undersized {
                        len: page.content.chars().count(),
                        min,
                    };
                    debug!(url = %url, strategy = strategy.name(), error = %error, "fetch rejected");
                    attempts.push(StrategyAttempt {
                        strategy: strategy.name().to_string(),
                        status: FetchStatus::Undersized,
                        detail: error.to_string(),
                        latency_ms,
                    });
                    last_error = Some(error);
                }
                Ok(Err(error)) => {
                    debug!(url = %url, strategy = strategy.name(), error = %error, "fetch failed");
                    attempts.push(StrategyAttempt {
                        strategy: strategy.name().to_string(),
                        status: FetchStatus::Failed,
                        detail: error.to_string(),
                        latency_ms,
                    });
                    last_error = Some(error);
                }
                Err(_elapsed) => {
                    let error = FetchError::Timeout {
                        url: url.to_string(),
                    };
                    debug!(url = %url, strategy = strategy.name(), "fetch timed out");
                    attempts.push(StrategyAttempt {
                        strategy: strategy.name().to_string(),
                        status: FetchStatus::Timeout,
                        detail: error.to_string(),
                        latency_ms,
                    });
                    last_error = Some(error);
                }
            }
        }

        FetchOutcome {
            url: url.to_string(),
            page: None,
            strategy: None,
            error: last_error.or(Some(FetchError::InvalidUrl {
                url: url.to_string(),
            })),
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockStrategy;

    const URL: &str = "https://example-chem.test/item/1234";

    fn page(content_len: usize) -> String {
        "x".repeat(content_len)
    }

    #[tokio::test]
    async fn test_first_acceptable_strategy_wins() {
        let first = Arc::new(MockStrategy::new("browser").with_default_content(page(600)));
        let second = Arc::new(MockStrategy::new("direct").with_default_content(page(600)));
        let fetcher = ContentFetcher::new(
            vec![first.clone(), second.clone()],
            Duration::from_secs(10),
        );

        let outcome = fetcher.fetch(URL, &CancellationToken::new()).await;
        assert!(outcome.is_acceptable());
        assert_eq!(outcome.strategy.as_deref(), Some("browser"));
        // Later strategies are skipped entirely.
        assert!(second.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_on_failure_returns_second_content() {
        let first = Arc::new(MockStrategy::new("browser").failing());
        let second = Arc::new(MockStrategy::new("direct").with_default_content(page(600)));
        let fetcher = ContentFetcher::new(vec![first, second], Duration::from_secs(10));

        let outcome = fetcher.fetch(URL, &CancellationToken::new()).await;
        assert!(outcome.is_acceptable());
        assert_eq!(outcome.strategy.as_deref(), Some("direct"));
        assert!(outcome.error.is_none());
        // The first failure survives only as a diagnostic attempt.
        assert_eq!(outcome.attempts.len(), 2);
    }

    #[tokio::test]
    async fn test_undersized_content_advances_chain() {
        let first = Arc::new(
            MockStrategy::new("browser")
                .with_default_content(page(100))
                .with_min_content_len(500),
        );
        let second = Arc::new(MockStrategy::new("direct").with_default_content(page(600)));
        let fetcher = ContentFetcher::new(vec![first, second], Duration::from_secs(10));

        let outcome = fetcher.fetch(URL, &CancellationToken::new()).await;
        assert!(outcome.is_acceptable());
        assert_eq!(outcome.strategy.as_deref(), Some("direct"));
    }

    #[tokio::test]
    async fn test_all_failed_keeps_last_error() {
        let first = Arc::new(MockStrategy::new("browser").with_status(403));
        let second = Arc::new(MockStrategy::new("direct").with_status(503));
        let fetcher = ContentFetcher::new(vec![first, second], Duration::from_secs(10));

        let outcome = fetcher.fetch(URL, &CancellationToken::new()).await;
        assert!(!outcome.is_acceptable());
        assert!(matches!(
            outcome.error,
            Some(FetchError::Status { status: 503 })
        ));
    }

    #[tokio::test]
    async fn test_slow_strategy_hits_timeout_and_chain_continues() {
        let slow = Arc::new(
            MockStrategy::new("browser")
                .with_default_content(page(600))
                .with_delay(Duration::from_millis(200))
                .with_timeout(Duration::from_millis(20)),
        );
        let second = Arc::new(MockStrategy::new("direct").with_default_content(page(600)));
        let fetcher = ContentFetcher::new(vec![slow, second], Duration::from_secs(10));

        let outcome = fetcher.fetch(URL, &CancellationToken::new()).await;
        assert!(outcome.is_acceptable());
        assert_eq!(outcome.strategy.as_deref(), Some("direct"));
        assert_eq!(outcome.attempts[0].status, FetchStatus::Timeout);
    }

    #[tokio::test]
    async fn test_budget_abandons_remaining_strategies() {
        let slow = Arc::new(
            MockStrategy::new("browser")
                .with_default_content(page(600))
                .with_delay(Duration::from_millis(100)),
        );
        let never = Arc::new(MockStrategy::new("direct").with_default_content(page(600)));
        let fetcher =
            ContentFetcher::new(vec![slow, never.clone()], Duration::from_millis(50));

        let outcome = fetcher.fetch(URL, &CancellationToken::new()).await;
        assert!(!outcome.is_acceptable());
        assert!(never.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_stops_chain() {
        let slow = Arc::new(
            MockStrategy::new("browser")
                .with_default_content(page(600))
                .with_delay(Duration::from_secs(5)),
        );
        let fetcher = ContentFetcher::new(vec![slow], Duration::from_secs(30));

        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel_clone.cancel();
        });

        let started = Instant::now();
        let outcome = fetcher.fetch(URL, &cancel).await;
        assert!(!outcome.is_acceptable());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
