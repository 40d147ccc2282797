//! Direct HTTP fetch strategy.
//!
//! The simplest and cheapest access method, tried last: many reagent sites
//! serve bots an empty shell or a challenge page, but when it works there
//! is no per-request cost.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::traits::strategy::FetchStrategy;
use crate::types::product::FetchedPage;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0 Safari/537.36";

/// Plain HTTP client strategy.
pub struct DirectStrategy {
    client: reqwest::Client,
    user_agent: String,
    timeout: Duration,
    min_content_len: usize,
}

impl DirectStrategy {
    pub fn new() -> FetchResult<Self> {
        let timeout = Duration::from_secs(15);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout,
            min_content_len: 500,
        })
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the acceptance threshold.
    pub fn with_min_content_len(mut self, len: usize) -> Self {
        self.min_content_len = len;
        self
    }
}

#[async_trait]
impl FetchStrategy for DirectStrategy {
    fn name(&self) -> &str {
        "direct"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn min_content_len(&self) -> usize {
        self.min_content_len
    }

    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let content = response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(FetchedPage::new(url, content).with_status(status.as_u16()))
    }
}
