//! Managed browser-gateway fetch strategy.
//!
//! Delegates fetching to a remote rendering service that runs a real
//! browser: JavaScript executes, anti-bot checks are handled by the
//! provider. The most reliable and most expensive strategy, so it goes
//! first in the chain only on deployments that pay for it.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::security::SecretString;
use crate::traits::strategy::FetchStrategy;
use crate::types::product::FetchedPage;

/// Remote rendering gateway strategy.
pub struct BrowserGatewayStrategy {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    country: String,
    timeout: Duration,
    min_content_len: usize,
}

#[derive(Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
    render: bool,
    country: &'a str,
}

impl BrowserGatewayStrategy {
    pub fn new(endpoint: impl Into<String>, api_key: SecretString) -> FetchResult<Self> {
        let timeout = Duration::from_secs(30);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            country: "jp".to_string(),
            timeout,
            min_content_len: 1000,
        })
    }

    /// Set the country the gateway should exit from.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
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
impl FetchStrategy for BrowserGatewayStrategy {
    fn name(&self) -> &str {
        "browser-gateway"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn min_content_len(&self) -> usize {
        self.min_content_len
    }

    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        let request = RenderRequest {
            url,
            render: true,
            country: &self.country,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        // The gateway returns the rendered document as the response body.
        let content = response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(FetchedPage::new(url, content).with_status(status.as_u16()))
    }
}
