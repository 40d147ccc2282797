//! SERP API search provider.
//!
//! Sends one search request to a hosted SERP gateway and returns the raw
//! result markup. Any provider failure is a transport error; the caller
//! treats it as "no results" and moves to its next query variant.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::error::{SearchError, SearchResult};
use crate::security::SecretString;
use crate::traits::searcher::SearchProvider;

const DEFAULT_ENDPOINT: &str = "https://api.serpgateway.com/search";

/// Hosted SERP API searcher.
pub struct SerpSearcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    country: String,
    language: String,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct SerpRequest<'a> {
    q: &'a str,
    gl: &'a str,
    hl: &'a str,
    num: usize,
    /// Ask for the raw result page, not pre-parsed JSON; the URL extractor
    /// applies its own redundant patterns.
    format: &'a str,
}

impl SerpSearcher {
    pub fn new(api_key: SecretString) -> Self {
        let timeout_secs = 15;
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .expect("Failed to create HTTP client"),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
            country: "jp".to_string(),
            language: "ja".to_string(),
            timeout_secs,
        }
    }

    /// Point at a different gateway endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the result country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Set the result language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

#[async_trait]
impl SearchProvider for SerpSearcher {
    async fn search(&self, query: &str, limit: usize) -> SearchResult<String> {
        let request = SerpRequest {
            q: query,
            gl: &self.country,
            hl: &self.language,
            num: limit,
            format: "raw_html",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout {
                        seconds: self.timeout_secs,
                    }
                } else {
                    SearchError::Http(Box::new(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| SearchError::Http(Box::new(e)))
    }

    fn name(&self) -> &str {
        "serp"
    }
}
