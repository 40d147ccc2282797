//! Testing utilities including mock providers.
//!
//! These exercise the pipeline without a live connection: a scripted search
//! provider, scripted fetch strategies, and a scripted extraction model,
//! each recording the calls made to it.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{ExtractError, ExtractResult, FetchError, FetchResult, SearchResult};
use crate::traits::{model::StructuredModel, searcher::SearchProvider, strategy::FetchStrategy};
use crate::types::product::FetchedPage;

/// A mock search provider with scripted markup per query substring.
#[derive(Default)]
pub struct MockSearcher {
    /// `(query substring, markup)` pairs, first match wins.
    responses: RwLock<Vec<(String, String)>>,
    delay: Option<Duration>,
    calls: RwLock<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `markup` for any query containing `query_part`.
    pub fn with_markup(self, query_part: impl Into<String>, markup: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .push((query_part.into(), markup.into()));
        self
    }

    /// Sleep this long inside each call (for concurrency tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All queries this mock has seen.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Highest number of concurrent `search` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for MockSearcher {
    async fn search(&self, query: &str, _limit: usize) -> SearchResult<String> {
        self.calls.write().unwrap().push(query.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let markup = self
            .responses
            .read()
            .unwrap()
            .iter()
            .find(|(part, _)| query.contains(part.as_str()))
            .map(|(_, markup)| markup.clone())
            .unwrap_or_default();
        Ok(markup)
    }

    fn name(&self) -> &str {
        "mock-search"
    }
}

/// What a [`MockStrategy`] does for a given URL.
enum FetchScript {
    Content(String),
    Fail,
    Status(u16),
}

/// A mock fetch strategy with per-URL scripted outcomes.
pub struct MockStrategy {
    name: String,
    scripts: RwLock<Vec<(String, FetchScript)>>,
    default_script: FetchScript,
    min_content_len: usize,
    timeout: Duration,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockStrategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scripts: RwLock::new(Vec::new()),
            default_script: FetchScript::Fail,
            min_content_len: 0,
            timeout: Duration::from_secs(5),
            delay: None,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Return `content` for any URL containing `url_part`.
    pub fn with_content(self, url_part: impl Into<String>, content: impl Into<String>) -> Self {
        self.scripts
            .write()
            .unwrap()
            .push((url_part.into(), FetchScript::Content(content.into())));
        self
    }

    /// Return `content` for every URL.
    pub fn with_default_content(mut self, content: impl Into<String>) -> Self {
        self.default_script = FetchScript::Content(content.into());
        self
    }

    /// Fail every URL with a transport error (the default).
    pub fn failing(mut self) -> Self {
        self.default_script = FetchScript::Fail;
        self
    }

    /// Fail every URL with this HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.default_script = FetchScript::Status(status);
        self
    }

    /// Set the acceptance threshold reported by this strategy.
    pub fn with_min_content_len(mut self, len: usize) -> Self {
        self.min_content_len = len;
        self
    }

    /// Set the per-attempt timeout reported by this strategy.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sleep this long inside each call (for budget tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All URLs this strategy has been asked to fetch.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl FetchStrategy for MockStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn min_content_len(&self) -> usize {
        self.min_content_len
    }

    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        self.calls.write().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripts = self.scripts.read().unwrap();
        let script = scripts
            .iter()
            .find(|(part, _)| url.contains(part.as_str()))
            .map(|(_, script)| script)
            .unwrap_or(&self.default_script);

        match script {
            FetchScript::Content(content) => {
                Ok(FetchedPage::new(url, content.clone()).with_status(200))
            }
            FetchScript::Fail => Err(FetchError::Http(
                format!("mock strategy {} refused {}", self.name, url).into(),
            )),
            FetchScript::Status(status) => Err(FetchError::Status { status: *status }),
        }
    }
}

/// A mock extraction model with a scripted response queue.
#[derive(Default)]
pub struct MockModel {
    /// Responses consumed in order; `Err` entries become provider errors.
    queue: RwLock<VecDeque<Result<String, String>>>,
    default_response: Option<String>,
    calls: AtomicUsize,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one successful response.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.queue.write().unwrap().push_back(Ok(response.into()));
        self
    }

    /// Queue one provider error.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.queue.write().unwrap().push_back(Err(message.into()));
        self
    }

    /// Response used whenever the queue is empty.
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = Some(response.into());
        self
    }

    /// Number of generation calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StructuredModel for MockModel {
    async fn generate_structured(&self, _prompt: &str) -> ExtractResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(scripted) = self.queue.write().unwrap().pop_front() {
            return scripted.map_err(|message| ExtractError::Provider(message.into()));
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(ExtractError::Provider("mock model has no response".into())),
        }
    }

    fn name(&self) -> &str {
        "mock-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_searcher_matches_substring() {
        let searcher = MockSearcher::new().with_markup("example-chem", "<a href=x>hit</a>");

        let markup = searcher
            .search("DMSO site:example-chem.test", 10)
            .await
            .unwrap();
        assert!(markup.contains("hit"));

        let empty = searcher.search("DMSO site:other.test", 10).await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(searcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_strategy_scripts() {
        let strategy = MockStrategy::new("browser")
            .with_content("/item/1", "page one")
            .with_status(503);

        assert!(strategy.fetch("https://x.test/item/1").await.is_ok());
        assert!(matches!(
            strategy.fetch("https://x.test/other").await,
            Err(FetchError::Status { status: 503 })
        ));
        assert_eq!(strategy.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_model_queue_then_default() {
        let model = MockModel::new()
            .with_response("first")
            .with_default_response("later");

        assert_eq!(model.generate_structured("p").await.unwrap(), "first");
        assert_eq!(model.generate_structured("p").await.unwrap(), "later");
        assert_eq!(model.calls(), 2);
    }
}
