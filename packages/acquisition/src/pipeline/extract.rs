//! Structured product extraction and response validation.
//!
//! Sends prepared page text to the extraction provider, parses the returned
//! JSON, and normalizes it into a validated product. Provider output is
//! non-deterministic: an empty or malformed response is retried up to a
//! fixed count with a short fixed delay, because a second attempt often
//! succeeds where the first returned nothing.

use regex::Regex;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backoff::BackoffPolicy;
use crate::error::{ExtractError, ExtractResult};
use crate::pipeline::content::{has_price_signal, page_text};
use crate::pipeline::prompts::format_extract_prompt;
use crate::traits::model::StructuredModel;
use crate::types::product::Offer;

/// Raw extraction response, as the provider contract shapes it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiProductResponse {
    product_name: Option<String>,
    model_number: Option<String>,
    manufacturer: Option<String>,
    #[serde(default)]
    offers: Vec<AiOffer>,
}

/// One raw offer. Price arrives as whatever the page showed; stock status
/// as free text.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiOffer {
    size: Option<String>,
    price: Option<serde_json::Value>,
    stock_status: Option<serde_json::Value>,
}

/// A validated product, before it is attributed to a site and URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedProduct {
    pub product_name: String,
    pub model_number: Option<String>,
    pub manufacturer: String,
    pub offers: Vec<Offer>,
}

/// Runs the extraction provider against prepared page text.
pub struct ProductExtractor {
    retries: usize,
    backoff: BackoffPolicy,
    max_page_chars: usize,
}

impl ProductExtractor {
    pub fn new(retries: usize, retry_delay: std::time::Duration, max_page_chars: usize) -> Self {
        Self {
            retries,
            backoff: BackoffPolicy::fixed(retry_delay),
            max_page_chars,
        }
    }

    /// Extract a product for `target` from raw page markup.
    ///
    /// Returns `Ok(None)` when the provider (after retries) reports no
    /// matching product; a product with an empty offers list is a valid
    /// "no price found" result and is returned as-is for the caller to
    /// discard.
    pub async fn extract<M>(
        &self,
        model: &M,
        html: &str,
        target: &str,
        cancel: &CancellationToken,
    ) -> ExtractResult<Option<ExtractedProduct>>
    where
        M: StructuredModel + ?Sized,
    {
        let text = page_text(html, self.max_page_chars);
        if !has_price_signal(&text) {
            warn!(product = %target, chars = text.len(), "no price keywords in page text");
        }
        let prompt = format_extract_prompt(target, &text);

        let mut last_error: Option<ExtractError> = None;

        for attempt in 0..=self.retries {
            if attempt > 0 && !self.backoff.wait(attempt as u32 - 1, cancel).await {
                // Cancelled mid-backoff; the site run is about to stop.
                return Ok(None);
            }

            let response = match model.generate_structured(&prompt).await {
                Ok(text) => text,
                Err(e) => {
                    debug!(attempt, error = %e, "extraction provider call failed");
                    last_error = Some(e);
                    continue;
                }
            };

            match parse_response(&response) {
                Ok(parsed) => match self.build(parsed) {
                    Some(product) if !product.offers.is_empty() => return Ok(Some(product)),
                    other => {
                        // Empty result; worth one more attempt, the provider
                        // is non-deterministic.
                        debug!(attempt, "extraction returned no offers");
                        if attempt == self.retries {
                            return Ok(other);
                        }
                        last_error = None;
                    }
                },
                Err(e) => {
                    debug!(attempt, error = %e, "extraction response not parseable");
                    last_error = Some(ExtractError::Malformed(e));
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            // Retries exhausted on empty results only.
            None => Ok(None),
        }
    }

    /// Validate and normalize a parsed response. `None` when no usable
    /// product name came back.
    fn build(&self, response: AiProductResponse) -> Option<ExtractedProduct> {
        let product_name = response
            .product_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())?;

        let offers = response
            .offers
            .into_iter()
            .filter_map(normalize_offer)
            .collect();

        Some(ExtractedProduct {
            product_name,
            model_number: response
                .model_number
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            manufacturer: response
                .manufacturer
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            offers,
        })
    }
}

/// Parse provider output, tolerating a fenced code block around the JSON.
fn parse_response(text: &str) -> Result<AiProductResponse, serde_json::Error> {
    let fence = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid fence pattern");
    let json = fence
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text.trim());
    serde_json::from_str(json)
}

/// Normalize one raw offer; unparseable prices drop the offer entirely.
///
/// Dropping is deliberate: zeroing a bad price would falsely imply "free"
/// and corrupt downstream price filtering.
fn normalize_offer(offer: AiOffer) -> Option<Offer> {
    let price = parse_price(offer.price.as_ref()?)?;
    Some(Offer {
        size: offer
            .size
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown".to_string()),
        price,
        in_stock: offer.stock_status.as_ref().is_some_and(parse_stock),
    })
}

/// Parse a price from the value shapes providers actually return.
fn parse_price(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|p| p.is_finite() && *p > 0.0),
        serde_json::Value::String(s) => parse_price_string(s),
        _ => None,
    }
}

/// Strip currency glyphs and grouping from a price string and parse the
/// leading decimal. Strings that do not start with a number after
/// stripping fail to parse and the offer is dropped.
pub fn parse_price_string(raw: &str) -> Option<f64> {
    let folded: String = raw
        .trim()
        .chars()
        .filter_map(|c| match c {
            // Full-width digits and point fold to ASCII.
            '０'..='９' => char::from_u32('0' as u32 + (c as u32 - '０' as u32)),
            '．' => Some('.'),
            // Currency glyphs, grouping, and whitespace vanish.
            '¥' | '￥' | '$' | '€' | '£' | '円' | ',' | '，' => None,
            c if c.is_whitespace() => None,
            c => Some(c),
        })
        .collect();

    let leading = Regex::new(r"^([0-9]+(?:\.[0-9]+)?)").expect("valid price pattern");
    let number = leading.captures(&folded)?.get(1)?.as_str();
    number.parse::<f64>().ok().filter(|p| p.is_finite() && *p > 0.0)
}

/// Coerce the provider's stock wording to a flag; anything not clearly
/// in stock counts as not purchasable right now.
fn parse_stock(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => {
            let s = s.trim().to_lowercase();
            matches!(
                s.as_str(),
                "in stock" | "yes" | "true" | "available" | "有" | "在庫あり" | "あり"
            )
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockModel;

    fn extractor() -> ProductExtractor {
        ProductExtractor::new(2, std::time::Duration::from_millis(1), 25_000)
    }

    const PAGE: &str = "<html><body>DMSO 500mL ¥3,000 価格</body></html>";

    #[test]
    fn test_parse_price_strings() {
        assert_eq!(parse_price_string("¥34,000"), Some(34_000.0));
        assert_eq!(parse_price_string("34,000円(税込)"), Some(34_000.0));
        assert_eq!(parse_price_string("￥３４，０００"), Some(34_000.0));
        assert_eq!(parse_price_string("1280.50"), Some(1280.5));
        assert_eq!(parse_price_string("$ 99"), Some(99.0));
    }

    #[test]
    fn test_malformed_prices_are_dropped_not_zeroed() {
        assert_eq!(parse_price_string("お問い合わせ"), None);
        assert_eq!(parse_price_string("Call for price"), None);
        assert_eq!(parse_price_string(""), None);
        assert_eq!(parse_price_string("¥0"), None);
        assert_eq!(parse_price_string("-500"), None);
    }

    #[tokio::test]
    async fn test_extract_happy_path() {
        let model = MockModel::new().with_response(
            r#"{"productName":"DMSO","modelNumber":"D-1234","manufacturer":null,
               "offers":[{"size":"500mL","price":"¥3,000","stockStatus":"in stock"}]}"#,
        );
        let cancel = CancellationToken::new();

        let product = extractor()
            .extract(&model, PAGE, "DMSO", &cancel)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(product.product_name, "DMSO");
        assert_eq!(product.manufacturer, "unknown");
        assert_eq!(product.offers.len(), 1);
        assert_eq!(product.offers[0].price, 3000.0);
        assert!(product.offers[0].in_stock);
    }

    #[tokio::test]
    async fn test_extract_tolerates_fenced_json() {
        let model = MockModel::new().with_response(
            "```json\n{\"productName\":\"DMSO\",\"modelNumber\":null,\"manufacturer\":null,\
             \"offers\":[{\"size\":\"1L\",\"price\":5500,\"stockStatus\":\"有\"}]}\n```",
        );
        let cancel = CancellationToken::new();

        let product = extractor()
            .extract(&model, PAGE, "DMSO", &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.offers[0].price, 5500.0);
        assert!(product.offers[0].in_stock);
    }

    #[tokio::test]
    async fn test_bad_offer_dropped_record_kept() {
        let model = MockModel::new().with_response(
            r#"{"productName":"DMSO","modelNumber":null,"manufacturer":"Sigma",
               "offers":[{"size":"500mL","price":"Call for price","stockStatus":"unknown"},
                         {"size":"1L","price":"¥5,500","stockStatus":"無"}]}"#,
        );
        let cancel = CancellationToken::new();

        let product = extractor()
            .extract(&model, PAGE, "DMSO", &cancel)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(product.offers.len(), 1);
        assert_eq!(product.offers[0].size, "1L");
        assert!(!product.offers[0].in_stock);
    }

    #[tokio::test]
    async fn test_retry_after_empty_response() {
        let model = MockModel::new()
            .with_response(r#"{"productName":null,"modelNumber":null,"manufacturer":null,"offers":[]}"#)
            .with_response(
                r#"{"productName":"DMSO","modelNumber":null,"manufacturer":null,
                   "offers":[{"size":"500mL","price":"¥3,000","stockStatus":"有"}]}"#,
            );
        let cancel = CancellationToken::new();

        let product = extractor()
            .extract(&model, PAGE, "DMSO", &cancel)
            .await
            .unwrap();
        assert!(product.is_some());
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_after_all_retries_is_not_an_error() {
        let model = MockModel::new().with_default_response(
            r#"{"productName":null,"modelNumber":null,"manufacturer":null,"offers":[]}"#,
        );
        let cancel = CancellationToken::new();

        let product = extractor().extract(&model, PAGE, "DMSO", &cancel).await.unwrap();
        assert!(product.is_none());
        // initial attempt + two retries
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_malformed_after_all_retries_is_an_error() {
        let model = MockModel::new().with_default_response("this is not json at all");
        let cancel = CancellationToken::new();

        let result = extractor().extract(&model, PAGE, "DMSO", &cancel).await;
        assert!(matches!(result, Err(ExtractError::Malformed(_))));
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_offers_with_name_returned_for_caller_to_discard() {
        let model = MockModel::new().with_default_response(
            r#"{"productName":"DMSO","modelNumber":null,"manufacturer":null,"offers":[]}"#,
        );
        let cancel = CancellationToken::new();

        let product = extractor()
            .extract(&model, PAGE, "DMSO", &cancel)
            .await
            .unwrap()
            .unwrap();
        assert!(product.offers.is_empty());
    }
}
