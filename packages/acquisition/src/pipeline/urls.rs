//! Candidate URL extraction from raw search-result markup.
//!
//! Search providers vary in markup shape, and a single pattern silently
//! misses valid links. Three independent patterns run over the same markup
//! (attribute-embedded, bare-text, redirect-wrapped), then the results are
//! normalized and deduplicated. No network I/O; pure function of the markup.

use indexmap::IndexMap;
use regex::Regex;
use url::Url;

use crate::types::product::CandidateUrl;

/// Domains that are never product pages, even when a domain substring
/// accidentally matches: the search engine itself, video/social platforms.
const EXCLUDED_DOMAINS: &[&str] = &[
    "google.com",
    "google.co.jp",
    "googleusercontent.com",
    "gstatic.com",
    "youtube.com",
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "linkedin.com",
    "wikipedia.org",
];

/// Path keywords that suggest a product page rather than a category root.
const PRODUCT_KEYWORDS: &[&str] = &[
    "product", "item", "detail", "catalog", "goods", "shop", "商品", "製品",
];

/// Extracts ranked, deduplicated candidate URLs for one target domain.
pub struct UrlExtractor {
    attribute_pattern: Regex,
    bare_pattern: Regex,
    redirect_pattern: Regex,
    digit_pattern: Regex,
    max_candidates: usize,
}

impl UrlExtractor {
    pub fn new(max_candidates: usize) -> Self {
        Self {
            attribute_pattern: Regex::new(r#"(?:href|src|data-url)\s*=\s*["']([^"']+)["']"#)
                .expect("valid attribute pattern"),
            bare_pattern: Regex::new(r#"https?://[^\s"'<>\\]+"#).expect("valid bare pattern"),
            redirect_pattern: Regex::new(r#"/url\?q=([^&"'<>\s]+)"#).expect("valid redirect pattern"),
            digit_pattern: Regex::new(r"[0-9]{3,}").expect("valid digit pattern"),
            max_candidates,
        }
    }

    /// Scan markup for product-page candidates on `domain`, highest score
    /// first. Two URLs that normalize identically are the same candidate
    /// (first encounter wins).
    pub fn extract(&self, markup: &str, domain: &str) -> Vec<CandidateUrl> {
        let mut seen: IndexMap<String, i32> = IndexMap::new();

        for raw in self.scan(markup) {
            let Some(normalized) = normalize_url(&raw) else {
                continue;
            };
            if !self.belongs_to(&normalized, domain) {
                continue;
            }
            let score = self.score(&normalized);
            seen.entry(normalized).or_insert(score);
        }

        let mut candidates: Vec<CandidateUrl> = seen
            .into_iter()
            .map(|(url, score)| CandidateUrl::new(url, score))
            .collect();

        // Stable sort: ties keep encounter order.
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates.truncate(self.max_candidates);
        candidates
    }

    /// All raw URL strings found by any pattern, in encounter order.
    fn scan(&self, markup: &str) -> Vec<String> {
        let mut raw: Vec<String> = Vec::new();

        for cap in self.attribute_pattern.captures_iter(markup) {
            if let Some(m) = cap.get(1) {
                raw.push(m.as_str().to_string());
            }
        }
        for m in self.bare_pattern.find_iter(markup) {
            raw.push(m.as_str().to_string());
        }
        for cap in self.redirect_pattern.captures_iter(markup) {
            if let Some(m) = cap.get(1) {
                raw.push(m.as_str().to_string());
            }
        }

        raw
    }

    /// True when the URL's host is on `domain` and not on the exclusion
    /// list.
    fn belongs_to(&self, url: &str, domain: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };

        if EXCLUDED_DOMAINS
            .iter()
            .any(|excluded| host == *excluded || host.ends_with(&format!(".{excluded}")))
        {
            return false;
        }

        host == domain || host.ends_with(&format!(".{domain}"))
    }

    /// Heuristic product-page score.
    fn score(&self, url: &str) -> i32 {
        let path = Url::parse(url)
            .ok()
            .map(|u| u.path().to_lowercase())
            .unwrap_or_default();

        let mut score = 0;
        if PRODUCT_KEYWORDS.iter().any(|kw| path.contains(kw)) {
            score += 10;
        }
        if self.digit_pattern.is_match(&path) {
            score += 5;
        }
        if url.len() < 40 {
            // Short URLs are usually category roots, not product pages.
            score -= 5;
        }
        score
    }
}

/// Normalize one raw URL string.
///
/// HTML-entity and percent decoding run to a fixpoint, which is what makes
/// the whole function idempotent: `normalize_url(normalize_url(u)) ==
/// normalize_url(u)` for every accepted `u`. Query and fragment are stripped
/// entirely, so no search-engine tracking parameter survives.
pub fn normalize_url(raw: &str) -> Option<String> {
    let mut url = raw.trim().to_string();

    loop {
        let decoded = percent_decode(&entity_decode(&url));
        if decoded == url {
            break;
        }
        url = decoded;
    }

    if let Some(pos) = url.find('#') {
        url.truncate(pos);
    }
    if let Some(pos) = url.find('?') {
        url.truncate(pos);
    }

    let url = url.trim_end_matches(['.', ',', ';', ':', '\'', '"', ')', ']', '>']);

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return None;
    }

    Some(url.to_string())
}

/// Decode the HTML entities search-result markup actually contains.
fn entity_decode(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x2F;", "/")
        .replace("&nbsp;", " ")
}

/// Decode %XX escapes; malformed escapes pass through untouched.
fn percent_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi as u8) << 4 | lo as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn extractor() -> UrlExtractor {
        UrlExtractor::new(10)
    }

    #[test]
    fn test_normalize_strips_query_and_fragment() {
        let url = normalize_url("https://example-chem.test/item/123?utm_source=serp&ref=abc#top");
        assert_eq!(url.as_deref(), Some("https://example-chem.test/item/123"));
    }

    #[test]
    fn test_normalize_decodes_entities_and_percents() {
        let url = normalize_url("https://example-chem.test/item/123&amp;x=1");
        assert_eq!(url.as_deref(), Some("https://example-chem.test/item/123&x=1"));

        let url = normalize_url("https://example-chem.test/%E5%95%86%E5%93%81/123");
        assert_eq!(url.as_deref(), Some("https://example-chem.test/商品/123"));
    }

    #[test]
    fn test_normalize_decodes_double_encoding_to_fixpoint() {
        // %2541 -> %41 -> A
        let url = normalize_url("https://example-chem.test/item/%2541");
        assert_eq!(url.as_deref(), Some("https://example-chem.test/item/A"));
    }

    #[test]
    fn test_normalize_trims_trailing_punctuation() {
        let url = normalize_url("https://example-chem.test/item/123).");
        assert_eq!(url.as_deref(), Some("https://example-chem.test/item/123"));
    }

    #[test]
    fn test_normalize_rejects_relative_urls() {
        assert_eq!(normalize_url("/item/123"), None);
        assert_eq!(normalize_url("javascript:void(0)"), None);
    }

    #[test]
    fn test_extract_finds_urls_from_all_patterns() {
        let markup = r#"
            <a href="https://example-chem.test/product/1234">one</a>
            plain text https://example-chem.test/item/5678 here
            <a href="/url?q=https%3A%2F%2Fexample-chem.test%2Fdetail%2F9012&amp;sa=U">redirect</a>
        "#;
        let candidates = extractor().extract(markup, "example-chem.test");
        let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();

        assert!(urls.contains(&"https://example-chem.test/product/1234"));
        assert!(urls.contains(&"https://example-chem.test/item/5678"));
        assert!(urls.contains(&"https://example-chem.test/detail/9012"));
    }

    #[test]
    fn test_extract_deduplicates_by_normalized_url() {
        let markup = r#"
            <a href="https://example-chem.test/item/1234?utm=1">a</a>
            <a href="https://example-chem.test/item/1234?utm=2">b</a>
            https://example-chem.test/item/1234
        "#;
        let candidates = extractor().extract(markup, "example-chem.test");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://example-chem.test/item/1234");
    }

    #[test]
    fn test_extract_drops_other_domains_and_excluded() {
        let markup = r#"
            <a href="https://www.google.com/search?q=dmso">search</a>
            <a href="https://www.youtube.com/watch?v=x">video</a>
            <a href="https://other-site.test/item/1234">other</a>
            <a href="https://example-chem.test/item/1234">ours</a>
        "#;
        let candidates = extractor().extract(markup, "example-chem.test");
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].url.contains("example-chem.test"));
    }

    #[test]
    fn test_excluded_domain_wins_over_domain_match() {
        // Even when the target domain itself is on the exclusion list
        // (accidental substring configuration), nothing comes back.
        let markup = r#"<a href="https://x.com/item/1234">x</a>"#;
        let candidates = extractor().extract(markup, "x.com");
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_extract_accepts_subdomains() {
        let markup = r#"<a href="https://shop.example-chem.test/item/1234">x</a>"#;
        let candidates = extractor().extract(markup, "example-chem.test");
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_scoring_prefers_product_pages() {
        let markup = r#"
            <a href="https://example-chem.test/">root</a>
            <a href="https://example-chem.test/news/about-our-company-history">news</a>
            <a href="https://example-chem.test/product/12345-dmso-reagent">product</a>
        "#;
        let candidates = extractor().extract(markup, "example-chem.test");
        assert_eq!(candidates[0].url, "https://example-chem.test/product/12345-dmso-reagent");
        // keyword + digits
        assert_eq!(candidates[0].score, 15);
        // bare root is short: penalized
        assert!(candidates.last().unwrap().score < 0);
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let markup = r#"
            <a href="https://example-chem.test/news/one-story-from-last-year">a</a>
            <a href="https://example-chem.test/news/two-story-from-last-year">b</a>
        "#;
        let candidates = extractor().extract(markup, "example-chem.test");
        assert_eq!(candidates[0].url, "https://example-chem.test/news/one-story-from-last-year");
    }

    #[test]
    fn test_max_candidates_cap() {
        let markup: String = (0..20)
            .map(|i| format!(r#"<a href="https://example-chem.test/item/{i:04}">x</a>"#))
            .collect();
        let candidates = UrlExtractor::new(5).extract(&markup, "example-chem.test");
        assert_eq!(candidates.len(), 5);
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in ".{0,200}") {
            if let Some(once) = normalize_url(&raw) {
                prop_assert_eq!(normalize_url(&once), Some(once.clone()));
            }
        }
    }
}
