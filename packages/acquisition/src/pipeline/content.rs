//! Page content preparation and block-page detection.
//!
//! Structural noise (scripts, styles, navigation, footers, forms) carries no
//! product signal and wastes extraction context, so it is stripped before the
//! text is truncated and handed to the model. Block pages are classified here
//! so they never reach the extraction provider, which can hallucinate on
//! challenge boilerplate.

use regex::Regex;

/// Phrases that mark an anti-bot challenge page. One hit is enough; a
/// challenge page is an HTTP 200 that contains no product content at all.
const BLOCK_PHRASES: &[&str] = &[
    "checking your browser",
    "verify you are human",
    "are you a robot",
    "captcha",
    "access denied",
    "attention required",
    "please enable javascript and cookies",
    "unusual traffic",
    "アクセスが拒否されました",
    "ロボットではありません",
    "セキュリティチェック",
];

/// Phrases that mark a soft-404 / error page. These words also appear in
/// normal footers, so two hits are required before the page is rejected.
const ERROR_PHRASES: &[&str] = &[
    "404",
    "not found",
    "ページが見つかりません",
    "お探しのページは見つかりませんでした",
    "該当する商品がありません",
];

/// Keywords suggesting the page carries price information at all.
const PRICE_KEYWORDS: &[&str] = &["価格", "円", "¥", "税", "price", "jpy", "送料"];

/// Classifies fetched content as blocked/unusable vs. worth extracting.
pub struct BlockDetector;

impl BlockDetector {
    /// True when the content is an anti-bot challenge page.
    pub fn is_blocked(content: &str) -> bool {
        let lower = content.to_lowercase();
        BLOCK_PHRASES.iter().any(|phrase| lower.contains(phrase))
    }

    /// True when the content looks like an error page rather than a product
    /// page (two or more error phrases).
    pub fn is_error_page(content: &str) -> bool {
        let lower = content.to_lowercase();
        let hits = ERROR_PHRASES
            .iter()
            .filter(|phrase| lower.contains(*phrase))
            .count();
        hits >= 2
    }
}

/// True when the content mentions prices at all. Pages without a single
/// price keyword almost never extract successfully; callers log this before
/// spending an extraction call.
pub fn has_price_signal(content: &str) -> bool {
    let lower = content.to_lowercase();
    PRICE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Strip structural noise from HTML and truncate to `max_chars`.
///
/// Content beyond the bound is assumed not to contain the primary product
/// table.
pub fn page_text(html: &str, max_chars: usize) -> String {
    let mut text = html.to_string();

    for pattern in [
        r"(?is)<script[^>]*>.*?</script>",
        r"(?is)<style[^>]*>.*?</style>",
        r"(?is)<nav[^>]*>.*?</nav>",
        r"(?is)<footer[^>]*>.*?</footer>",
        r"(?is)<form[^>]*>.*?</form>",
        r"(?is)<!--.*?-->",
    ] {
        let re = Regex::new(pattern).expect("valid strip pattern");
        text = re.replace_all(&text, " ").to_string();
    }

    // Keep block boundaries readable for the model.
    let br = Regex::new(r"(?i)<(?:br|/p|/div|/tr|/li|/h[1-6])\s*/?>").expect("valid break pattern");
    text = br.replace_all(&text, "\n").to_string();

    let tag = Regex::new(r"<[^>]+>").expect("valid tag pattern");
    text = tag.replace_all(&text, " ").to_string();

    text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    let collapse = Regex::new(r"[ \t]{2,}").expect("valid collapse pattern");
    text = collapse.replace_all(&text, " ").to_string();
    let blank = Regex::new(r"\n{3,}").expect("valid blank pattern");
    text = blank.replace_all(&text, "\n\n").to_string();

    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        trimmed.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_detection() {
        assert!(BlockDetector::is_blocked(
            "<html>Checking your browser before accessing the site</html>"
        ));
        assert!(BlockDetector::is_blocked("please solve this CAPTCHA"));
        assert!(BlockDetector::is_blocked("アクセスが拒否されました"));
        assert!(!BlockDetector::is_blocked(
            "<html>DMSO 500mL ¥3,000 in stock</html>"
        ));
    }

    #[test]
    fn test_error_page_needs_two_hits() {
        // A single "404" in a path is not enough.
        assert!(!BlockDetector::is_error_page("see /docs/404-handling for details"));
        assert!(BlockDetector::is_error_page(
            "404 — the page you requested was not found"
        ));
        assert!(BlockDetector::is_error_page(
            "404 お探しのページは見つかりませんでした"
        ));
    }

    #[test]
    fn test_price_signal() {
        assert!(has_price_signal("DMSO 500mL ¥3,000"));
        assert!(has_price_signal("Price: 3000 JPY"));
        assert!(!has_price_signal("Material safety data sheet"));
    }

    #[test]
    fn test_page_text_strips_noise() {
        let html = r#"
            <html><head><style>body { color: red }</style>
            <script>tracking();</script></head>
            <body><nav>Home | Products</nav>
            <p>DMSO 500mL</p><p>¥3,000</p>
            <form><input name="qty"/></form>
            <footer>Copyright</footer></body></html>
        "#;
        let text = page_text(html, 1000);
        assert!(text.contains("DMSO 500mL"));
        assert!(text.contains("¥3,000"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("Home | Products"));
    }

    #[test]
    fn test_page_text_truncates_on_char_boundary() {
        let html = format!("<p>{}</p>", "価".repeat(100));
        let text = page_text(&html, 10);
        assert_eq!(text.chars().count(), 10);
    }
}
