//! The acquisition pipeline: URL extraction, content preparation,
//! structured extraction, similarity filtering, and the per-site and
//! campaign orchestrators that drive them.

pub mod campaign;
pub mod content;
pub mod extract;
pub mod prompts;
pub mod similarity;
pub mod site;
pub mod urls;

pub use campaign::Campaign;
pub use content::{has_price_signal, page_text, BlockDetector};
pub use extract::{parse_price_string, ExtractedProduct, ProductExtractor};
pub use prompts::{format_extract_prompt, PRODUCT_EXTRACT_PROMPT};
pub use similarity::SimilarityFilter;
pub use urls::{normalize_url, UrlExtractor};
