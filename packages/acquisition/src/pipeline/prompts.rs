//! Extraction prompt for the structured-extraction provider.
//!
//! The template and the required JSON shape are part of the provider
//! contract; response parsing in [`crate::pipeline::extract`] depends on
//! this exact shape.

/// Prompt for extracting one product with its offers from page text.
pub const PRODUCT_EXTRACT_PROMPT: &str = r#"You are an expert at extracting product information from chemical reagent e-commerce pages.

Extract information about "{target}" from the page content below.

Page content:
```
{content}
```

Extraction rules:
1. Only extract a product whose name matches or closely resembles "{target}".
2. If the page lists multiple pack sizes and prices, include every one as a separate offer.
3. If stock status is not shown for an offer, use "unknown".
4. If the manufacturer is not shown, use null.

Always respond with a single JSON object in exactly this shape:
```json
{
  "productName": "product name or null",
  "modelNumber": "catalog or CAS number, or null",
  "manufacturer": "manufacturer name or null",
  "offers": [
    {
      "size": "pack size (e.g. 1mg, 500mL)",
      "price": "price as shown (e.g. ¥34,000)",
      "stockStatus": "in stock / out of stock / unknown"
    }
  ]
}
```

If no matching product is on the page, respond with the same object with null fields and an empty offers array."#;

/// Fill the extraction prompt template.
pub fn format_extract_prompt(target: &str, content: &str) -> String {
    PRODUCT_EXTRACT_PROMPT
        .replace("{target}", target)
        .replace("{content}", content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_substitutes_both_placeholders() {
        let prompt = format_extract_prompt("DMSO", "page body");
        assert!(prompt.contains("about \"DMSO\""));
        assert!(prompt.contains("page body"));
        assert!(!prompt.contains("{target}"));
        assert!(!prompt.contains("{content}"));
    }

    #[test]
    fn test_contract_shape_is_stable() {
        assert!(PRODUCT_EXTRACT_PROMPT.contains("\"productName\""));
        assert!(PRODUCT_EXTRACT_PROMPT.contains("\"modelNumber\""));
        assert!(PRODUCT_EXTRACT_PROMPT.contains("\"manufacturer\""));
        assert!(PRODUCT_EXTRACT_PROMPT.contains("\"offers\""));
    }
}
