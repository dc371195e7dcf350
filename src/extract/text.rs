//! Text helpers shared by both extractors

use scraper::{ElementRef, Html, Selector};

/// Normalizes a text fragment for output
///
/// Decodes HTML entities, drops tags, collapses runs of whitespace into one
/// space and trims both ends.
///
/// ```
/// use listing_harvest::extract::clean_text;
///
/// assert_eq!(clean_text("  <b>Canon&nbsp;EOS</b>\n 5D  "), "Canon EOS 5D");
/// ```
pub fn clean_text(text: &str) -> String {
    let fragment = Html::parse_fragment(text);
    let plain: String = fragment.root_element().text().collect();
    plain.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps only ASCII digits and parses the result
///
/// Returns `None` when no digit is present or the number overflows.
pub fn parse_digits(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Shipping-fee heuristic: `0` when `marker` appears in `text`, else `fallback`
pub fn shipping_fee_from_marker(text: &str, marker: &str, fallback: i64) -> i64 {
    if text.contains(marker) {
        0
    } else {
        fallback
    }
}

/// All elements of `document` matching `css`, in document order
pub(crate) fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => {
            tracing::warn!("Invalid selector '{}'", css);
            Vec::new()
        }
    }
}

pub(crate) fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    select_all(document, css).into_iter().next()
}

/// Concatenated text of an element, trimmed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
