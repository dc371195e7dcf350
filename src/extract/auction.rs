//! Static-markup extractor for auction listings
//!
//! Each URL goes through the [`FetchClient`] (bootstrap, delay, retry) and
//! the returned document is mapped field by field:
//!
//! | Field | Source |
//! |-------|--------|
//! | price | `#__NEXT_DATA__` JSON, `bidorbuy` else `price` (required) |
//! | shipping fee | `li span` containing 送料無料 → 0, else fallback fee |
//! | shipping region | `div#itemInfo` term 発送元の地域 → next `dd` |
//! | condition | term 商品の状態 → next `dd`; legacy table head 状態 → data cell |
//! | images | gallery `img[src]`, de-duplicated |
//! | description | comment body or `#description` |
//! | title | `#itemTitle` (required) |

use super::text::{
    clean_text, element_text, parse_digits, select_all, select_first, shipping_fee_from_marker,
};
use super::{crawl, ListingScraper};
use crate::config::Config;
use crate::fetch::{FetchClient, RetryPolicy};
use crate::record::{Listing, ListingDraft, NormalizedRecord, ScrapeRequest};
use crate::{ConfigError, HarvestError};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashSet;

/// Site name this extractor is bound to in the routing table
pub const SITE_NAME: &str = "yahauc";

const FREE_SHIPPING: &str = "送料無料";
const REGION_LABEL: &str = "発送元の地域";
const CONDITION_LABEL: &str = "商品の状態";
const LEGACY_CONDITION_LABEL: &str = "状態";

const PAGE_DATA_SELECTOR: &str = "#__NEXT_DATA__";
const IMAGE_SELECTOR: &str = ".ProductImage__image img, .slick-slider img";
const DESCRIPTION_SELECTOR: &str = ".ProductExplanation__commentBody, #description";
const TITLE_SELECTOR: &str = "#itemTitle";

/// Extractor for the auction site's server-rendered item pages
pub struct AuctionExtractor {
    client: FetchClient,
    fallback_fee: i64,
}

impl AuctionExtractor {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let client = FetchClient::new(&config.fetch, RetryPolicy::from(&config.retry))?;
        Ok(Self::with_client(client, config.shipping.fallback_fee))
    }

    pub fn with_client(client: FetchClient, fallback_fee: i64) -> Self {
        Self {
            client,
            fallback_fee,
        }
    }

    /// Scrapes every request in order, one record per request
    pub async fn run(&self, requests: &[ScrapeRequest]) -> Vec<NormalizedRecord> {
        crawl(SITE_NAME, self, requests).await
    }

    /// Fetches and extracts a single listing
    pub async fn scrape(&self, url: &str) -> Result<Listing, HarvestError> {
        let page = self.client.fetch(url).await?;
        let document = page.document();
        parse_listing(&document, url, self.fallback_fee)
    }
}

impl ListingScraper for AuctionExtractor {
    async fn scrape(&self, url: &str) -> Result<Listing, HarvestError> {
        AuctionExtractor::scrape(self, url).await
    }
}

/// Maps a fetched item page to a [`Listing`]
pub fn parse_listing(document: &Html, url: &str, fallback_fee: i64) -> Result<Listing, HarvestError> {
    let image_urls = extract_image_urls(document);
    let price = extract_price(document, url)?;
    let shipping_fee = extract_shipping_fee(document, fallback_fee);
    let shipping_region = extract_shipping_region(document);
    let title = extract_title(document, url)?;
    let description = extract_description(document);
    let condition = extract_condition(document);

    Ok(Listing::from(ListingDraft {
        image_urls,
        price,
        shipping_fee: Some(shipping_fee),
        shipping_region,
        title,
        description,
        condition,
    }))
}

/// Buy-it-now price when offered, else the current price
pub fn extract_price(document: &Html, url: &str) -> Result<i64, HarvestError> {
    let script = select_first(document, PAGE_DATA_SELECTOR)
        .ok_or_else(|| HarvestError::extraction(url, "price", "embedded page data not found"))?;
    let raw: String = script.text().collect();

    let data: Value = serde_json::from_str(&raw).map_err(|e| {
        HarvestError::extraction(url, "price", format!("embedded page data is not JSON: {}", e))
    })?;

    let detail = data
        .pointer("/props/initialState/item/detail")
        .ok_or_else(|| HarvestError::extraction(url, "price", "item detail missing"))?;

    let value = detail
        .get("bidorbuy")
        .filter(|v| !v.is_null())
        .or_else(|| detail.get("price"))
        .ok_or_else(|| HarvestError::extraction(url, "price", "no price field"))?;

    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    parse_digits(&text)
        .ok_or_else(|| HarvestError::extraction(url, "price", format!("no digits in '{}'", text)))
}

pub fn extract_shipping_fee(document: &Html, fallback_fee: i64) -> i64 {
    let spans: Vec<String> = select_all(document, "li span")
        .into_iter()
        .map(element_text)
        .collect();
    shipping_fee_from_marker(&spans.join("\n"), FREE_SHIPPING, fallback_fee)
}

pub fn extract_shipping_region(document: &Html) -> Option<String> {
    let term = select_all(document, "div#itemInfo dt")
        .into_iter()
        .find(|dt| element_text(*dt) == REGION_LABEL)?;

    term.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "dd")
        .map(|dd| clean_text(&element_text(dd)))
}

/// Item condition, trying the current layout then the legacy table layout
///
/// Returns an empty string (never an error) when neither layout is present.
pub fn extract_condition(document: &Html) -> String {
    if let Some(term) = select_all(document, "dt")
        .into_iter()
        .find(|dt| element_text(*dt) == CONDITION_LABEL)
    {
        if let Some(dd) = following_element(document, term, "dd") {
            return clean_text(&element_text(dd));
        }
    }

    if let Some(head) = select_all(document, ".Section__tableHead")
        .into_iter()
        .find(|th| element_text(*th) == LEGACY_CONDITION_LABEL)
    {
        let cell = head
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|row| {
                let selector = Selector::parse("td.Section__tableData").ok()?;
                let cell = row.select(&selector).next();
                cell
            });
        if let Some(cell) = cell {
            let text = element_text(cell);
            let first_line = text.lines().next().unwrap_or_default();
            return clean_text(first_line);
        }
    }

    tracing::warn!("No item condition found");
    String::new()
}

/// Gallery image sources, de-duplicated, first occurrence wins
pub fn extract_image_urls(document: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    select_all(document, IMAGE_SELECTOR)
        .into_iter()
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| !src.is_empty())
        .filter(|src| seen.insert(src.to_string()))
        .map(str::to_string)
        .collect()
}

pub fn extract_description(document: &Html) -> Option<String> {
    select_first(document, DESCRIPTION_SELECTOR).map(element_text)
}

pub fn extract_title(document: &Html, url: &str) -> Result<String, HarvestError> {
    select_first(document, TITLE_SELECTOR)
        .map(|el| clean_text(&element_text(el)))
        .ok_or_else(|| HarvestError::extraction(url, "title", "#itemTitle not found"))
}

/// First `name` element after `anchor` in document order
fn following_element<'a>(document: &'a Html, anchor: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .skip_while(|node| node.id() != anchor.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == name)
}
