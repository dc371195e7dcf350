//! Rendered-markup extractor for marketplace listings
//!
//! # Session Lifecycle
//!
//! One [`BrowserSession`] is opened at the start of [`MarketplaceExtractor::run`],
//! reused for every URL of the group and closed when the group is done, even
//! if individual URLs failed. If the session cannot be opened, every URL of
//! the group becomes a partial record.
//!
//! # Per-URL Flow
//!
//! 1. Navigate and set the implicit wait
//! 2. Block until a price element is present (render timeout → failure)
//! 3. Classify the page template from the URL
//! 4. Read images, price, title, detail-table rows and description
//!
//! The whole per-URL flow is wrapped in the shared [`RetryPolicy`].

mod images;
mod template;

pub use template::PageTemplate;

use super::text::{clean_text, parse_digits, shipping_fee_from_marker};
use super::{crawl, ListingScraper};
use crate::browser::{BrowserSession, ElementHandle, Locator};
use crate::config::{BrowserConfig, Config};
use crate::fetch::RetryPolicy;
use crate::record::{Listing, ListingDraft, NormalizedRecord, ScrapeRequest};
use crate::{BrowserError, HarvestError};

/// Site name this extractor is bound to in the routing table
pub const SITE_NAME: &str = "mercari";

const PRICE_SELECTOR: &str = "[data-testid='price'],[data-testid='product-price']";
const TITLE_SELECTOR: &str = "h1[class*=heading__]";
const DETAIL_TABLE_XPATH: &str =
    r#".//h2[contains(text(),"商品の情報")]/ancestor::node()/ancestor::node()/following-sibling::node()"#;
const DESCRIPTION_XPATH: &str = "//*[@data-testid='description']";
const SHOP_DESCRIPTION_XPATH: &str =
    r#"//*[contains(@class,"heading__") and contains(text(),"商品の説明")]/ancestor::*/following-sibling::*"#;

const CONDITION_LABEL: &str = "商品の状態";
const SHIPPING_LABEL: &str = "配送料の負担";
const REGION_LABEL: &str = "発送元の地域";
const SHIPPING_INCLUDED: &str = "送料込み";

/// Extractor for script-rendered marketplace item pages
pub struct MarketplaceExtractor {
    browser: BrowserConfig,
    retry: RetryPolicy,
    fallback_fee: i64,
}

impl MarketplaceExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            browser: config.browser.clone(),
            retry: RetryPolicy::from(&config.retry),
            fallback_fee: config.shipping.fallback_fee,
        }
    }

    /// Scrapes every request through one browser session
    pub async fn run(&self, requests: &[ScrapeRequest]) -> Vec<NormalizedRecord> {
        let session = match BrowserSession::open(&self.browser).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(
                    "Could not open browser session ({}); {} URL(s) left unscraped",
                    e,
                    requests.len()
                );
                return requests.iter().map(NormalizedRecord::partial).collect();
            }
        };

        let scraper = RenderedPageScraper {
            session: &session,
            config: &self.browser,
            retry: &self.retry,
            fallback_fee: self.fallback_fee,
        };
        let records = crawl(SITE_NAME, &scraper, requests).await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }
        records
    }
}

/// Per-run view of the extractor bound to a live session
struct RenderedPageScraper<'a> {
    session: &'a BrowserSession,
    config: &'a BrowserConfig,
    retry: &'a RetryPolicy,
    fallback_fee: i64,
}

impl ListingScraper for RenderedPageScraper<'_> {
    async fn scrape(&self, url: &str) -> Result<Listing, HarvestError> {
        self.retry.run(url, move || self.scrape_once(url)).await
    }
}

impl RenderedPageScraper<'_> {
    async fn scrape_once(&self, url: &str) -> Result<Listing, HarvestError> {
        let session = self.session;
        session.goto(url).await?;
        session.set_implicit_wait(self.config.implicit_wait()).await?;

        let price_locator = Locator::css(PRICE_SELECTOR);
        match session
            .wait_for(&price_locator, self.config.render_timeout(), self.config.poll_interval())
            .await
        {
            Ok(()) => {}
            Err(BrowserError::Timeout { waited, .. }) => {
                return Err(HarvestError::RenderTimeout {
                    url: url.to_string(),
                    waited,
                })
            }
            Err(e) => return Err(e.into()),
        }

        let template = PageTemplate::classify(url);
        tracing::debug!("Rendered {} as {}", url, template);

        let image_urls = images::collect_images(session, self.config, template, url).await;

        let price_element = session.find(&price_locator).await?;
        let price_text = self.text_content(&price_element).await?;
        let price = parse_digits(&price_text).ok_or_else(|| {
            HarvestError::extraction(url, "price", format!("no digits in '{}'", price_text))
        })?;

        let title_element = session.find(&Locator::css(TITLE_SELECTOR)).await?;
        let title = self.text_content(&title_element).await?;

        let table = session.find(&Locator::xpath(DETAIL_TABLE_XPATH)).await?;
        let shipping_region = self
            .detail_row(&table, REGION_LABEL)
            .await?
            .map(|text| clean_text(&text));
        let description = self.description(&table, template).await?;
        let condition = self
            .detail_row(&table, CONDITION_LABEL)
            .await?
            .map(|text| clean_text(&text))
            .ok_or_else(|| HarvestError::extraction(url, "condition", "detail row not found"))?;
        let shipping_fee = self
            .detail_row(&table, SHIPPING_LABEL)
            .await?
            .map(|text| shipping_fee_from_marker(&text, SHIPPING_INCLUDED, self.fallback_fee));

        Ok(Listing::from(ListingDraft {
            image_urls,
            price,
            shipping_fee,
            shipping_region,
            title,
            description: Some(description),
            condition,
        }))
    }

    /// Template-specific description followed by `|` and the detail table text
    async fn description(
        &self,
        table: &ElementHandle,
        template: PageTemplate,
    ) -> Result<String, HarvestError> {
        let table_text = self.session.text(table).await?;

        let description = match template {
            PageTemplate::IndividualListing => {
                let element = self.session.find(&Locator::xpath(DESCRIPTION_XPATH)).await?;
                self.session.text(&element).await?
            }
            PageTemplate::ShopListing => {
                let element = self
                    .session
                    .find(&Locator::xpath(SHOP_DESCRIPTION_XPATH))
                    .await?;
                self.text_content(&element).await?
            }
            PageTemplate::ListingIndex => String::new(),
        };

        Ok(format!("{}|{}", description, table_text))
    }

    /// Text of the value cell next to `label` in the detail table
    ///
    /// `Ok(None)` when the table has no such row.
    async fn detail_row(
        &self,
        table: &ElementHandle,
        label: &str,
    ) -> Result<Option<String>, HarvestError> {
        let locator = Locator::xpath(format!(
            r#".//*[contains(text(),"{}")]/ancestor::node()/following-sibling::node()"#,
            label
        ));
        match self.session.find_within(table, &locator).await {
            Ok(cell) => Ok(Some(self.text_content(&cell).await?)),
            Err(BrowserError::NoSuchElement { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn text_content(&self, element: &ElementHandle) -> Result<String, HarvestError> {
        let text = self.session.property(element, "textContent").await?;
        Ok(text.unwrap_or_default().trim().to_string())
    }
}
