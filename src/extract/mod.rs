//! Site extractors
//!
//! This module contains:
//! - The per-URL crawl loop, the one place where a failed scrape is turned
//!   into a partial record
//! - The static-markup auction extractor
//! - The rendered-markup marketplace extractor
//! - Text and shipping helpers both extractors share

pub mod auction;
pub mod marketplace;
mod text;

pub use auction::AuctionExtractor;
pub use marketplace::{MarketplaceExtractor, PageTemplate};
pub use text::{clean_text, parse_digits, shipping_fee_from_marker};

use crate::record::{Listing, NormalizedRecord, ScrapeRequest};
use crate::HarvestError;

/// Something that turns one listing URL into a [`Listing`]
pub(crate) trait ListingScraper {
    async fn scrape(&self, url: &str) -> Result<Listing, HarvestError>;
}

/// Scrapes `requests` one after another in input order
///
/// Always returns exactly one record per request; a failed scrape becomes a
/// partial record and the loop moves on.
pub(crate) async fn crawl<S: ListingScraper>(
    site: &str,
    scraper: &S,
    requests: &[ScrapeRequest],
) -> Vec<NormalizedRecord> {
    let total = requests.len();
    let mut records = Vec::with_capacity(total);
    let mut succeeded = 0usize;

    for (i, request) in requests.iter().enumerate() {
        let position = i + 1;
        let percent = position as f64 / total as f64 * 100.0;
        tracing::info!(
            site,
            "Scraping URL {}/{} ({:.1}%): {}",
            position,
            total,
            percent,
            request.url
        );

        match scraper.scrape(&request.url).await {
            Ok(listing) => {
                succeeded += 1;
                tracing::info!(
                    site,
                    "Successfully scraped URL {}/{} ({:.1}%)",
                    position,
                    total,
                    percent
                );
                records.push(NormalizedRecord::complete(request, listing));
            }
            Err(e) => {
                tracing::error!(
                    site,
                    "Error scraping URL {}/{} ({:.1}%): {} - {}",
                    position,
                    total,
                    percent,
                    request.url,
                    e
                );
                records.push(NormalizedRecord::partial(request));
            }
        }
    }

    if total > 0 {
        tracing::info!(
            site,
            "Completed scraping {}/{} URLs ({:.1}% success rate)",
            succeeded,
            total,
            succeeded as f64 / total as f64 * 100.0
        );
    } else {
        tracing::info!(site, "No URLs to scrape");
    }

    records
}
