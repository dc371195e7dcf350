//! Gallery image extraction for rendered pages
//!
//! Individual listings try an in-page script first and, while that yields
//! nothing, a wait-then-query fallback; each round is retried up to the
//! configured attempt count. Shop listings run a single script. Every failure
//! ends in an empty list, never an error.

use super::PageTemplate;
use crate::browser::{BrowserSession, Locator};
use crate::config::BrowserConfig;
use crate::HarvestError;
use serde_json::Value;

const GALLERY_SCRIPT: &str = r#"
    const images = document.querySelectorAll('.slick-list img');
    return Array.from(images).map(img => img.getAttribute('src'));
"#;

const SHOP_GALLERY_SCRIPT: &str = r#"
    const slides = document.querySelectorAll('[role="region"] .slick-list .slick-track .slick-slide');
    return Array.from(slides)
        .map(slide => slide.querySelector('img'))
        .filter(img => img !== null)
        .map(img => img.getAttribute('src'));
"#;

const GALLERY_XPATH: &str = r#"//div[@class="slick-list"]//img"#;

pub(super) async fn collect_images(
    session: &BrowserSession,
    config: &BrowserConfig,
    template: PageTemplate,
    url: &str,
) -> Vec<String> {
    match template {
        PageTemplate::IndividualListing => gallery_images(session, config, url).await,
        PageTemplate::ShopListing => match run_script(session, SHOP_GALLERY_SCRIPT, url).await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!("Failed to extract shop image URLs: {}", e);
                Vec::new()
            }
        },
        PageTemplate::ListingIndex => Vec::new(),
    }
}

async fn gallery_images(session: &BrowserSession, config: &BrowserConfig, url: &str) -> Vec<String> {
    let attempts = config.image_attempts.max(1);
    let mut urls = Vec::new();

    for attempt in 1..=attempts {
        tokio::time::sleep(config.image_settle()).await;

        match run_script(session, GALLERY_SCRIPT, url).await {
            Ok(found) if !found.is_empty() => return found,
            Ok(_) => {}
            Err(e) if attempt == attempts => {
                tracing::warn!("Failed to extract image URLs: {}", e);
            }
            Err(e) => {
                tracing::debug!("Image script attempt {} failed: {}", attempt, e);
                tokio::time::sleep(config.image_retry_pause()).await;
            }
        }

        match query_gallery(session, config).await {
            Ok(found) if !found.is_empty() => return found,
            Ok(found) => urls = found,
            Err(e) => tracing::debug!("Gallery query attempt {} failed: {}", attempt, e),
        }
    }

    urls
}

/// Waits for gallery images to exist, then reads their `src` attributes
async fn query_gallery(
    session: &BrowserSession,
    config: &BrowserConfig,
) -> Result<Vec<String>, HarvestError> {
    let locator = Locator::xpath(GALLERY_XPATH);
    session
        .wait_for(&locator, config.image_wait(), config.poll_interval())
        .await?;

    let mut urls = Vec::new();
    for element in session.find_all(&locator).await? {
        if let Some(src) = session.attribute(&element, "src").await? {
            urls.push(src);
        }
    }
    Ok(urls)
}

async fn run_script(session: &BrowserSession, script: &str, url: &str) -> Result<Vec<String>, HarvestError> {
    let value = session
        .execute(script)
        .await
        .map_err(|e| HarvestError::BrowserScript {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    string_list(value).ok_or_else(|| HarvestError::BrowserScript {
        url: url.to_string(),
        message: "script did not return a list".to_string(),
    })
}

/// Non-empty strings of a JSON array; `None` when the value is not an array
fn string_list(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.is_empty() => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}
