//! Record types shared by both extractors
//!
//! A [`ScrapeRequest`] enters the pipeline, and exactly one
//! [`NormalizedRecord`] leaves it. A record either carries a complete
//! [`Listing`] or is partial (URL and index only) when extraction failed.

/// Separator used when image URLs are flattened into one cell
pub const IMAGE_SEPARATOR: &str = "|";

/// An input URL tagged with its position in the input list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScrapeRequest {
    pub url: String,
    pub original_index: usize,
}

impl ScrapeRequest {
    pub fn new(url: impl Into<String>, original_index: usize) -> Self {
        Self {
            url: url.into(),
            original_index,
        }
    }
}

/// Raw fields gathered by an extractor before derived fields are computed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingDraft {
    pub image_urls: Vec<String>,
    pub price: i64,
    pub shipping_fee: Option<i64>,
    pub shipping_region: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub condition: String,
}

/// Normalized listing fields, identical in shape for every site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub image_urls: Vec<String>,
    pub price: i64,
    pub shipping_fee: Option<i64>,
    /// `price + shipping_fee`, absent when the fee is unknown or the sum overflows
    pub total_price: Option<i64>,
    pub shipping_region: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub condition: String,
    /// Title, description and condition joined by newlines
    pub merged_info: String,
}

impl Listing {
    /// Image URLs as a single `|`-separated string
    pub fn joined_image_urls(&self) -> String {
        self.image_urls.join(IMAGE_SEPARATOR)
    }
}

impl From<ListingDraft> for Listing {
    fn from(draft: ListingDraft) -> Self {
        let total_price = draft
            .shipping_fee
            .and_then(|fee| draft.price.checked_add(fee));
        let merged_info = [
            draft.title.as_str(),
            draft.description.as_deref().unwrap_or(""),
            draft.condition.as_str(),
        ]
        .join("\n");

        let image_urls = draft
            .image_urls
            .into_iter()
            .filter(|url| !url.is_empty())
            .collect();

        Self {
            image_urls,
            price: draft.price,
            shipping_fee: draft.shipping_fee,
            total_price,
            shipping_region: draft.shipping_region,
            title: draft.title,
            description: draft.description,
            condition: draft.condition,
            merged_info,
        }
    }
}

/// One output row: the originating request plus the listing, if extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub original_url: String,
    pub original_index: usize,
    pub listing: Option<Listing>,
}

impl NormalizedRecord {
    pub fn complete(request: &ScrapeRequest, listing: Listing) -> Self {
        Self {
            original_url: request.url.clone(),
            original_index: request.original_index,
            listing: Some(listing),
        }
    }

    /// Record for a URL whose extraction failed or was never attempted
    pub fn partial(request: &ScrapeRequest) -> Self {
        Self {
            original_url: request.url.clone(),
            original_index: request.original_index,
            listing: None,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.listing.is_none()
    }
}
