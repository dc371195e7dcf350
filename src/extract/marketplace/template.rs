use std::fmt;

/// DOM layout of a rendered marketplace page, chosen from its URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTemplate {
    /// A listing posted by an individual seller
    IndividualListing,
    /// A listing sold through a shop storefront
    ShopListing,
    /// Search results
    ListingIndex,
}

/// URL fragments checked in order; the first one contained in the URL wins
const URL_MARKERS: [(&str, PageTemplate); 4] = [
    ("/item/", PageTemplate::IndividualListing),
    ("/products/", PageTemplate::ShopListing),
    ("/shops/product/", PageTemplate::ShopListing),
    ("https://jp.mercari.com/search", PageTemplate::ListingIndex),
];

impl PageTemplate {
    /// Classifies `url`; unknown shapes fall back to an individual listing
    pub fn classify(url: &str) -> Self {
        match Self::detect(url) {
            Some(template) => template,
            None => {
                tracing::warn!("Unknown page type for URL: {}", url);
                Self::IndividualListing
            }
        }
    }

    /// Classification without the fallback
    pub fn detect(url: &str) -> Option<Self> {
        URL_MARKERS
            .iter()
            .find(|(fragment, _)| url.contains(fragment))
            .map(|(_, template)| *template)
    }
}

impl fmt::Display for PageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IndividualListing => "individual-listing",
            Self::ShopListing => "shop-listing",
            Self::ListingIndex => "listing-index",
        };
        f.write_str(name)
    }
}
