use super::SiteBinding;

/// Checks whether a URL belongs to a routing entry
///
/// Routing is deliberately loose: the entry's domain only has to appear
/// somewhere in the URL text, so `auctions.yahoo.co.jp` matches
/// `https://page.auctions.yahoo.co.jp/jp/auction/x` as well.
///
/// # Examples
///
/// ```
/// use listing_harvest::routing::matches_domain;
///
/// assert!(matches_domain("jp.mercari.com", "https://jp.mercari.com/item/m123"));
/// assert!(!matches_domain("jp.mercari.com", "https://mercari.com/item/m123"));
/// ```
pub fn matches_domain(domain: &str, url: &str) -> bool {
    !domain.is_empty() && url.contains(domain)
}

/// Returns the first routing entry whose domain appears in the URL
pub fn route<'a>(url: &str, bindings: &'a [SiteBinding]) -> Option<&'a SiteBinding> {
    bindings
        .iter()
        .find(|binding| matches_domain(&binding.domain, url))
}
