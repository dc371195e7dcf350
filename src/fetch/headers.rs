//! Request headers and region cookies that make requests look like a
//! Japanese desktop browser

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use url::Url;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

/// Source address hint placed in a Japanese consumer range
const FORWARDED_FOR: &str = "126.0.0.1";

/// Locale cookies seeded into every new session
pub const REGION_COOKIES: [(&str, &str); 5] = [
    ("JP_LOCATION", "JP"),
    ("locale", "ja_JP"),
    ("country", "jp"),
    ("language", "ja"),
    ("region", "JP"),
];

/// Headers sent with every request made on an established session
pub fn load_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs = [
        ("user-agent", BROWSER_USER_AGENT),
        (
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
        ("accept-language", "ja,en-US;q=0.7,en;q=0.3"),
        ("connection", "keep-alive"),
        ("upgrade-insecure-requests", "1"),
        ("cache-control", "max-age=0"),
        ("content-language", "ja-JP"),
        ("x-forwarded-for", FORWARDED_FOR),
    ];
    for (name, value) in pairs {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

/// Default headers of a freshly bootstrapped session
///
/// Referer and Origin point at the bootstrap root so the first contact looks
/// like in-site navigation.
pub fn bootstrap_headers(root: &Url) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs = [
        ("user-agent", BROWSER_USER_AGENT),
        ("accept-language", "ja,en-US;q=0.9,en;q=0.8"),
        ("content-language", "ja-JP"),
        ("x-forwarded-for", FORWARDED_FOR),
    ];
    for (name, value) in pairs {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    if let Ok(referer) = HeaderValue::from_str(root.as_str()) {
        headers.insert(reqwest::header::REFERER, referer);
    }
    if let Ok(origin) = HeaderValue::from_str(&root.origin().ascii_serialization()) {
        headers.insert(reqwest::header::ORIGIN, origin);
    }

    headers
}

/// Builds a cookie jar pre-loaded with [`REGION_COOKIES`]
///
/// The cookies are scoped to the root's domain and every subdomain of it, so
/// item pages served from e.g. `page.auctions.yahoo.co.jp` receive them too.
/// IP-address roots get host-only cookies.
pub fn region_cookie_jar(root: &Url) -> Arc<Jar> {
    let jar = Arc::new(Jar::default());
    for (name, value) in REGION_COOKIES {
        jar.add_cookie_str(&region_set_cookie(name, value, root), root);
    }
    jar
}

fn region_set_cookie(name: &str, value: &str, root: &Url) -> String {
    let mut parts = vec![format!("{}={}", name, value)];
    if let Some(domain) = root.domain() {
        parts.push(format!("Domain={}", domain));
    }
    parts.push("Path=/".to_string());
    parts.join("; ")
}
