//! Fetch layer for static listing pages
//!
//! This module contains:
//! - A session-keeping HTTP client with bootstrap, delay and status mapping
//! - Browser-like headers and region cookies
//! - The bounded retry policy shared with the rendered-page extractor

mod client;
mod headers;
mod retry;

pub use client::{retry_after_delay, FetchClient, FetchedPage};
pub use headers::{bootstrap_headers, load_headers, region_cookie_jar, REGION_COOKIES};
pub use retry::RetryPolicy;
