//! Listing-Harvest: marketplace listing extractor
//!
//! This crate fetches product listing pages from two marketplace sites, maps
//! their markup into one normalized record shape and keeps exactly one record
//! per input URL, even when a page cannot be fetched or parsed.

pub mod browser;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod harvest;
pub mod input;
pub mod output;
pub mod record;
pub mod routing;

use std::time::Duration;
use thiserror::Error;

/// Typed outcome of an HTTP fetch that did not produce a document
///
/// Every variant carries the URL that was requested.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP 301 Moved Permanently: {url}")]
    MovedPermanently {
        url: String,
        location: Option<String>,
    },

    #[error("HTTP 302 Found: {url}")]
    Found {
        url: String,
        location: Option<String>,
    },

    #[error("HTTP 403 Access Denied: {url}")]
    AccessDenied { url: String },

    #[error("HTTP 404 Not Found: {url}")]
    NotFound { url: String },

    #[error("HTTP 410 Gone: {url}")]
    Gone { url: String },

    #[error("HTTP 429 Too Many Requests: {url}")]
    TooManyRequests {
        url: String,
        retry_after: Option<Duration>,
    },

    #[error("HTTP error response {status} for {url}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// The URL whose fetch produced this failure
    pub fn url(&self) -> &str {
        match self {
            Self::MovedPermanently { url, .. }
            | Self::Found { url, .. }
            | Self::AccessDenied { url }
            | Self::NotFound { url }
            | Self::Gone { url }
            | Self::TooManyRequests { url, .. }
            | Self::Http { url, .. }
            | Self::Transport { url, .. } => url,
        }
    }

    /// HTTP status behind this failure, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::MovedPermanently { .. } => Some(301),
            Self::Found { .. } => Some(302),
            Self::AccessDenied { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Gone { .. } => Some(410),
            Self::TooManyRequests { .. } => Some(429),
            Self::Http { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

/// WebDriver protocol failures
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("WebDriver request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("No element matches {locator}")]
    NoSuchElement { locator: String },

    #[error("WebDriver command {command} failed with {error}: {message}")]
    Command {
        command: String,
        error: String,
        message: String,
    },

    #[error("Malformed WebDriver reply to {command}: {detail}")]
    Protocol { command: String, detail: String },

    #[error("Timed out after {waited:?} waiting for {locator}")]
    Timeout { locator: String, waited: Duration },
}

/// Main error type for Listing-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Failed to extract {field} from {url}: {reason}")]
    Extraction {
        url: String,
        field: &'static str,
        reason: String,
    },

    #[error("Page {url} did not render within {waited:?}")]
    RenderTimeout { url: String, waited: Duration },

    #[error("Browser script failed on {url}: {message}")]
    BrowserScript { url: String, message: String },

    #[error("No extractor for site '{0}'")]
    UnsupportedSite(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Shorthand for a field-level extraction failure
    pub fn extraction(url: &str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::Extraction {
            url: url.to_string(),
            field,
            reason: reason.into(),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Listing-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use harvest::Harvester;
pub use record::{Listing, NormalizedRecord, ScrapeRequest};
pub use routing::{SiteBinding, SiteKind};
