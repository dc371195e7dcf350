//! Session-keeping HTTP client for static listing pages
//!
//! # Request Flow
//!
//! 1. First fetch of the client's life, or first fetch after a failure:
//!    bootstrap a new session (region cookies + locale headers), request the
//!    site root to collect session cookies, then request the target URL.
//! 2. Every other fetch: sleep the fixed request delay, then request the
//!    target URL on the existing session.
//! 3. Map the response status to a document or a typed failure.
//!
//! # Status Mapping
//!
//! | Status | Outcome |
//! |--------|---------|
//! | 429 | sleep `Retry-After` seconds (if sent) → TooManyRequests |
//! | 403 | AccessDenied |
//! | 404 | NotFound |
//! | 410 | Gone |
//! | 301 | MovedPermanently |
//! | 302 | Found |
//! | other 300-599 | Http (status + body) |
//! | anything else | document |
//!
//! The whole fetch is wrapped in the configured [`RetryPolicy`]; the last
//! failure propagates once the attempts are spent.

use super::headers::{bootstrap_headers, load_headers, region_cookie_jar};
use super::retry::RetryPolicy;
use crate::config::FetchConfig;
use crate::{ConfigError, FetchError, FetchResult};
use reqwest::header::HeaderMap;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use scraper::Html;
use std::cell::{Cell, RefCell};
use std::time::Duration;
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,

    /// URL of the final response (differs after followed redirects)
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

impl FetchedPage {
    /// Parses the body into a navigable document tree
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Clients sharing one cookie jar, one per redirect mode
#[derive(Clone)]
struct HttpSession {
    following: Client,
    manual: Client,
}

impl HttpSession {
    fn client(&self, follow_redirects: bool) -> &Client {
        if follow_redirects {
            &self.following
        } else {
            &self.manual
        }
    }
}

/// HTTP client that keeps a cookie session across fetches
///
/// Owned by a single extractor and driven one request at a time.
pub struct FetchClient {
    config: FetchConfig,
    bootstrap_url: Url,
    retry: RetryPolicy,
    session: RefCell<Option<HttpSession>>,
    request_count: Cell<u64>,
    last_access_success: Cell<bool>,
}

impl FetchClient {
    /// Creates a client; no network traffic happens until the first fetch
    pub fn new(config: &FetchConfig, retry: RetryPolicy) -> Result<Self, ConfigError> {
        let bootstrap_url = Url::parse(&config.bootstrap_url).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid bootstrap_url '{}': {}",
                config.bootstrap_url, e
            ))
        })?;

        Ok(Self {
            config: config.clone(),
            bootstrap_url,
            retry,
            session: RefCell::new(None),
            request_count: Cell::new(0),
            last_access_success: Cell::new(false),
        })
    }

    /// Number of target-URL requests sent so far (bootstrap root hits excluded)
    pub fn request_count(&self) -> u64 {
        self.request_count.get()
    }

    /// Whether the next fetch will bootstrap a fresh session
    pub fn needs_bootstrap(&self) -> bool {
        self.request_count() == 0 || !self.last_access_success.get()
    }

    /// Fetches `url` with the configured delay and redirect mode
    pub async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        self.fetch_with(url, self.config.request_delay(), self.config.follow_redirects)
            .await
    }

    /// Fetches `url` with an explicit delay and redirect mode, retrying per policy
    pub async fn fetch_with(
        &self,
        url: &str,
        delay: Duration,
        follow_redirects: bool,
    ) -> FetchResult<FetchedPage> {
        self.retry
            .run(url, move || self.fetch_once(url, delay, follow_redirects))
            .await
    }

    async fn fetch_once(
        &self,
        url: &str,
        delay: Duration,
        follow_redirects: bool,
    ) -> FetchResult<FetchedPage> {
        let result = if self.needs_bootstrap() {
            self.fetch_bootstrapped(url, follow_redirects).await
        } else {
            self.fetch_in_session(url, delay, follow_redirects).await
        };

        self.last_access_success.set(result.is_ok());
        result
    }

    /// Opens a new session, visits the site root, then requests `url`
    async fn fetch_bootstrapped(&self, url: &str, follow_redirects: bool) -> FetchResult<FetchedPage> {
        tracing::debug!("Bootstrapping session via {}", self.bootstrap_url);
        let session = self.build_session().map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        let root = self.bootstrap_url.as_str();
        let root_response = session
            .following
            .get(root)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: root.to_string(),
                source,
            })?;
        tracing::debug!("Bootstrap root responded {}", root_response.status());

        self.session.replace(Some(session.clone()));

        self.request_count.set(self.request_count.get() + 1);
        let response = session
            .client(follow_redirects)
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        into_page(url, response).await
    }

    /// Requests `url` on the established session after the fixed delay
    async fn fetch_in_session(
        &self,
        url: &str,
        delay: Duration,
        follow_redirects: bool,
    ) -> FetchResult<FetchedPage> {
        let existing = self.session.borrow().clone();
        let session = match existing {
            Some(session) => session,
            None => return self.fetch_bootstrapped(url, follow_redirects).await,
        };

        self.request_count.set(self.request_count.get() + 1);
        tokio::time::sleep(delay).await;

        tracing::debug!("GET {}", url);
        let response = session
            .client(follow_redirects)
            .get(url)
            .headers(load_headers())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        into_page(url, response).await
    }

    fn build_session(&self) -> Result<HttpSession, reqwest::Error> {
        let jar = region_cookie_jar(&self.bootstrap_url);
        let headers = bootstrap_headers(&self.bootstrap_url);

        let builder = |policy: Policy| {
            Client::builder()
                .default_headers(headers.clone())
                .cookie_provider(jar.clone())
                .timeout(self.config.timeout())
                .connect_timeout(Duration::from_secs(10))
                .redirect(policy)
                .gzip(true)
                .brotli(true)
                .build()
        };

        Ok(HttpSession {
            following: builder(Policy::default())?,
            manual: builder(Policy::none())?,
        })
    }
}

/// Maps a response to a page or a typed failure
async fn into_page(url: &str, response: Response) -> FetchResult<FetchedPage> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = retry_after_delay(response.headers());
        match retry_after {
            Some(delay) => {
                tracing::info!("Retrying after {} seconds...", delay.as_secs());
                tokio::time::sleep(delay).await;
            }
            None => tracing::info!("Retry-After header not found."),
        }
        return Err(FetchError::TooManyRequests {
            url: url.to_string(),
            retry_after,
        });
    }

    let url_owned = url.to_string();
    match status.as_u16() {
        403 => return Err(FetchError::AccessDenied { url: url_owned }),
        404 => return Err(FetchError::NotFound { url: url_owned }),
        410 => return Err(FetchError::Gone { url: url_owned }),
        301 => {
            return Err(FetchError::MovedPermanently {
                location: location_header(response.headers()),
                url: url_owned,
            })
        }
        302 => {
            return Err(FetchError::Found {
                location: location_header(response.headers()),
                url: url_owned,
            })
        }
        300..=599 => {
            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                url: url_owned,
                status: code,
                body,
            });
        }
        _ => {}
    }

    let final_url = response.url().to_string();
    let body = response
        .text()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    Ok(FetchedPage {
        url: url_owned,
        final_url,
        status: status.as_u16(),
        body,
    })
}

/// Reads a `Retry-After` header given in whole seconds
pub fn retry_after_delay(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    match value.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            tracing::warn!("Ignoring non-numeric Retry-After value '{}'", value);
            None
        }
    }
}

fn location_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
