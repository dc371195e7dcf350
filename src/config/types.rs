use serde::Deserialize;
use std::time::Duration;

use crate::routing::SiteBinding;

/// Main configuration structure for Listing-Harvest
///
/// Every section falls back to its defaults, so a file holding only the
/// `[[site]]` routing entries is a complete configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub shipping: ShippingConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteBinding>,
}

/// Static-markup fetch behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Root page requested during the session bootstrap
    pub bootstrap_url: String,

    /// Fixed delay before every non-bootstrap request (milliseconds)
    pub request_delay_ms: u64,

    /// Whether 3xx responses are followed or surfaced as typed failures
    pub follow_redirects: bool,

    /// Whole-request timeout (seconds)
    pub timeout_secs: u64,
}

impl FetchConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            bootstrap_url: "https://auctions.yahoo.co.jp/".to_string(),
            request_delay_ms: 1500,
            follow_redirects: true,
            timeout_secs: 30,
        }
    }
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Lower clamp of the backoff wait (milliseconds)
    pub min_backoff_ms: u64,

    /// Upper clamp of the backoff wait (milliseconds)
    pub max_backoff_ms: u64,

    /// Seconds multiplied by 2^(attempt - 1) before clamping
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_backoff_ms: 4000,
            max_backoff_ms: 15000,
            multiplier: 1.0,
        }
    }
}

/// Rendered-markup (WebDriver) behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Base URL of the WebDriver server (chromedriver, geckodriver, ...)
    pub webdriver_url: String,

    /// Launch the browser without a window
    pub headless: bool,

    /// Implicit element-lookup wait applied after each navigation (milliseconds)
    pub implicit_wait_ms: u64,

    /// Maximum wait for the price element to appear (milliseconds)
    pub render_timeout_ms: u64,

    /// Interval between presence checks while waiting (milliseconds)
    pub poll_interval_ms: u64,

    /// Attempts per image-extraction layer
    pub image_attempts: u32,

    /// Pause before each image-extraction attempt (milliseconds)
    pub image_settle_ms: u64,

    /// Pause after a failed image-extraction attempt (milliseconds)
    pub image_retry_pause_ms: u64,

    /// Wait for gallery elements in the fallback image layer (milliseconds)
    pub image_wait_ms: u64,
}

impl BrowserConfig {
    pub fn implicit_wait(&self) -> Duration {
        Duration::from_millis(self.implicit_wait_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn image_settle(&self) -> Duration {
        Duration::from_millis(self.image_settle_ms)
    }

    pub fn image_retry_pause(&self) -> Duration {
        Duration::from_millis(self.image_retry_pause_ms)
    }

    pub fn image_wait(&self) -> Duration {
        Duration::from_millis(self.image_wait_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            implicit_wait_ms: 5000,
            render_timeout_ms: 10000,
            poll_interval_ms: 500,
            image_attempts: 3,
            image_settle_ms: 2000,
            image_retry_pause_ms: 1000,
            image_wait_ms: 10000,
        }
    }
}

/// Shipping-fee heuristic
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ShippingConfig {
    /// Fee assumed whenever the page carries no free-shipping marker
    pub fallback_fee: i64,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self { fallback_fee: 2000 }
    }
}

/// Input list location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// CSV or XLSX file whose first column holds the URLs
    pub path: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: "input.csv".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `output_<timestamp>.csv`
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}
