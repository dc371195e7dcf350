use crate::config::types::{BrowserConfig, Config, FetchConfig, RetryConfig, ShippingConfig};
use crate::routing::SiteBinding;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_retry_config(&config.retry)?;
    validate_browser_config(&config.browser)?;
    validate_shipping_config(&config.shipping)?;
    validate_site_bindings(&config.sites)?;
    Ok(())
}

/// Validates static-markup fetch settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    validate_http_url("bootstrap_url", &config.bootstrap_url)?;

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the retry policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.min_backoff_ms > config.max_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "min_backoff_ms ({}) cannot exceed max_backoff_ms ({})",
            config.min_backoff_ms, config.max_backoff_ms
        )));
    }

    if !config.multiplier.is_finite() || config.multiplier < 0.0 {
        return Err(ConfigError::Validation(format!(
            "multiplier must be a non-negative number, got {}",
            config.multiplier
        )));
    }

    Ok(())
}

/// Validates WebDriver settings
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    validate_http_url("webdriver_url", &config.webdriver_url)?;

    if config.render_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "render_timeout_ms must be >= 1".to_string(),
        ));
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll_interval_ms must be >= 1".to_string(),
        ));
    }

    if config.image_attempts == 0 {
        return Err(ConfigError::Validation(
            "image_attempts must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_shipping_config(config: &ShippingConfig) -> Result<(), ConfigError> {
    if config.fallback_fee < 0 {
        return Err(ConfigError::Validation(format!(
            "fallback_fee cannot be negative, got {}",
            config.fallback_fee
        )));
    }
    Ok(())
}

/// Validates the domain → site routing table
fn validate_site_bindings(sites: &[SiteBinding]) -> Result<(), ConfigError> {
    for binding in sites {
        if binding.domain.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' has an empty domain",
                binding.site_name
            )));
        }

        if binding.site_name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Domain '{}' has an empty site-name",
                binding.domain
            )));
        }
    }

    Ok(())
}

/// Checks that `value` parses as an http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}
