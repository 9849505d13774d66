use crate::config::types::{
    Config, CrawlerConfig, EndpointConfig, OutputConfig, RetryConfig, SampleConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Widest serial that still fits a `u32` cursor
const MAX_SERIAL_DIGITS: usize = 9;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_endpoint_config(&config.endpoint)?;
    validate_output_config(&config.output)?;
    validate_sample_config(&config.sample)?;
    Ok(())
}

/// Validates sweep configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "batch-size must be >= 1".to_string(),
        ));
    }

    if config.start_serial < 1 || config.start_serial > config.max_serial {
        return Err(ConfigError::Validation(format!(
            "start-serial must be between 1 and max-serial ({}), got {}",
            config.max_serial, config.start_serial
        )));
    }

    if config.serial_digits < 1 || config.serial_digits > MAX_SERIAL_DIGITS {
        return Err(ConfigError::Validation(format!(
            "serial-digits must be between 1 and {}, got {}",
            MAX_SERIAL_DIGITS, config.serial_digits
        )));
    }

    // The last batch may start at max-serial and run batch-size - 1 past it
    let widest = u64::from(config.max_serial) + u64::from(config.batch_size) - 1;
    let limit = 10u64.pow(config.serial_digits as u32);
    if widest >= limit {
        return Err(ConfigError::Validation(format!(
            "serial {} would not fit in {} digits; lower max-serial or batch-size",
            widest, config.serial_digits
        )));
    }

    if !(config.rate_limit_threshold > 0.0 && config.rate_limit_threshold <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "rate-limit-threshold must be in (0, 1], got {}",
            config.rate_limit_threshold
        )));
    }

    validate_regions(&config.regions)?;

    Ok(())
}

/// Validates the region list: non-empty, two-digit codes, no repeats
fn validate_regions(regions: &[u32]) -> Result<(), ConfigError> {
    if regions.is_empty() {
        return Err(ConfigError::Validation(
            "regions cannot be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for &region in regions {
        if !(1..=99).contains(&region) {
            return Err(ConfigError::Validation(format!(
                "region code must be between 1 and 99, got {}",
                region
            )));
        }
        if !seen.insert(region) {
            return Err(ConfigError::Validation(format!(
                "region {:02} is listed more than once",
                region
            )));
        }
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(
            "max-attempts must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates endpoint configuration
fn validate_endpoint_config(config: &EndpointConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if !(1900..=9999).contains(&config.year) {
        return Err(ConfigError::Validation(format!(
            "year must be a four-digit year, got {}",
            config.year
        )));
    }

    if config.request_timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.merged_file.is_empty() {
        return Err(ConfigError::Validation(
            "merged-file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates sample configuration
fn validate_sample_config(config: &SampleConfig) -> Result<(), ConfigError> {
    if config.size < 1 {
        return Err(ConfigError::Validation(
            "sample size must be >= 1".to_string(),
        ));
    }

    Ok(())
}
