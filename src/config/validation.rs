use crate::config::types::{CacheConfig, Config, HttpConfig, MoodleConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_moodle_config(&config.moodle)?;
    validate_http_config(&config.http)?;
    validate_cache_config(&config.cache)?;
    Ok(())
}

/// Validates the Moodle site configuration
fn validate_moodle_config(config: &MoodleConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url has no host: '{}'",
            config.base_url
        )));
    }

    for (name, path) in [
        ("login-path", &config.login_path),
        ("home-path", &config.home_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "{} must start with '/', got '{}'",
                name, path
            )));
        }
    }

    if config.session_cookie.trim().is_empty() {
        return Err(ConfigError::Validation(
            "session-cookie cannot be empty".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 || config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be > 0, got timeout-secs={} connect-timeout-secs={}",
            config.timeout_secs, config.connect_timeout_secs
        )));
    }

    if config.max_concurrent_details < 1 || config.max_concurrent_details > 64 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-details must be between 1 and 64, got {}",
            config.max_concurrent_details
        )));
    }

    Ok(())
}

/// Validates cache lifetimes
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    let values = [
        ("short-ttl", config.short_ttl),
        ("medium-ttl", config.medium_ttl),
        ("long-ttl", config.long_ttl),
        ("very-long-ttl", config.very_long_ttl),
        ("sweep-interval", config.sweep_interval),
        ("token-ttl", config.token_ttl),
    ];

    if let Some((name, _)) = values.iter().find(|(_, v)| *v == 0) {
        return Err(ConfigError::Validation(format!("{} must be > 0", name)));
    }

    Ok(())
}
