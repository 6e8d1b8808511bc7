use crate::config::types::{Config, CrawlerConfig, ServerConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Called once at startup; any error here is fatal and the run never begins.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_seeds(&config.seeds)?;
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    validate_server_config(&config.server)?;
    Ok(())
}

/// Validates the seed URL list
fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' must use the http or https scheme",
                seed
            )));
        }
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !config.delay_seconds.is_finite() || config.delay_seconds < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay-seconds must be a finite value >= 0, got {}",
            config.delay_seconds
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.request_timeout_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-seconds must be >= 1, got {}",
            config.request_timeout_seconds
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.enabled && config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty when storage is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validates server configuration
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config
        .bind_address
        .parse::<std::net::SocketAddr>()
        .map_err(|e| {
            ConfigError::Validation(format!(
                "bind-address '{}' is not a valid socket address: {}",
                config.bind_address, e
            ))
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::OutputConfig;

    fn create_test_config() -> Config {
        Config {
            seeds: vec!["https://example.com/".to_string()],
            crawler: CrawlerConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            output: OutputConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = create_test_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_seeds_rejected() {
        let mut config = create_test_config();
        config.seeds.clear();

        let result = validate(&config);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_non_http_seed_rejected() {
        let mut config = create_test_config();
        config.seeds = vec!["ftp://example.com/".to_string()];

        let result = validate(&config);
        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_malformed_seed_rejected() {
        let mut config = create_test_config();
        config.seeds = vec!["not a url".to_string()];

        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_negative_delay_rejected() {
        let mut config = create_test_config();
        config.crawler.delay_seconds = -1.0;

        let result = validate(&config);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_nan_delay_rejected() {
        let mut config = create_test_config();
        config.crawler.delay_seconds = f64::NAN;

        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_delay_allowed() {
        let mut config = create_test_config();
        config.crawler.delay_seconds = 0.0;

        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_max_pages_rejected() {
        let mut config = create_test_config();
        config.crawler.max_pages = 0;

        let result = validate(&config);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_empty_database_path_rejected_when_enabled() {
        let mut config = create_test_config();
        config.storage.enabled = true;
        config.storage.database_path = String::new();

        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_database_path_allowed_when_disabled() {
        let mut config = create_test_config();
        config.storage.enabled = false;
        config.storage.database_path = String::new();

        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_bind_address_rejected() {
        let mut config = create_test_config();
        config.server.bind_address = "not-an-address".to_string();

        assert!(validate(&config).is_err());
    }
}
