use super::{types::Config, ConfigError};

/// Validate configuration invariants that serde defaults cannot express
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.catalog.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.base_url must not be empty".to_string(),
        ));
    }
    if config.delivery.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "delivery.base_url must not be empty".to_string(),
        ));
    }
    if config.queue.download_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "queue.download_concurrency must be at least 1".to_string(),
        ));
    }
    if config.cache.caption_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "cache.caption_capacity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::types::{CacheConfig, CatalogConfig, DeliveryConfig, QueueConfig};
    use super::*;

    fn valid_config() -> Config {
        Config {
            catalog: CatalogConfig {
                base_url: "https://catalog.example".to_string(),
                ..CatalogConfig::default()
            },
            queue: QueueConfig::default(),
            cache: CacheConfig::default(),
            delivery: DeliveryConfig {
                base_url: "https://subs.example".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let mut config = valid_config();
        config.catalog.base_url = "  ".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = valid_config();
        config.queue.download_concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_caption_capacity_rejected() {
        let mut config = valid_config();
        config.cache.caption_capacity = 0;
        assert!(validate_config(&config).is_err());
    }
}
