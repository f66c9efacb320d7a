use crate::config::types::{
    Config, CrawlerConfig, DiscoveryConfig, ExtractorConfig, FetcherConfig, FieldSelector,
    FilesConfig, StoreConfig,
};
use crate::{ConfigError, ConfigResult};
use scraper::Selector;
use std::path::Path;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_fetcher_config(&config.fetcher)?;
    validate_crawler_config(&config.crawler)?;
    validate_store_config(&config.store)?;
    validate_files_config(&config.files)?;

    if config.location.country.trim().is_empty() {
        return Err(ConfigError::Validation(
            "location country cannot be empty".to_string(),
        ));
    }

    validate_extractor_config(&config.extractor)?;

    if let Some(discovery) = &config.discovery {
        validate_discovery_config(discovery)?;
    }

    Ok(())
}

/// Validates fetcher pacing and identity configuration
fn validate_fetcher_config(config: &FetcherConfig) -> ConfigResult<()> {
    if config.base_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "base_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.base_delay_ms, config.max_delay_ms
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler pause bounds
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.min_pause_ms > config.max_pause_ms {
        return Err(ConfigError::Validation(format!(
            "min_pause_ms ({}) must not exceed max_pause_ms ({})",
            config.min_pause_ms, config.max_pause_ms
        )));
    }

    Ok(())
}

/// Validates store location, collection names and writer thresholds
fn validate_store_config(config: &StoreConfig) -> ConfigResult<()> {
    validate_path("database_path", &config.database_path)?;

    if config.buffer_size < 1 {
        return Err(ConfigError::Validation(format!(
            "buffer_size must be >= 1, got {}",
            config.buffer_size
        )));
    }

    let collections = [
        ("company_collection", &config.company_collection),
        ("location_collection", &config.location_collection),
        ("industry_collection", &config.industry_collection),
    ];

    for (field, name) in &collections {
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{} cannot be empty",
                field
            )));
        }
    }

    for (i, (field, name)) in collections.iter().enumerate() {
        if let Some((other, _)) = collections[i + 1..].iter().find(|(_, n)| n == name) {
            return Err(ConfigError::Validation(format!(
                "{} and {} both name collection '{}'",
                field, other, name
            )));
        }
    }

    Ok(())
}

/// Validates the work list, checkpoint and lookup file paths
fn validate_files_config(config: &FilesConfig) -> ConfigResult<()> {
    validate_path("regions", &config.regions)?;
    validate_path("completed_regions", &config.completed_regions)?;
    validate_path("keyword_table", &config.keyword_table)?;

    if let Some(region_states) = &config.region_states {
        validate_path("region_states", region_states)?;
    }

    if config.regions == config.completed_regions {
        return Err(ConfigError::Validation(
            "regions and completed_regions must be different files".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every configured selector parses
fn validate_extractor_config(config: &ExtractorConfig) -> ConfigResult<()> {
    validate_selector("detail_link", &config.detail_link)?;

    if let Some(next_page) = &config.next_page {
        validate_selector("next_page", next_page)?;
    }

    validate_field_selector("name", Some(&config.name))?;
    validate_field_selector("address", config.address.as_ref())?;
    validate_field_selector("size", config.size.as_ref())?;
    validate_field_selector("website", config.website.as_ref())?;
    validate_field_selector("description", config.description.as_ref())?;
    validate_field_selector("latitude", config.latitude.as_ref())?;
    validate_field_selector("longitude", config.longitude.as_ref())?;
    validate_field_selector("contact_numbers", config.contact_numbers.as_ref())?;
    validate_field_selector("tags", config.tags.as_ref())?;

    Ok(())
}

/// Validates region discovery settings
fn validate_discovery_config(config: &DiscoveryConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.directory_url).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid directory_url '{}': {}",
            config.directory_url, e
        ))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "directory_url '{}' must use http or https",
            config.directory_url
        )));
    }

    validate_selector("region_link", &config.region_link)
}

fn validate_field_selector(field: &str, selector: Option<&FieldSelector>) -> ConfigResult<()> {
    let Some(selector) = selector else {
        return Ok(());
    };

    if selector.attr.as_deref().is_some_and(|a| a.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "{} selector attribute cannot be empty",
            field
        )));
    }

    validate_selector(field, &selector.selector)
}

fn validate_selector(field: &str, selector: &str) -> ConfigResult<()> {
    if selector.trim().is_empty() {
        return Err(ConfigError::InvalidSelector(format!(
            "{} selector cannot be empty",
            field
        )));
    }

    Selector::parse(selector).map_err(|e| {
        ConfigError::InvalidSelector(format!("{} selector '{}': {:?}", field, selector, e))
    })?;

    Ok(())
}

fn validate_path(field: &str, path: &Path) -> ConfigResult<()> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{LocationConfig, StoreConfig};

    fn valid_config() -> Config {
        Config {
            files: FilesConfig {
                regions: "regions.json".into(),
                completed_regions: "completed_regions.json".into(),
                keyword_table: "keywords.json".into(),
                region_states: None,
            },
            location: LocationConfig {
                country: "Cameroon".to_string(),
            },
            extractor: ExtractorConfig {
                detail_link: "a.company".to_string(),
                next_page: Some("a.next".to_string()),
                name: FieldSelector::text("h1"),
                ..ExtractorConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_base_delay_above_max_delay() {
        let mut config = valid_config();
        config.fetcher.base_delay_ms = 8000;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_equal_delays_allowed() {
        let mut config = valid_config();
        config.fetcher.base_delay_ms = 3000;
        config.fetcher.max_delay_ms = 3000;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_pause_bounds() {
        let mut config = valid_config();
        config.crawler.min_pause_ms = 5000;
        config.crawler.max_pause_ms = 1000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_buffer_size() {
        let mut config = valid_config();
        config.store.buffer_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_duplicate_collection_names() {
        let mut config = valid_config();
        config.store = StoreConfig {
            industry_collection: "companies".to_string(),
            ..StoreConfig::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("companies"));
    }

    #[test]
    fn test_empty_country() {
        let mut config = valid_config();
        config.location.country = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_selector() {
        let mut config = valid_config();
        config.extractor.detail_link = "a[[".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_discovery_url_must_be_http() {
        let mut config = valid_config();
        config.discovery = Some(DiscoveryConfig {
            directory_url: "ftp://dir.example/cities".to_string(),
            region_link: "a.city".to_string(),
        });
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.discovery = Some(DiscoveryConfig {
            directory_url: "not a url".to_string(),
            region_link: "a.city".to_string(),
        });
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_same_checkpoint_and_work_list() {
        let mut config = valid_config();
        config.files.completed_regions = config.files.regions.clone();
        assert!(validate(&config).is_err());
    }
}
