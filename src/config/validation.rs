use crate::config::types::{compile_pattern, Config, CrawlerConfig, ResponseRule, SiteConfig, ValidatorEntry};
use crate::extract::json::compile_query;
use crate::model::{Seed, UrlRole};
use crate::url::parse_base_url;
use crate::validate::ValidatorConfig;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_seeds(&config.seeds)?;
    validate_response_rules(&config.responses)?;
    validate_validators(&config.validators)?;
    Ok(())
}

/// Validates the site section
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    parse_base_url(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if !config.dir.is_dir() {
        return Err(ConfigError::Validation(format!(
            "site dir {} is not a directory",
            config.dir.display()
        )));
    }

    if config.index_name.is_empty() || config.index_name.contains('/') {
        return Err(ConfigError::Validation(format!(
            "index-name must be a plain file name, got '{}'",
            config.index_name
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 256 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 256, got {}",
            config.concurrency
        )));
    }

    if config.pool_size == Some(0) {
        return Err(ConfigError::Validation(
            "pool-size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates seed entries
fn validate_seeds(seeds: &[Seed]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[seed]] is required".to_string(),
        ));
    }

    for seed in seeds {
        Url::parse(&seed.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed.url, e)))?;
        validate_role(&seed.role)?;
    }

    Ok(())
}

/// Checks the JMESPath queries of a `json` role, including nested ones
fn validate_role(role: &UrlRole) -> Result<(), ConfigError> {
    if let UrlRole::Json { extract_configs } = role {
        for config in extract_configs {
            compile_query(&config.query).map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
            validate_role(&config.role)?;
        }
    }
    Ok(())
}

/// Validates response override rules
fn validate_response_rules(rules: &[ResponseRule]) -> Result<(), ConfigError> {
    for rule in rules {
        compile_pattern(&rule.pattern)?;

        if !(100..=599).contains(&rule.status) {
            return Err(ConfigError::Validation(format!(
                "response status for '{}' must be between 100 and 599, got {}",
                rule.pattern, rule.status
            )));
        }
    }
    Ok(())
}

/// Validates additional validator rules
fn validate_validators(validators: &[ValidatorEntry]) -> Result<(), ConfigError> {
    for entry in validators {
        compile_pattern(&entry.url_pattern)?;
        validate_range("matches", &entry.url_pattern, entry.min_matches, entry.max_matches)?;

        if let ValidatorConfig::JsonLd {
            min_occurrence,
            max_occurrence,
            ..
        } = &entry.config
        {
            validate_range("occurrence", &entry.url_pattern, *min_occurrence, *max_occurrence)?;
        }
    }
    Ok(())
}

/// Checks that min <= max when both bounds are given
fn validate_range(
    name: &str,
    url_pattern: &str,
    min: Option<usize>,
    max: Option<usize>,
) -> Result<(), ConfigError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ConfigError::Validation(format!(
                "validator '{}': min-{} ({}) is greater than max-{} ({})",
                url_pattern, name, min, name, max
            )));
        }
    }
    Ok(())
}
