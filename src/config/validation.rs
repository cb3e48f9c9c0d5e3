use crate::config::types::{Config, CrawlConfig, MappingEntry, OutputConfig, SourceConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    validate_mapping(&config.mapping)?;
    Ok(())
}

/// Validates the listing source configuration
fn validate_source_config(source: &SourceConfig) -> Result<(), ConfigError> {
    let base_url = source.base_url.as_deref().filter(|u| !u.is_empty());
    let template = source
        .base_url_template
        .as_deref()
        .filter(|u| !u.is_empty());

    if base_url.is_none() && template.is_none() {
        return Err(ConfigError::Validation(
            "config must contain 'base-url' or 'base-url-template'".to_string(),
        ));
    }

    if let Some(url) = base_url {
        Url::parse(url).map_err(|e| ConfigError::InvalidUrl(format!("base-url: {}", e)))?;
    }
    if let Some(template) = template {
        // Validate with the placeholder substituted so `{}` doesn't trip the parser
        let probe = template.replace("{city}", "ha-noi");
        Url::parse(&probe)
            .map_err(|e| ConfigError::InvalidUrl(format!("base-url-template: {}", e)))?;
    }

    if source.gateway_base.is_empty() {
        return Err(ConfigError::Validation(
            "gateway-base cannot be empty".to_string(),
        ));
    }
    Url::parse(&source.gateway_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("gateway-base: {}", e)))?;

    if source.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    for city in &source.cities {
        if city.is_empty() {
            return Err(ConfigError::Validation(
                "cities entries cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the crawl loop configuration
fn validate_crawl_config(crawl: &CrawlConfig) -> Result<(), ConfigError> {
    if crawl.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            crawl.max_pages
        )));
    }
    if crawl.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "start-page must be >= 1, got {}",
            crawl.start_page
        )));
    }
    Ok(())
}

/// Validates the output configuration
fn validate_output_config(output: &OutputConfig) -> Result<(), ConfigError> {
    if output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    if let Some(csv_path) = &output.csv_path {
        if csv_path.is_empty() {
            return Err(ConfigError::Validation(
                "csv-path cannot be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates the field mapping
///
/// Destination columns must be unique, at most one entry may target the
/// identity column, and the reserved derived columns may be claimed at most
/// once each.
fn validate_mapping(mapping: &[MappingEntry]) -> Result<(), ConfigError> {
    if mapping.is_empty() {
        return Err(ConfigError::Validation(
            "mapping must contain at least one entry".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in mapping {
        if entry.path.is_empty() {
            return Err(ConfigError::Validation(
                "mapping path cannot be empty".to_string(),
            ));
        }
        if entry.column.is_empty() {
            return Err(ConfigError::Validation(
                "mapping column cannot be empty".to_string(),
            ));
        }
        if let Some(directive) = entry.path.strip_prefix("special:") {
            if directive.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "mapping path '{}' names no special directive",
                    entry.path
                )));
            }
        }
        if !seen.insert(entry.column.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate mapping column '{}'",
                entry.column
            )));
        }
    }

    Ok(())
}
