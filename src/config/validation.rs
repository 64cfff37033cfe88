use crate::config::types::{
    Config, CrawlerConfig, ExtractionConfig, OutputConfig, ScopeConfig, SiteConfig,
    UserAgentConfig,
};
use crate::crawler::is_valid_date_format;
use crate::url::{lint_blacklist, PatternIssue};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
///
/// Returns the blacklist lint findings that did not fail validation. With
/// `strict-patterns`, malformed blacklist entries are fatal; overlaps with
/// the article shape are never fatal.
pub(crate) fn validate(config: &Config) -> Result<Vec<PatternIssue>, ConfigError> {
    validate_site_config(&config.site)?;
    validate_scope_config(&config.scope)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_extraction_config(&config.extraction)?;
    validate_output_config(&config.output)?;

    let issues = lint_config(config);
    if config.scope.strict_patterns {
        let malformed: Vec<PatternIssue> = issues
            .iter()
            .filter(|issue| issue.kind.is_malformed())
            .cloned()
            .collect();
        if !malformed.is_empty() {
            return Err(ConfigError::SuspiciousPatterns(malformed));
        }
    }

    Ok(issues)
}

/// Runs the blacklist lint against the configured scope
///
/// Findings never change how patterns are applied; they are surfaced so a
/// suspicious entry can be fixed in the configuration file.
pub fn lint_config(config: &Config) -> Vec<PatternIssue> {
    lint_blacklist(&config.scope.blacklist, &config.scope.article_suffix)
}

/// Validates the target site and seed
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_host(&config.host)?;

    let seed = Url::parse(&config.seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", config.seed, e)))?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use http or https",
            config.seed
        )));
    }

    let seed_host = seed.host_str().map(|h| h.to_lowercase());
    if seed_host.as_deref() != Some(config.host.to_lowercase().as_str()) {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' is not on target host '{}'",
            config.seed, config.host
        )));
    }

    for secondary in &config.secondary_hosts {
        validate_host(secondary)?;
        if secondary.eq_ignore_ascii_case(&config.host) {
            return Err(ConfigError::Validation(format!(
                "Secondary host '{}' cannot be the target host",
                secondary
            )));
        }
    }

    Ok(())
}

/// Validates scope rules that would make classification meaningless
fn validate_scope_config(config: &ScopeConfig) -> Result<(), ConfigError> {
    if config.article_suffix.is_empty() {
        return Err(ConfigError::Validation(
            "article_suffix cannot be empty".to_string(),
        ));
    }

    if let Some(position) = config.blacklist.iter().position(|p| p.trim().is_empty()) {
        return Err(ConfigError::InvalidPattern(format!(
            "Blacklist entry #{} is empty",
            position + 1
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 64, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.fallback.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent fallback cannot be empty".to_string(),
        ));
    }

    if let Some(agents) = &config.agents {
        if agents.iter().any(|a| a.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "user agent pool cannot contain empty strings".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates that the fallback extraction selectors parse
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    validate_selector(&config.heading_selector)?;
    validate_selector(&config.content_selector)?;
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation("output path cannot be empty".to_string()));
    }

    // An invalid specifier would make chrono fail at render time
    if !is_valid_date_format(&config.date_format) {
        return Err(ConfigError::InvalidDateFormat(config.date_format.clone()));
    }

    Ok(())
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{:?}", e),
        })
}

/// Validates a host name
fn validate_host(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::Validation("Host cannot be empty".to_string()));
    }

    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    if !host.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Host '{}' must contain at least one dot (e.g., 'example.com')",
            host
        )));
    }

    Ok(())
}
