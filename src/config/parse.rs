use super::types::Config;
use crate::config::expand_env_vars;
use regex::Regex;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string)
}

/// Parse and validate a YAML config after expanding `$env{VAR}` references
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml)?;

    // An empty document means "all defaults"
    let config: Config = if yaml.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&yaml)?
    };

    validate_config(&config)?;
    Ok(config)
}

fn check_unexpanded_vars(yaml: &str) -> Result<(), ConfigError> {
    let re = Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| ConfigError::Validation(e.to_string()))?;

    let mut unexpanded: Vec<&str> = re
        .captures_iter(yaml)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
        .collect();

    if unexpanded.is_empty() {
        return Ok(());
    }

    unexpanded.sort_unstable();
    unexpanded.dedup();

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}",
        unexpanded.join(", ")
    )))
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    let url = config.server.url.as_str();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(format!(
            "server.url must start with http:// or https://, got '{}'",
            url
        ));
    }
    if config.server.timeout.is_zero() {
        errors.push("server.timeout must be greater than zero".to_string());
    }

    if config.feed.dispatch_window.is_zero() {
        errors.push("feed.dispatch_window must be greater than zero".to_string());
    }
    if config.feed.poll_interval.is_zero() {
        errors.push("feed.poll_interval must be greater than zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.feed.dispatch_window, Duration::from_millis(100));
        assert_eq!(config.feed.poll_interval, Duration::from_secs(5));
        assert!(!config.transport.disable_push);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config = parse_config("feed:\n  poll_interval: 2s\n").unwrap();
        assert_eq!(config.feed.poll_interval, Duration::from_secs(2));
        assert_eq!(config.feed.dispatch_window, Duration::from_millis(100));
        assert_eq!(config.server.url, "http://localhost:3000");
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = parse_config("feed:\n  dispatch_window: 0s\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationList(ref e) if e.len() == 1));
    }

    #[test]
    fn test_bad_url_rejected() {
        let err = parse_config("server:\n  url: localhost:3000\n").unwrap_err();
        assert!(err.to_string().contains("server.url"));
    }

    #[test]
    fn test_unset_env_var_reported() {
        let err = parse_config("server:\n  url: $env{RUNLOG_TEST_NEVER_SET}\n").unwrap_err();
        assert!(err.to_string().contains("RUNLOG_TEST_NEVER_SET"));
    }
}
