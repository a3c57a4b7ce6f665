//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::{Config, DeliveryPolicy};
use std::path::Path;
use thiserror::Error;

/// Smallest accepted `listen.max_line_length`.
const MIN_LINE_LENGTH: usize = 16;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("listen.max_line_length must be at least {MIN_LINE_LENGTH}, got {0}")]
    LineLengthTooSmall(usize),
    #[error("delivery.queue_capacity must be greater than 0")]
    ZeroQueueCapacity,
    #[error("delivery.max_retries must be greater than 0 for bounded-retry")]
    ZeroRetries,
    #[error("delivery.retry_timeout_ms must be greater than 0 for bounded-retry")]
    ZeroRetryTimeout,
    #[error("timeouts.write must be greater than 0")]
    ZeroWriteTimeout,
    #[error("history.path parent directory does not exist: {0}")]
    HistoryPathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    if config.listen.max_line_length < MIN_LINE_LENGTH {
        errors.push(ValidationError::LineLengthTooSmall(
            config.listen.max_line_length,
        ));
    }

    let delivery = &config.delivery;
    if delivery.queue_capacity == 0 {
        errors.push(ValidationError::ZeroQueueCapacity);
    }
    if delivery.policy == DeliveryPolicy::BoundedRetry {
        if delivery.max_retries == 0 {
            errors.push(ValidationError::ZeroRetries);
        }
        if delivery.retry_timeout_ms == 0 {
            errors.push(ValidationError::ZeroRetryTimeout);
        }
    }

    if config.timeouts.write == 0 {
        errors.push(ValidationError::ZeroWriteTimeout);
    }

    if config.history.enabled {
        let path = Path::new(&config.history.path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::HistoryPathInvalid(
                config.history.path.clone(),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r#"
[server]
name = "test.relay"

[listen]
address = "127.0.0.1:7000"
"#
        .to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_server_name_fails() {
        let toml = r#"
[server]
name = "  "

[listen]
address = "127.0.0.1:7000"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingServerName)));
    }

    #[test]
    fn test_zero_queue_capacity_fails() {
        let toml = r#"
[listen]
address = "127.0.0.1:7000"

[delivery]
queue_capacity = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroQueueCapacity)));
    }

    #[test]
    fn test_zero_retries_only_matters_for_bounded_retry() {
        let bounded = r#"
[listen]
address = "127.0.0.1:7000"

[delivery]
max_retries = 0
retry_timeout_ms = 0
"#;
        let config: Config = toml::from_str(bounded).unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 2);

        let dropping = r#"
[listen]
address = "127.0.0.1:7000"

[delivery]
policy = "drop-on-full"
max_retries = 0
retry_timeout_ms = 0
"#;
        let config: Config = toml::from_str(dropping).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_history_parent_must_exist() {
        let toml = r#"
[listen]
address = "127.0.0.1:7000"

[history]
path = "/nonexistent/dir/messages.log"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::HistoryPathInvalid(_))));
    }

    #[test]
    fn test_disabled_history_skips_path_check() {
        let toml = r#"
[listen]
address = "127.0.0.1:7000"

[history]
enabled = false
path = "/nonexistent/dir/messages.log"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_multiple_errors_collected() {
        let toml = r#"
[server]
name = ""

[listen]
address = "127.0.0.1:7000"
max_line_length = 4

[timeouts]
write = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
