use super::types::*;
use crate::config::{expand_env_vars, expand_tilde, ENV_VAR_PATTERN};
use std::fs;
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
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string).map_err(|e| match e {
        // Wrap parse errors with file context
        ConfigError::YamlParse(e) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        )),
        other => other,
    })
}

/// Parse and validate a config from YAML text.
///
/// `$env{VAR}` references are expanded first and `~` in the output path is
/// resolved to the home directory. An empty document yields the defaults.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    let mut config: Config = if yaml_string.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&yaml_string)?
    };

    config.output.path = expand_tilde(&config.output.path);

    validate_config(&config)?;

    Ok(config)
}

/// Any `$env{NAME}` left after expansion names a variable that is not set
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let mut missing: Vec<String> = ENV_VAR_PATTERN
        .captures_iter(yaml_string)
        .map(|cap| cap[1].to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    missing.sort();
    missing.dedup();

    let error_msg = format!(
        "config references unset environment variable(s): {}\n\
         export them or replace the $env{{...}} references with literal values",
        missing.join(", ")
    );

    Err(ConfigError::Validation(error_msg))
}

/// Check every setting, collecting all problems instead of stopping at the first
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.output.path.as_os_str().is_empty() {
        errors.push("output.path cannot be empty".to_string());
    }
    if config.output.avg_line_bytes == 0 {
        errors.push("output.avg_line_bytes must be at least 1".to_string());
    }
    if config.generation.total_records.is_none() && config.output.target_size_mb == 0 {
        errors.push(
            "output.target_size_mb must be at least 1 unless generation.total_records is set"
                .to_string(),
        );
    }

    if config.generation.batch_size == 0 {
        errors.push("generation.batch_size must be at least 1".to_string());
    }
    if config.generation.producers == Some(0) {
        errors.push("generation.producers must be at least 1".to_string());
    }

    if config.pipeline.queue_capacity == 0 {
        errors.push("pipeline.queue_capacity must be at least 1".to_string());
    }
    if config.pipeline.shutdown_timeout.is_zero() {
        errors.push("pipeline.shutdown_timeout must be greater than zero".to_string());
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
    fn test_empty_document_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.generation.batch_size, 2000);
        assert_eq!(config.output.target_size_mb, 1024);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = parse_config(
            r#"
generation:
  producers: 2
pipeline:
  shutdown_timeout: 30s
"#,
        )
        .unwrap();

        assert_eq!(config.generation.producers, Some(2));
        assert_eq!(config.generation.batch_size, 2000);
        assert_eq!(config.pipeline.shutdown_timeout, Duration::from_secs(30));
        assert_eq!(config.pipeline.queue_capacity, 100);
    }

    #[test]
    fn test_collects_every_problem() {
        let err = parse_config(
            r#"
generation:
  batch_size: 0
  producers: 0
pipeline:
  queue_capacity: 0
"#,
        )
        .unwrap_err();

        match err {
            ConfigError::ValidationList(errors) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unset_env_var_reported() {
        let err = parse_config("output:\n  path: $env{LOGGEN_SURELY_UNSET_VAR}/out.log\n").unwrap_err();
        match err {
            ConfigError::Validation(msg) => assert!(msg.contains("LOGGEN_SURELY_UNSET_VAR")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_duration_rejected() {
        let err = parse_config("pipeline:\n  shutdown_timeout: soon\n").unwrap_err();
        assert!(matches!(err, ConfigError::YamlParse(_)));
    }

    #[test]
    fn test_overflowing_duration_rejected() {
        let err = parse_config("pipeline:\n  shutdown_timeout: 99999999999999999h\n").unwrap_err();
        match err {
            ConfigError::YamlParse(e) => assert!(e.to_string().contains("out of range")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
