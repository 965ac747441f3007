use loggen::config::{generate::generate_starter_config, load_config, ConfigError};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_generated_config_is_valid() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");

    fs::write(&config_path, generate_starter_config()).unwrap();

    let config = load_config(&config_path).expect("Generated config should be valid");

    assert_eq!(config.output.path, PathBuf::from("server_1gb.log"));
    assert_eq!(config.total_records(), 1024 * 1024 * 1024 / 190);
    assert_eq!(config.generation.batch_size, 2000);
    assert_eq!(config.pipeline.queue_capacity, 100);
}

#[test]
fn test_full_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");

    let config_yaml = r#"
output:
  path: /var/tmp/loggen/out.log
  target_size_mb: 16
  avg_line_bytes: 128

generation:
  batch_size: 500
  producers: 6
  seed: 7

pipeline:
  queue_capacity: 12
  shutdown_timeout: 90s
  progress_every_batches: 0
"#;
    fs::write(&config_path, config_yaml).unwrap();

    let config = load_config(&config_path).unwrap();

    assert_eq!(config.output.path, PathBuf::from("/var/tmp/loggen/out.log"));
    assert_eq!(config.total_records(), 16 * 1024 * 1024 / 128);
    assert_eq!(config.producer_count(), 6);
    assert_eq!(config.generation.seed, Some(7));
    assert_eq!(config.pipeline.queue_capacity, 12);
    assert_eq!(config.pipeline.shutdown_timeout, Duration::from_secs(90));
    assert_eq!(config.pipeline.progress_every_batches, 0);
}

#[test]
fn test_env_var_in_output_path() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");

    std::env::set_var("LOGGEN_CONFIG_TEST_DIR", "/data/logs");
    fs::write(&config_path, "output:\n  path: $env{LOGGEN_CONFIG_TEST_DIR}/big.log\n").unwrap();

    let config = load_config(&config_path).unwrap();
    std::env::remove_var("LOGGEN_CONFIG_TEST_DIR");

    assert_eq!(config.output.path, PathBuf::from("/data/logs/big.log"));
}

#[test]
fn test_zero_size_without_explicit_total_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");

    fs::write(&config_path, "output:\n  target_size_mb: 0\n").unwrap();
    let err = load_config(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationList(ref errors) if errors.len() == 1));

    // An explicit record count makes the size irrelevant
    fs::write(
        &config_path,
        "output:\n  target_size_mb: 0\ngeneration:\n  total_records: 5000\n",
    )
    .unwrap();
    let config = load_config(&config_path).unwrap();
    assert_eq!(config.total_records(), 5000);
}

#[test]
fn test_zero_timeout_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");

    fs::write(&config_path, "pipeline:\n  shutdown_timeout: 0s\n").unwrap();
    let err = load_config(&config_path).unwrap_err();
    assert!(err.to_string().contains("shutdown_timeout"));
}

#[test]
fn test_malformed_yaml_names_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("broken.yml");

    fs::write(&config_path, "generation:\n  batch_size: [not, a, number]\n").unwrap();
    let err = load_config(&config_path).unwrap_err();
    assert!(err.to_string().contains("broken.yml"));
}

#[test]
fn test_missing_file() {
    let err = load_config(&PathBuf::from("/nonexistent/loggen/config.yml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
