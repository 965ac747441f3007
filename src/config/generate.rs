pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# LOGGEN CONFIGURATION
# =============================================================================
# Every setting is optional; omitted values use the defaults shown here.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/loggen/config.yml
#   3. /etc/loggen/config.yml
#
# Values may reference environment variables with the $env{...} syntax.

# =============================================================================
# OUTPUT
# =============================================================================

output:
  # File to write. Parent directories are created; an existing file is truncated.
  path: server_1gb.log
  # Approximate size of the generated file
  target_size_mb: 1024
  # Estimated bytes per line; record count = target size / this value
  avg_line_bytes: 190

# =============================================================================
# GENERATION
# =============================================================================

generation:
  # Records per batch handed from a producer to the writer
  batch_size: 2000
  # Number of producers. Omit to use one per available CPU.
  # The record count is split evenly; any remainder is dropped.
  # producers: 8
  # Exact record count, overriding target_size_mb / avg_line_bytes
  # total_records: 1000000
  # Seed for reproducible content (timestamps excepted)
  # seed: 42

# =============================================================================
# PIPELINE
# =============================================================================

pipeline:
  # Batches buffered between producers and the writer
  queue_capacity: 100
  # Longest wait for the producers to finish: ms, s, m or h
  shutdown_timeout: 10m
  # Log write progress every N batches (0 disables)
  progress_every_batches: 50
"#
    .to_string()
}
