use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Records to generate before partitioning: the explicit override if set,
    /// else the target size divided by the estimated line size.
    pub fn total_records(&self) -> u64 {
        if let Some(total) = self.generation.total_records {
            return total;
        }
        if self.output.avg_line_bytes == 0 {
            return 0;
        }
        self.output.target_size_mb.saturating_mul(1024 * 1024) / self.output.avg_line_bytes
    }

    /// Configured producer count, or the machine's available parallelism
    pub fn producer_count(&self) -> usize {
        self.generation.producers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default = "default_target_size_mb")]
    pub target_size_mb: u64,
    /// Estimated bytes per line, only used to derive the record count
    #[serde(default = "default_avg_line_bytes")]
    pub avg_line_bytes: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            target_size_mb: default_target_size_mb(),
            avg_line_bytes: default_avg_line_bytes(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("server_1gb.log")
}

fn default_target_size_mb() -> u64 {
    1024
}

fn default_avg_line_bytes() -> u64 {
    190
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Producer count; `None` uses the available parallelism
    #[serde(default)]
    pub producers: Option<usize>,
    /// Overrides the record count derived from the target size
    #[serde(default)]
    pub total_records: Option<u64>,
    /// Base seed for reproducible output; producer `i` uses `seed + i`
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            producers: None,
            total_records: None,
            seed: None,
        }
    }
}

fn default_batch_size() -> usize {
    2000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_shutdown_timeout", with = "duration_format")]
    pub shutdown_timeout: Duration,
    /// Emit a progress event every N written batches (0 disables)
    #[serde(default = "default_progress_every_batches")]
    pub progress_every_batches: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            shutdown_timeout: default_shutdown_timeout(),
            progress_every_batches: default_progress_every_batches(),
        }
    }
}

fn default_queue_capacity() -> usize {
    100
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_progress_every_batches() -> u64 {
    50
}

// Custom serde module for duration parsing
pub(crate) mod duration_format {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty duration string".to_string());
        }

        let (value_str, unit) = if let Some(v) = s.strip_suffix("ms") {
            (v, "ms")
        } else if let Some(v) = s.strip_suffix('s') {
            (v, "s")
        } else if let Some(v) = s.strip_suffix('m') {
            (v, "m")
        } else if let Some(v) = s.strip_suffix('h') {
            (v, "h")
        } else {
            return Err(format!("invalid duration format: {}", s));
        };

        let value: u64 = value_str
            .trim()
            .parse()
            .map_err(|_| format!("invalid numeric value: {}", value_str))?;

        let seconds_per_unit = match unit {
            "ms" => return Ok(Duration::from_millis(value)),
            "s" => 1,
            "m" => 60,
            "h" => 3600,
            _ => return Err(format!("unknown unit: {}", unit)),
        };

        value
            .checked_mul(seconds_per_unit)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration out of range: {}", s))
    }

    pub fn format_duration(d: Duration) -> String {
        let secs = d.as_secs();
        if d.subsec_millis() != 0 || secs == 0 {
            format!("{}ms", d.as_millis())
        } else if secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_derive_total_from_size() {
        let config = Config::default();
        assert_eq!(config.total_records(), 1024 * 1024 * 1024 / 190);
        assert_eq!(config.generation.batch_size, 2000);
        assert_eq!(config.pipeline.queue_capacity, 100);
        assert_eq!(config.pipeline.shutdown_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_explicit_total_wins() {
        let mut config = Config::default();
        config.generation.total_records = Some(10_000);
        assert_eq!(config.total_records(), 10_000);
    }

    #[test]
    fn test_producer_count_defaults_to_parallelism() {
        let config = Config::default();
        assert!(config.producer_count() >= 1);

        let mut config = Config::default();
        config.generation.producers = Some(3);
        assert_eq!(config.producer_count(), 3);
    }
}
