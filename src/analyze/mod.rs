use crate::record::{LogLevel, LogRecord};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunk task join error: {0}")]
    Join(#[from] JoinError),
}

/// Aggregate statistics over a generated log file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analytics {
    pub total_lines: u64,
    pub error_count: u64,
    pub warning_count: u64,
    /// Non-empty lines that did not parse as a log record
    pub malformed: u64,
    pub total_response_time_ms: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub methods: BTreeMap<String, u64>,
}

impl Analytics {
    pub fn record(&mut self, record: &LogRecord) {
        self.total_lines += 1;
        self.total_response_time_ms += record.response_time_ms as u64;
        match record.level {
            LogLevel::Error => self.error_count += 1,
            LogLevel::Warn => self.warning_count += 1,
            LogLevel::Info | LogLevel::Debug => {}
        }
        *self.status_codes.entry(record.status_code).or_default() += 1;
        *self
            .methods
            .entry(record.method.as_str().to_string())
            .or_default() += 1;
    }

    pub fn merge(&mut self, other: Analytics) {
        self.total_lines += other.total_lines;
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.malformed += other.malformed;
        self.total_response_time_ms += other.total_response_time_ms;
        for (code, count) in other.status_codes {
            *self.status_codes.entry(code).or_default() += count;
        }
        for (method, count) in other.methods {
            *self.methods.entry(method).or_default() += count;
        }
    }

    /// Percentage of records logged at ERROR
    pub fn error_rate(&self) -> f64 {
        if self.total_lines == 0 {
            return 0.0;
        }
        self.error_count as f64 / self.total_lines as f64 * 100.0
    }

    pub fn average_response_time_ms(&self) -> f64 {
        if self.total_lines == 0 {
            return 0.0;
        }
        self.total_response_time_ms as f64 / self.total_lines as f64
    }
}

/// Analyze the lines that start inside the byte range `[start, end)`.
///
/// A line straddling `start` belongs to the previous range, a line straddling
/// `end` belongs to this one, so adjacent ranges see every line exactly once.
pub fn analyze_range(path: &Path, start: u64, end: u64) -> Result<Analytics, AnalyzeError> {
    let mut analytics = Analytics::default();
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::with_capacity(256);

    // Position at the first line starting at or after `start`
    let mut pos = if start == 0 {
        0
    } else {
        reader.seek(SeekFrom::Start(start - 1))?;
        let skipped = reader.read_until(b'\n', &mut buf)? as u64;
        start - 1 + skipped
    };

    while pos < end {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
        pos += read as u64;

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            continue;
        }

        match line.parse::<LogRecord>() {
            Ok(record) => analytics.record(&record),
            Err(_) => analytics.malformed += 1,
        }
    }

    Ok(analytics)
}

/// Analyze a log file using `threads` parallel readers over equal byte ranges
pub async fn analyze_file(path: &Path, threads: usize) -> Result<Analytics, AnalyzeError> {
    let file_size = std::fs::metadata(path)?.len();
    let threads = threads.max(1) as u64;
    let chunk_size = file_size / threads;
    let chunks = if chunk_size == 0 { 1 } else { threads };

    info!(path = %path.display(), file_size, chunks, "Analyzing log file");

    let mut handles = Vec::with_capacity(chunks as usize);
    for i in 0..chunks {
        let start = i * chunk_size;
        let end = if i == chunks - 1 { file_size } else { (i + 1) * chunk_size };
        let path: PathBuf = path.to_path_buf();
        handles.push(tokio::task::spawn_blocking(move || analyze_range(&path, start, end)));
    }

    let mut analytics = Analytics::default();
    for handle in handles {
        let chunk = handle.await??;
        debug!(lines = chunk.total_lines, malformed = chunk.malformed, "Chunk analyzed");
        analytics.merge(chunk);
    }

    Ok(analytics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Synthesizer;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_log(dir: &TempDir, lines: usize, seed: u64) -> (PathBuf, Vec<LogRecord>) {
        let path = dir.path().join("sample.log");
        let mut synth = Synthesizer::seeded(seed);
        let records: Vec<LogRecord> = (0..lines).map(|_| synth.synthesize()).collect();
        let mut file = File::create(&path).unwrap();
        for record in &records {
            writeln!(file, "{}", record).unwrap();
        }
        (path, records)
    }

    fn expected(records: &[LogRecord]) -> Analytics {
        let mut analytics = Analytics::default();
        for record in records {
            analytics.record(record);
        }
        analytics
    }

    #[test]
    fn test_single_range_counts_everything() {
        let dir = TempDir::new().unwrap();
        let (path, records) = write_log(&dir, 200, 1);
        let size = std::fs::metadata(&path).unwrap().len();

        let analytics = analyze_range(&path, 0, size).unwrap();
        assert_eq!(analytics, expected(&records));
    }

    #[test]
    fn test_adjacent_ranges_cover_each_line_once() {
        let dir = TempDir::new().unwrap();
        let (path, records) = write_log(&dir, 137, 2);
        let size = std::fs::metadata(&path).unwrap().len();

        // Split points that land mid-line and exactly on line starts
        let first_line_len = records[0].to_string().len() as u64 + 1;
        for split in [1, first_line_len, first_line_len * 3, size / 2, size - 1] {
            let mut merged = analyze_range(&path, 0, split).unwrap();
            merged.merge(analyze_range(&path, split, size).unwrap());
            assert_eq!(merged.total_lines, 137, "split at {split}");
        }
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let dir = TempDir::new().unwrap();
        let (path, records) = write_log(&dir, 1_000, 3);

        let analytics = analyze_file(&path, 7).await.unwrap();
        assert_eq!(analytics, expected(&records));
        assert_eq!(analytics.status_codes.values().sum::<u64>(), 1_000);
    }

    #[tokio::test]
    async fn test_malformed_lines_counted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mixed.log");
        let mut synth = Synthesizer::seeded(4);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{}", synth.synthesize()).unwrap();
        writeln!(file, "not a log line").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", synth.synthesize()).unwrap();
        drop(file);

        let analytics = analyze_file(&path, 1).await.unwrap();
        assert_eq!(analytics.total_lines, 2);
        assert_eq!(analytics.malformed, 1);
    }

    #[tokio::test]
    async fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.log");
        File::create(&path).unwrap();

        let analytics = analyze_file(&path, 4).await.unwrap();
        assert_eq!(analytics, Analytics::default());
        assert_eq!(analytics.error_rate(), 0.0);
        assert_eq!(analytics.average_response_time_ms(), 0.0);
    }

    #[test]
    fn test_rates() {
        let mut synth = Synthesizer::seeded(5);
        let records: Vec<LogRecord> = (0..400).map(|_| synth.synthesize()).collect();
        let analytics = expected(&records);

        let errors = records.iter().filter(|r| r.level == LogLevel::Error).count() as f64;
        assert!((analytics.error_rate() - errors / 4.0).abs() < 1e-9);
        assert!(analytics.average_response_time_ms() >= 20.0);
        assert!(analytics.average_response_time_ms() < 2000.0);
    }
}
