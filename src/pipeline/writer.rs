use crate::pipeline::channel::{QueueItem, QueueReceiver};
use crate::pipeline::PipelineError;
use crate::record::LogRecord;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Destination for generated log lines.
///
/// Owned exclusively by the writer for the whole run.
pub trait LogSink: Send {
    /// Append one line per record. Returns the number of bytes written.
    fn write_batch(&mut self, records: &[LogRecord]) -> io::Result<u64>;

    /// Push any buffered output to the underlying storage
    fn flush(&mut self) -> io::Result<()>;
}

/// Buffered file sink writing one `|`-separated line per record
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
    line: String,
}

impl FileSink {
    /// Create (or truncate) the output file, creating missing parent directories
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("failed to create output file '{}': {}", path.display(), e),
            )
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::with_capacity(1 << 20, file),
            line: String::with_capacity(256),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn write_batch(&mut self, records: &[LogRecord]) -> io::Result<u64> {
        let mut bytes = 0u64;
        for record in records {
            self.line.clear();
            // Writing into a String cannot fail
            let _ = writeln!(self.line, "{}", record);
            self.writer.write_all(self.line.as_bytes())?;
            bytes += self.line.len() as u64;
        }
        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterReport {
    pub batches_written: u64,
    pub lines_written: u64,
    pub bytes_written: u64,
}

/// Run the writer until the termination marker arrives.
///
/// Blocks the calling thread; run it on a dedicated thread or via
/// `tokio::task::spawn_blocking`. Every batch received before
/// `QueueItem::Terminate` is written, nothing after it is read. The sink is
/// flushed and dropped before returning. A sink error aborts the writer and
/// drops the queue receiver, which fails any producer still pushing.
pub fn run_writer<S: LogSink>(
    mut queue: QueueReceiver,
    mut sink: S,
    progress_every: u64,
) -> Result<WriterReport, PipelineError> {
    let mut report = WriterReport::default();

    info!("Writer started");

    loop {
        match queue.take() {
            Some(QueueItem::Batch(batch)) => {
                let bytes = sink.write_batch(&batch.records).map_err(|e| {
                    error!(
                        producer_id = batch.producer_id,
                        sequence = batch.sequence,
                        error = %e,
                        "Failed to write batch"
                    );
                    e
                })?;

                report.batches_written += 1;
                report.lines_written += batch.len() as u64;
                report.bytes_written += bytes;

                debug!(
                    producer_id = batch.producer_id,
                    sequence = batch.sequence,
                    lines = batch.len(),
                    "Wrote batch"
                );

                if progress_every > 0 && report.batches_written % progress_every == 0 {
                    info!(
                        batches = report.batches_written,
                        lines = report.lines_written,
                        bytes = report.bytes_written,
                        "Write progress"
                    );
                }
            }
            Some(QueueItem::Terminate) => {
                debug!("Termination marker received");
                break;
            }
            None => {
                error!("Batch queue closed before termination marker");
                return Err(PipelineError::QueueClosed);
            }
        }
    }

    sink.flush()?;
    drop(sink);

    info!(
        batches = report.batches_written,
        lines = report.lines_written,
        bytes = report.bytes_written,
        "Writer shutdown complete"
    );

    Ok(report)
}
