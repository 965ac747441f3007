use crate::config::types::Config;
use crate::pipeline::channel::{create_queue, QueueItem};
use crate::pipeline::partition::{dropped_remainder, partition};
use crate::pipeline::producer::{Producer, ProducerExit, ProducerReport};
use crate::pipeline::writer::{run_writer, FileSink, LogSink, WriterReport};
use crate::pipeline::PipelineError;
use crate::record::Synthesizer;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Errors that end a generation run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid settings: {0}")]
    InvalidConfig(String),

    #[error("coordinator already started")]
    AlreadyStarted,

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("writing failed: {0}")]
    Writing(#[source] PipelineError),

    #[error("producer pool did not finish within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("interrupted after writing {lines_written} lines")]
    Interrupted { lines_written: u64 },

    #[error("writer task join error: {0}")]
    Join(#[from] JoinError),
}

impl RunError {
    /// Phase of the run the failure belongs to
    pub fn phase(&self) -> &'static str {
        match self {
            RunError::InvalidConfig(_) | RunError::AlreadyStarted => "startup",
            RunError::Generation(_) => "generation",
            RunError::Writing(_) | RunError::Join(_) => "writing",
            RunError::ShutdownTimeout(_) => "shutdown",
            RunError::Interrupted { .. } => "interrupted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Init,
    /// Writer and producers are running
    Running,
    /// Every producer returned; the termination marker is enqueued on entry
    Draining,
    Done,
    Failed,
}

impl CoordinatorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CoordinatorState::Done | CoordinatorState::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: PathBuf,
    pub requested_records: u64,
    pub partition: Vec<u64>,
    pub lines_written: u64,
    pub batches_written: u64,
    pub bytes_written: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn dropped_records(&self) -> u64 {
        self.requested_records - self.partition.iter().sum::<u64>()
    }

    pub fn lines_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.lines_written as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn megabytes_written(&self) -> f64 {
        self.bytes_written as f64 / (1024.0 * 1024.0)
    }
}

/// What the coordinator learned while waiting on the producer pool
#[derive(Debug, Default)]
struct PoolOutcome {
    lines_sent: u64,
    finished: usize,
    cancelled: usize,
    failures: Vec<String>,
    timed_out: bool,
}

impl PoolOutcome {
    fn record(&mut self, result: Result<Result<ProducerReport, PipelineError>, JoinError>) {
        match result {
            Ok(Ok(report)) => {
                self.lines_sent += report.lines_sent;
                match report.exit {
                    ProducerExit::Completed => self.finished += 1,
                    ProducerExit::Cancelled => self.cancelled += 1,
                }
            }
            Ok(Err(e)) => {
                error!(error = %e, "Producer failed");
                self.failures.push(e.to_string());
            }
            Err(e) if e.is_cancelled() => self.cancelled += 1,
            Err(e) => {
                error!(error = %e, "Producer panicked");
                self.failures.push(format!("producer panicked: {}", e));
            }
        }
    }
}

/// Drives one generation run: spawns the writer and the producer pool, waits
/// for the pool under `shutdown_timeout`, enqueues the termination marker
/// exactly once and joins the writer.
pub struct Coordinator {
    config: Config,
    cancel: CancellationToken,
    transitions: Vec<CoordinatorState>,
}

impl Coordinator {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            transitions: vec![CoordinatorState::Init],
        }
    }

    /// Token that cancels the producer pool. The run still drains and joins
    /// the writer, then reports `RunError::Interrupted`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> CoordinatorState {
        *self
            .transitions
            .last()
            .unwrap_or(&CoordinatorState::Init)
    }

    /// Every state visited so far, in order
    pub fn transitions(&self) -> &[CoordinatorState] {
        &self.transitions
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generate into the configured output file
    pub async fn run(&mut self) -> Result<RunSummary, RunError> {
        if self.state() != CoordinatorState::Init {
            return Err(RunError::AlreadyStarted);
        }

        if let Err(message) = self.check_settings() {
            return Err(self.fail(RunError::InvalidConfig(message)));
        }

        let path = self.config.output.path.clone();
        info!(path = %path.display(), "Opening output file");
        match FileSink::create(&path) {
            Ok(sink) => self.run_with_sink(sink).await,
            Err(e) => Err(self.fail(RunError::Writing(e.into()))),
        }
    }

    /// Generate into an arbitrary sink
    pub async fn run_with_sink<S: LogSink + 'static>(&mut self, sink: S) -> Result<RunSummary, RunError> {
        if self.state() != CoordinatorState::Init {
            return Err(RunError::AlreadyStarted);
        }
        if let Err(message) = self.check_settings() {
            return Err(self.fail(RunError::InvalidConfig(message)));
        }

        let started = Instant::now();
        let requested = self.config.total_records();
        let producers = self.config.producer_count();
        let batch_size = self.config.generation.batch_size;
        let capacity = self.config.pipeline.queue_capacity;
        let progress_every = self.config.pipeline.progress_every_batches;
        let seed = self.config.generation.seed;

        let shares = partition(requested, producers);
        let dropped = dropped_remainder(requested, producers);
        if dropped > 0 {
            warn!(
                requested,
                producers,
                dropped,
                "Record count not divisible by producer count, remainder dropped"
            );
        }

        info!(
            records = requested - dropped,
            producers,
            batch_size,
            queue_capacity = capacity,
            "Starting generation"
        );

        let (queue, receiver) = create_queue(capacity);

        let writer = tokio::task::spawn_blocking(move || run_writer(receiver, sink, progress_every));

        let mut pool = JoinSet::new();
        for (id, &lines) in shares.iter().enumerate() {
            let synthesizer = match seed {
                Some(seed) => Synthesizer::seeded(seed.wrapping_add(id as u64)),
                None => Synthesizer::from_entropy(),
            };
            let producer = Producer::new(id, lines, batch_size, synthesizer);
            pool.spawn(producer.run(queue.clone(), self.cancel.clone()));
        }
        self.transition(CoordinatorState::Running);

        let outcome = self.await_pool(&mut pool).await;
        debug!(
            finished = outcome.finished,
            cancelled = outcome.cancelled,
            failed = outcome.failures.len(),
            lines_sent = outcome.lines_sent,
            "Producer pool finished"
        );

        self.transition(CoordinatorState::Draining);

        // No producer can push anymore; the marker is the last item
        if queue.put(QueueItem::Terminate).await.is_err() {
            warn!("Writer exited before the termination marker was enqueued");
        }
        drop(queue);

        let report: WriterReport = match writer.await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                error!(error = %e, "Writer failed");
                return Err(self.fail(RunError::Writing(e)));
            }
            Err(e) => return Err(self.fail(RunError::Join(e))),
        };

        if outcome.timed_out {
            let timeout = self.config.pipeline.shutdown_timeout;
            return Err(self.fail(RunError::ShutdownTimeout(timeout)));
        }
        if !outcome.failures.is_empty() {
            return Err(self.fail(RunError::Generation(outcome.failures.join("; "))));
        }
        if outcome.cancelled > 0 {
            return Err(self.fail(RunError::Interrupted {
                lines_written: report.lines_written,
            }));
        }

        let summary = RunSummary {
            output: self.config.output.path.clone(),
            requested_records: requested,
            partition: shares,
            lines_written: report.lines_written,
            batches_written: report.batches_written,
            bytes_written: report.bytes_written,
            elapsed: started.elapsed(),
        };
        self.transition(CoordinatorState::Done);

        info!(
            lines = summary.lines_written,
            bytes = summary.bytes_written,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Generation complete"
        );

        Ok(summary)
    }

    /// Wait for every producer, bounded by `shutdown_timeout`. On timeout the
    /// remaining producers are cancelled and aborted, and still awaited so
    /// none of them can push after the marker.
    async fn await_pool(
        &self,
        pool: &mut JoinSet<Result<ProducerReport, PipelineError>>,
    ) -> PoolOutcome {
        let timeout = self.config.pipeline.shutdown_timeout;
        // A timeout too large to represent as an instant never expires
        let deadline = tokio::time::Instant::now()
            .checked_add(timeout)
            .unwrap_or_else(far_future);
        let mut outcome = PoolOutcome::default();

        loop {
            match tokio::time::timeout_at(deadline, pool.join_next()).await {
                Ok(Some(result)) => outcome.record(result),
                Ok(None) => break,
                Err(_) => {
                    error!(
                        timeout = ?timeout,
                        remaining = pool.len(),
                        "Producer pool did not finish in time, cancelling"
                    );
                    outcome.timed_out = true;
                    self.cancel.cancel();
                    pool.abort_all();
                    while let Some(result) = pool.join_next().await {
                        outcome.record(result);
                    }
                    break;
                }
            }
        }

        outcome
    }

    fn check_settings(&self) -> Result<(), String> {
        if self.config.generation.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        if self.config.pipeline.queue_capacity == 0 {
            return Err("queue_capacity must be at least 1".to_string());
        }
        if self.config.producer_count() == 0 {
            return Err("producers must be at least 1".to_string());
        }
        Ok(())
    }

    fn transition(&mut self, next: CoordinatorState) {
        debug!(from = ?self.state(), to = ?next, "Coordinator transition");
        self.transitions.push(next);
    }

    fn fail(&mut self, error: RunError) -> RunError {
        self.transition(CoordinatorState::Failed);
        error
    }
}

/// Roughly 30 years from now
fn far_future() -> tokio::time::Instant {
    tokio::time::Instant::now() + Duration::from_secs(86_400 * 365 * 30)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LogRecord;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CountingSink {
        lines: Arc<Mutex<u64>>,
    }

    impl LogSink for CountingSink {
        fn write_batch(&mut self, records: &[LogRecord]) -> io::Result<u64> {
            *self.lines.lock().unwrap() += records.len() as u64;
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn small_config(total: u64, producers: usize, batch_size: usize) -> Config {
        let mut config = Config::default();
        config.generation.total_records = Some(total);
        config.generation.producers = Some(producers);
        config.generation.batch_size = batch_size;
        config.generation.seed = Some(1);
        config.pipeline.queue_capacity = 4;
        config
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_state_sequence_on_success() {
        let mut coordinator = Coordinator::new(small_config(1_000, 3, 100));
        let sink = CountingSink::default();
        let summary = coordinator.run_with_sink(sink.clone()).await.unwrap();

        assert_eq!(summary.lines_written, 999);
        assert_eq!(summary.dropped_records(), 1);
        assert_eq!(*sink.lines.lock().unwrap(), 999);
        assert_eq!(
            coordinator.transitions(),
            &[
                CoordinatorState::Init,
                CoordinatorState::Running,
                CoordinatorState::Draining,
                CoordinatorState::Done,
            ]
        );
        assert!(coordinator.state().is_terminal());
    }

    #[tokio::test]
    async fn test_zero_batch_size_fails_at_startup() {
        let mut coordinator = Coordinator::new(small_config(10, 1, 0));
        let err = coordinator.run_with_sink(CountingSink::default()).await.unwrap_err();

        assert!(matches!(err, RunError::InvalidConfig(_)));
        assert_eq!(err.phase(), "startup");
        assert_eq!(coordinator.state(), CoordinatorState::Failed);
    }

    #[tokio::test]
    async fn test_cannot_run_twice() {
        let mut coordinator = Coordinator::new(small_config(10, 1, 5));
        coordinator.run_with_sink(CountingSink::default()).await.unwrap();
        let err = coordinator.run_with_sink(CountingSink::default()).await.unwrap_err();
        assert!(matches!(err, RunError::AlreadyStarted));
        assert_eq!(coordinator.state(), CoordinatorState::Done);
    }

    #[tokio::test]
    async fn test_unbounded_shutdown_timeout() {
        let mut config = small_config(200, 2, 50);
        config.pipeline.shutdown_timeout = Duration::MAX;
        let mut coordinator = Coordinator::new(config);

        let summary = coordinator.run_with_sink(CountingSink::default()).await.unwrap();
        assert_eq!(summary.lines_written, 200);
        assert_eq!(coordinator.state(), CoordinatorState::Done);
    }

    #[tokio::test]
    async fn test_zero_records_still_terminates() {
        let mut coordinator = Coordinator::new(small_config(0, 2, 5));
        let summary = coordinator.run_with_sink(CountingSink::default()).await.unwrap();
        assert_eq!(summary.lines_written, 0);
        assert_eq!(summary.batches_written, 0);
        assert_eq!(coordinator.state(), CoordinatorState::Done);
    }
}
