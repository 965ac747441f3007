use crate::config::{load_config, validate_config, Config};
use crate::pipeline::{Coordinator, RunError};
use clap::Args;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Command line overrides applied on top of the config file
#[derive(Debug, Clone, Default, Args)]
pub struct RunOverrides {
    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target output size in MB
    #[arg(long)]
    pub size_mb: Option<u64>,

    /// Exact number of records, overriding the size-derived estimate
    #[arg(long)]
    pub lines: Option<u64>,

    /// Number of producers (defaults to the available parallelism)
    #[arg(short, long)]
    pub producers: Option<usize>,

    /// Records per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Batches buffered between producers and the writer
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Seed for reproducible content
    #[arg(long)]
    pub seed: Option<u64>,
}

impl RunOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(size_mb) = self.size_mb {
            config.output.target_size_mb = size_mb;
        }
        if let Some(lines) = self.lines {
            config.generation.total_records = Some(lines);
        }
        if let Some(producers) = self.producers {
            config.generation.producers = Some(producers);
        }
        if let Some(batch_size) = self.batch_size {
            config.generation.batch_size = batch_size;
        }
        if let Some(queue_capacity) = self.queue_capacity {
            config.pipeline.queue_capacity = queue_capacity;
        }
        if let Some(seed) = self.seed {
            config.generation.seed = Some(seed);
        }
    }
}

pub async fn run(
    config_path: Option<PathBuf>,
    overrides: RunOverrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => {
            info!(config_path = %path.display(), "Loading configuration");
            load_config(&path)?
        }
        None => {
            info!("No config file found, using defaults");
            Config::default()
        }
    };

    overrides.apply(&mut config);
    validate_config(&config)?;

    println!(
        "Generating ~{} records ({} MB target) into {} with {} producers...",
        config.total_records(),
        config.output.target_size_mb,
        config.output.path.display(),
        config.producer_count()
    );

    match run_generation(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(phase = e.phase(), error = %e, "Generation failed");
            eprintln!("Error: {} phase failed: {}", e.phase(), e);
            std::process::exit(1);
        }
    }
}

async fn run_generation(config: Config) -> Result<(), RunError> {
    let mut coordinator = Coordinator::new(config);

    // First Ctrl+C cancels the producers and drains the writer, a second one quits
    let cancel = coordinator.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if watch_interrupts(cancel, signal::ctrl_c).await == Interrupt::ForceQuit {
            error!("Second shutdown signal received, exiting without draining");
            std::process::exit(130);
        }
    });

    let result = coordinator.run().await;
    interrupt.abort();
    let summary = result?;

    println!(
        "\nSuccessfully generated {} in {:.2} seconds.",
        summary.output.display(),
        summary.elapsed.as_secs_f64()
    );
    println!("  Lines written:   {}", summary.lines_written);
    println!("  Batches written: {}", summary.batches_written);
    println!("  Size:            {:.2} MB", summary.megabytes_written());
    println!("  Throughput:      {:.0} lines/s", summary.lines_per_second());
    if summary.dropped_records() > 0 {
        println!(
            "  Dropped:         {} (remainder of {} / {} producers)",
            summary.dropped_records(),
            summary.requested_records,
            summary.partition.len()
        );
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// The signal source failed before a second signal arrived
    SignalsClosed,
    ForceQuit,
}

/// Cancel `cancel` on the first signal and report a second one.
async fn watch_interrupts<F, Fut>(cancel: CancellationToken, mut next_signal: F) -> Interrupt
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if next_signal().await.is_err() {
        return Interrupt::SignalsClosed;
    }
    warn!("Shutdown signal received, stopping producers (press Ctrl+C again to quit immediately)");
    cancel.cancel();

    if next_signal().await.is_err() {
        return Interrupt::SignalsClosed;
    }
    Interrupt::ForceQuit
}
