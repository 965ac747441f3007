use crate::pipeline::channel::{Batch, QueueItem, QueueSender};
use crate::pipeline::PipelineError;
use crate::record::Synthesizer;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Records synthesized between cooperative yields
const YIELD_EVERY_RECORDS: usize = 1024;

/// How a producer's loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerExit {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ProducerReport {
    pub producer_id: usize,
    /// Records handed to the queue. Batches abandoned on cancellation are not counted.
    pub lines_sent: u64,
    pub batches_sent: u64,
    pub exit: ProducerExit,
}

/// One worker of the producer pool.
///
/// Generates exactly `lines_to_produce` records in batches of at most
/// `batch_size`, pushing each batch onto the queue in generation order.
pub struct Producer {
    id: usize,
    lines_to_produce: u64,
    batch_size: usize,
    synthesizer: Synthesizer,
}

impl Producer {
    pub fn new(id: usize, lines_to_produce: u64, batch_size: usize, synthesizer: Synthesizer) -> Self {
        Self {
            id,
            lines_to_produce,
            batch_size,
            synthesizer,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Run the producer to completion.
    ///
    /// Cancelling `cancel` ends the loop at the next batch boundary, while a
    /// batch is being built, or while blocked on a full queue; the pending
    /// batch is dropped whole. A closed
    /// queue (writer gone) is an error.
    pub async fn run(
        mut self,
        queue: QueueSender,
        cancel: CancellationToken,
    ) -> Result<ProducerReport, PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }

        let mut report = ProducerReport {
            producer_id: self.id,
            lines_sent: 0,
            batches_sent: 0,
            exit: ProducerExit::Completed,
        };

        debug!(producer_id = self.id, lines = self.lines_to_produce, "Producer started");

        while report.lines_sent < self.lines_to_produce {
            if cancel.is_cancelled() {
                report.exit = ProducerExit::Cancelled;
                break;
            }

            let remaining = self.lines_to_produce - report.lines_sent;
            let size = remaining.min(self.batch_size as u64) as usize;
            let mut records = Vec::with_capacity(size);
            for generated in 1..=size {
                records.push(self.synthesizer.synthesize());
                // Let abort and cancellation through while a large batch is built
                if generated % YIELD_EVERY_RECORDS == 0 {
                    tokio::task::yield_now().await;
                    if cancel.is_cancelled() {
                        break;
                    }
                }
            }
            if cancel.is_cancelled() {
                report.exit = ProducerExit::Cancelled;
                break;
            }
            let batch = Batch {
                producer_id: self.id,
                sequence: report.batches_sent,
                records,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    report.exit = ProducerExit::Cancelled;
                    break;
                }
                result = queue.put(QueueItem::Batch(batch)) => result?,
            }

            report.lines_sent += size as u64;
            report.batches_sent += 1;
        }

        if report.exit == ProducerExit::Cancelled {
            warn!(
                producer_id = self.id,
                lines_sent = report.lines_sent,
                lines_requested = self.lines_to_produce,
                "Producer cancelled"
            );
        } else {
            debug!(
                producer_id = self.id,
                lines = report.lines_sent,
                batches = report.batches_sent,
                "Producer finished"
            );
        }

        Ok(report)
    }
}
