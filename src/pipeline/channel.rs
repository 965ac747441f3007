use crate::pipeline::PipelineError;
use crate::record::LogRecord;
use tokio::sync::mpsc;

/// Records generated by one producer, in generation order
#[derive(Debug)]
pub struct Batch {
    pub producer_id: usize,
    /// Position of this batch in its producer's output, starting at 0
    pub sequence: u64,
    pub records: Vec<LogRecord>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Element type of the batch queue
#[derive(Debug)]
pub enum QueueItem {
    Batch(Batch),
    /// No batch follows. Enqueued once, by the coordinator, after every
    /// producer has returned.
    Terminate,
}

/// Producer side of the batch queue. Cloned once per producer.
#[derive(Debug, Clone)]
pub struct QueueSender {
    inner: mpsc::Sender<QueueItem>,
}

/// Writer side of the batch queue
#[derive(Debug)]
pub struct QueueReceiver {
    inner: mpsc::Receiver<QueueItem>,
}

/// Create a bounded batch queue holding at most `capacity` items.
///
/// # Panics
/// Panics if `capacity` is zero.
pub fn create_queue(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueSender { inner: tx }, QueueReceiver { inner: rx })
}

impl QueueSender {
    /// Enqueue an item, waiting while the queue is full.
    ///
    /// Cancel safe: if the returned future is dropped before completion the
    /// item was not enqueued.
    pub async fn put(&self, item: QueueItem) -> Result<(), PipelineError> {
        self.inner
            .send(item)
            .await
            .map_err(|_| PipelineError::QueueClosed)
    }

    /// Free slots right now
    pub fn available(&self) -> usize {
        self.inner.capacity()
    }
}

impl QueueReceiver {
    /// Take the next item, blocking the current thread while the queue is
    /// empty. Returns `None` once every sender is gone and the queue is drained.
    ///
    /// Must not be called from an async context.
    pub fn take(&mut self) -> Option<QueueItem> {
        self.inner.blocking_recv()
    }

    pub async fn take_async(&mut self) -> Option<QueueItem> {
        self.inner.recv().await
    }
}
