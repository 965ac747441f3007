pub mod channel;
pub mod coordinator;
pub mod error;
pub mod partition;
pub mod producer;
pub mod writer;

pub use channel::{create_queue, Batch, QueueItem, QueueReceiver, QueueSender};
pub use coordinator::{Coordinator, CoordinatorState, RunError, RunSummary};
pub use error::PipelineError;
pub use producer::{Producer, ProducerExit, ProducerReport};
pub use writer::{run_writer, FileSink, LogSink, WriterReport};
