use thiserror::Error;

/// Errors that can occur inside the generation pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("batch queue closed")]
    QueueClosed,

    #[error("invalid pipeline settings: {0}")]
    InvalidConfig(String),
}
