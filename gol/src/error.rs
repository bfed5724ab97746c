// error.rs - Error type shared by the engine and its collaborators

use thiserror::Error;

/// Errors that can stop a run, either at startup or during shutdown.
#[derive(Debug, Error)]
pub enum GolError {
    /// Rejected configuration (checked once, before any turn runs)
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    /// Input image could not be parsed
    #[error("malformed image {name}: {reason}")]
    Image { name: String, reason: String },

    /// Input image does not match the configured board
    #[error("image {name} is {found_width}x{found_height}, expected {width}x{height}")]
    Dimensions {
        name: String,
        width: usize,
        height: usize,
        found_width: usize,
        found_height: usize,
    },

    #[error("no image named {name}")]
    NotFound { name: String },

    #[error("unknown pattern: {0}")]
    UnknownPattern(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The I/O task went away before answering
    #[error("I/O channel closed")]
    IoClosed,

    /// A spawned task panicked or was aborted
    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl GolError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        GolError::Config {
            reason: reason.into(),
        }
    }
}
