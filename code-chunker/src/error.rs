use thiserror::Error;

/// Errors that can occur during code chunking.
#[derive(Debug, Error)]
pub enum ChunkerError {
    /// The file could not be opened, mapped, or read.
    #[error("Failed to open file: {0}")]
    FileOpen(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
