use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    /// The scan root does not exist or is not a directory.
    #[error("Invalid directory: {0}")]
    InvalidDirectory(String),

    /// An include/exclude glob could not be compiled.
    #[error("Invalid glob pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad magic, version, or truncated data while loading persisted state.
    #[error("Corrupt index data: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, IndexerError>;
