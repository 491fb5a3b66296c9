use thiserror::Error;

/// Top-level error type for the Heritage workspace.
///
/// Subsystem crates define their own error types and implement
/// `From<HeritageError>` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HeritageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<toml::de::Error> for HeritageError {
    fn from(err: toml::de::Error) -> Self {
        HeritageError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for HeritageError {
    fn from(err: toml::ser::Error) -> Self {
        HeritageError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for HeritageError {
    fn from(err: serde_json::Error) -> Self {
        HeritageError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Heritage operations.
pub type Result<T> = std::result::Result<T, HeritageError>;
