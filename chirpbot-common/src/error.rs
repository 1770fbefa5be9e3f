// ================================================================
// File: chirpbot-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad credential pair or malformed user input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persistence failure. The in-memory state of the caller is left unchanged.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A non-elevated user tried a privileged command.
    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(format!("I/O: {err}"))
    }
}

impl Error {
    /// Errors the caller may retry or skip without tearing the process down.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Config(_))
    }
}
