//! Error types for cinelog-core

use thiserror::Error;

/// Main error type for the cinelog-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Raw watch-log fetch failed upstream
    #[error("watch log fetch error: {0}")]
    Fetch(String),

    /// Location directory lookup failed
    #[error("location directory error: {0}")]
    Directory(String),

    /// A fanned-out statistics task failed to complete
    #[error("statistics computation error: {0}")]
    Compute(String),
}

/// Result type alias for cinelog-core
pub type Result<T> = std::result::Result<T, Error>;
