//! Error types shared across Sunlapse crates.

use std::path::PathBuf;

/// Top-level error type for Sunlapse operations.
#[derive(Debug, thiserror::Error)]
pub enum SunlapseError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Unknown image source: {name}")]
    UnknownSource { name: String },

    #[error("Download error from {url}: {cause}")]
    Download { url: String, cause: String },

    #[error("Decode error for {subject}: {cause}")]
    Decode { subject: String, cause: String },

    #[error("No frame images found in {}", dir.display())]
    EmptyInput { dir: PathBuf },

    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using SunlapseError.
pub type SunlapseResult<T> = Result<T, SunlapseError>;

impl SunlapseError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn download(url: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Download {
            url: url.into(),
            cause: cause.to_string(),
        }
    }

    pub fn decode(subject: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Decode {
            subject: subject.into(),
            cause: cause.to_string(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error was raised by parameter validation, before any
    /// side effect took place.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::UnknownSource { .. })
    }
}
