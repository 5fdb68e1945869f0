use thiserror::Error;

/// Shared lightweight error type for core primitive operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid caller input or malformed primitive value.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Message-content parsing failure.
    #[error("parse error: {0}")]
    Parse(&'static str),
}
