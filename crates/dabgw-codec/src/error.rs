use thiserror::Error;

/// Errors returned by gateway codec operations.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON serialization/deserialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Length-prefix framing violation.
    #[error("invalid frame: {0}")]
    InvalidFrame(&'static str),
    /// Body too large for the fixed-length header.
    #[error("frame body of {0} bytes exceeds header capacity")]
    Oversize(usize),
}
