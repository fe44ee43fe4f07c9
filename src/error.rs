//! Error types for Projector.

use thiserror::Error;

/// Projector error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or truncated binary stream
    #[error("malformed stream: {0}")]
    Format(String),

    /// Vector length does not match the established corpus dimension
    #[error("schema mismatch: expected dimension {expected}, got {got}")]
    Schema { expected: usize, got: usize },

    /// Statistics are undefined on empty or degenerate input
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Argument outside the valid range for the operation
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown dimensionality-reduction method name
    #[error("unsupported reduction method: {0}")]
    UnsupportedMethod(String),

    /// Point index outside the corpus
    #[error("point index {index} out of range for corpus of {len} points")]
    Index { index: usize, len: usize },

    /// Eigensolver failed to reach tolerance within the sweep cap
    #[error("eigensolver did not converge within {0} sweeps")]
    NonConvergence(usize),

    /// Transport I/O error while reading the stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Result type alias for Projector operations.
pub type Result<T> = std::result::Result<T, Error>;
