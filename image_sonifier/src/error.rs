// Error types for the sonifier.
//
// Everything fallible in the library returns `Result<T, SonifyError>`.
// Validation problems are split into two families: `InvalidInput` for data
// the mapping cannot be computed on (empty grids, degenerate input ranges)
// and `ParameterRange` for configuration rejected before any work starts.
// Decoder, encoder and filesystem failures are wrapped unchanged.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SonifyError>;

/// Data the mapping cannot be computed on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInput {
    #[error("pixel grid is empty ({width}x{height})")]
    EmptyGrid { width: u32, height: u32 },
    #[error("division undefined: input range collapses to {bound}")]
    DivisionUndefined { bound: f64 },
}

#[derive(Debug, Error)]
pub enum SonifyError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error("parameter '{name}' out of range: {reason}")]
    ParameterRange { name: &'static str, reason: String },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to encode MIDI: {0}")]
    Encode(String),
    #[error("invalid mapping config: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SonifyError {
    pub(crate) fn range(name: &'static str, reason: impl Into<String>) -> Self {
        SonifyError::ParameterRange {
            name,
            reason: reason.into(),
        }
    }
}
