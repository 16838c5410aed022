//! Error types for data construction in stratus-types.

use thiserror::Error;

/// Errors that can occur when constructing telemetry values.
///
/// This error type is transport-agnostic and does not include pipeline
/// errors (those belong in stratus-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A field holds a value that can never be a telemetry reading.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Result type alias using stratus-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
