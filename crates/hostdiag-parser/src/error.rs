//! Parser-specific error taxonomy.

use thiserror::Error;

/// Failure modes specific to the text parsers in this crate.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// No bucket line matched the `low -> high : count` shape.
    #[error("no histogram bucket lines found in input")]
    NoHistogramData,
}

/// Result alias for this crate's parsers.
pub type Result<T> = std::result::Result<T, ParseError>;
