//! Error taxonomy shared by every hostdiag crate.
//!
//! Mirrors the severity classes from the error-handling design: transient
//! source errors recover locally, security violations degrade a collector
//! to unavailable, truncation is a flag rather than an error, cancellation
//! is recorded rather than propagated as failure, and only a structural
//! bug is allowed to fail a single collector's result outright.

use thiserror::Error;

/// Error type shared across collection, parsing, and orchestration.
#[derive(Error, Debug)]
pub enum Error {
    /// A source file or external command was missing, unreadable, or
    /// produced unparsable output. Recovered locally by the caller.
    #[error("transient source error: {0}")]
    TransientSource(String),

    /// A binary failed the security gate (not in the allow-list, wrong
    /// owner, world-writable, or unknown tool name).
    #[error("security violation: {0}")]
    SecurityViolation(String),

    /// The operation was cancelled before completion.
    #[error("cancelled")]
    Cancelled,

    /// A structural bug (e.g. a tool spec with no registered parser).
    /// The only error class allowed to fail a `CollectResult` outright.
    #[error("structural error: {0}")]
    Structural(String),

    /// I/O error, wrapped for `?` ergonomics.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the hostdiag pipeline.
pub type Result<T> = std::result::Result<T, Error>;
