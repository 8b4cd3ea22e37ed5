//! Tool-executor error taxonomy.

use thiserror::Error;

/// Failure modes for launching and waiting on an external tool.
#[derive(Error, Debug)]
pub enum ExecError {
    /// Binary resolution or verification failed the security gate.
    #[error("security gate rejected tool: {0}")]
    Security(#[from] hostdiag_security::SecurityError),

    /// The child process could not be spawned.
    #[error("failed to start {tool}: {source}")]
    StartFailed {
        /// Tool name that failed to start.
        tool: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child process failed (not the same as a
    /// non-zero or signal-terminated exit, which is not an error).
    #[error("failed waiting on {tool}: {source}")]
    WaitFailed {
        /// Tool name that failed while being waited on.
        tool: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, ExecError>;
