//! Security-gate error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// Failure modes for binary resolution and verification.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SecurityError {
    /// No allow-listed directory contains a binary with this name
    /// (including the `-bpfcc` suffixed retry).
    #[error("tool {0:?} not found in any allow-listed directory")]
    NotFound(String),

    /// The binary's parent directory is not one of the allow-listed
    /// directories (e.g. it was reached via a symlink trick).
    #[error("{0:?} is not inside an allow-listed directory")]
    NotInAllowList(PathBuf),

    /// The resolved path is a directory, not a regular file.
    #[error("{0:?} is not a regular file")]
    NotRegularFile(PathBuf),

    /// The resolved file's owning uid is not 0.
    #[error("{0:?} is not owned by root")]
    NotOwnedByRoot(PathBuf),

    /// The resolved file has the other-write permission bit set.
    #[error("{0:?} is world-writable")]
    WorldWritable(PathBuf),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, SecurityError>;
