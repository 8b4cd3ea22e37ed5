//! How a traced child process ultimately terminated.

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

/// Termination mode of a finished child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Exited normally (possibly non-zero) with the given code.
    Exited(i32),
    /// Terminated by the given signal number, never started, or a
    /// status the platform couldn't decode.
    Signaled(i32),
    /// The watcher gave up without ever observing a terminal status
    /// (should not normally occur given the two-phase shutdown).
    Unknown,
}

impl From<ExitStatus> for ProcessState {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            Self::Exited(code)
        } else if let Some(signal) = status.signal() {
            Self::Signaled(signal)
        } else {
            Self::Unknown
        }
    }
}

impl ProcessState {
    /// A non-zero exit from a process killed by signal is not an
    /// error (I8-adjacent: the two-phase shutdown is expected, not a
    /// failure).
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Exited(code) if *code != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signaled_is_not_an_error() {
        assert!(!ProcessState::Signaled(2).is_error());
    }

    #[test]
    fn nonzero_exit_is_an_error() {
        assert!(ProcessState::Exited(1).is_error());
    }

    #[test]
    fn clean_exit_is_not_an_error() {
        assert!(!ProcessState::Exited(0).is_error());
    }
}
