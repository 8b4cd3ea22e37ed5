//! Bounded output sinks for captured child stdout/stderr.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Default byte budget for a captured stdout/stderr stream: 50 MiB.
pub const DEFAULT_BUDGET_BYTES: usize = 50 * 1024 * 1024;

#[derive(Default)]
struct Inner {
    buf: Vec<u8>,
    truncated: bool,
}

/// A `Write` sink with a fixed byte budget.
///
/// Writes past the budget are silently dropped but the sink always
/// reports the full input length back to the caller (`Ok(buf.len())`),
/// so a producer piping into this sink via `io::copy` never sees a
/// short write and never gets killed by a broken-pipe error once the
/// budget is exhausted.
#[derive(Clone)]
pub struct BoundedSink {
    inner: Arc<Mutex<Inner>>,
    budget: usize,
}

impl BoundedSink {
    /// Create a sink with the given byte budget.
    pub fn new(budget: usize) -> Self {
        Self { inner: Arc::new(Mutex::new(Inner::default())), budget }
    }

    /// Create a sink with [`DEFAULT_BUDGET_BYTES`].
    pub fn with_default_budget() -> Self {
        Self::new(DEFAULT_BUDGET_BYTES)
    }

    /// Snapshot the captured bytes as a UTF-8 string, lossily.
    pub fn into_string(self) -> (String, bool) {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        (String::from_utf8_lossy(&inner.buf).into_owned(), inner.truncated)
    }
}

impl Write for BoundedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let remaining = self.budget.saturating_sub(inner.buf.len());
        let take = remaining.min(buf.len());
        if take > 0 {
            inner.buf.extend_from_slice(&buf[..take]);
        }
        if take < buf.len() {
            inner.truncated = true;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_full_length_past_budget() {
        let mut sink = BoundedSink::new(4);
        let n = sink.write(b"abcdefgh").unwrap();
        assert_eq!(n, 8);
        let (captured, truncated) = sink.into_string();
        assert_eq!(captured, "abcd");
        assert!(truncated);
    }

    #[test]
    fn under_budget_is_not_truncated() {
        let mut sink = BoundedSink::new(100);
        sink.write_all(b"hello").unwrap();
        let (captured, truncated) = sink.into_string();
        assert_eq!(captured, "hello");
        assert!(!truncated);
    }
}
