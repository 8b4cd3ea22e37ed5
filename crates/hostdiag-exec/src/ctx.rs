//! `Ctx`: the deadline + cancellation pair every collector and the
//! executor receive, per the concurrency model's "every collector
//! receives a context with a deadline" contract.

use std::time::{Duration, Instant};

use crate::cancel::CancelToken;

/// A deadline-and-cancellation handle threaded from the orchestrator
/// down through collectors into the tool executor.
#[derive(Clone)]
pub struct Ctx {
    deadline: Instant,
    cancel: CancelToken,
}

impl Ctx {
    /// Build a context with `timeout` remaining from now and a fresh
    /// cancellation token.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { deadline: Instant::now() + timeout, cancel: CancelToken::new() }
    }

    /// Build a context sharing an existing cancellation token (so a
    /// host-level interrupt reaches every in-flight collector).
    pub fn with_deadline_and_cancel(deadline: Instant, cancel: CancelToken) -> Self {
        Self { deadline, cancel }
    }

    /// The cancellation handle, cloneable and shareable across threads.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Whether cancellation has been requested or the deadline passed.
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || Instant::now() >= self.deadline
    }

    /// Time remaining until the deadline, zero if already past.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Sleep for `want`, clamped to the context's remaining budget,
    /// waking early if cancellation is requested. Used by delta-sampling
    /// collectors for their cancel-aware inter-sample sleep.
    pub fn cancellable_sleep(&self, want: Duration) {
        let budget = want.min(self.remaining());
        let step = Duration::from_millis(20);
        let deadline = Instant::now() + budget;
        while Instant::now() < deadline {
            if self.cancel.is_cancelled() {
                return;
            }
            std::thread::sleep(step.min(deadline.saturating_duration_since(Instant::now())));
        }
    }
}
