//! Sandboxed execution of allow-listed external tool binaries: process
//! group launch, bounded output capture, and a two-phase
//! interrupt-then-kill shutdown sequence.

pub mod cancel;
pub mod ctx;
pub mod error;
pub mod process;
pub mod run;
pub mod sink;

pub use cancel::CancelToken;
pub use ctx::Ctx;
pub use error::{ExecError, Result};
pub use process::ProcessState;
pub use run::{run, RawOutput, SHUTDOWN_GRACE};
pub use sink::{BoundedSink, DEFAULT_BUDGET_BYTES};
