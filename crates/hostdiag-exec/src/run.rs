//! `Run(tool, args, duration) -> RawOutput`: resolve, sandbox, launch
//! in a fresh process group, capture bounded output, and tear down
//! with a two-phase interrupt-then-kill sequence.
//!
//! Grounded on the availability-probe-then-act shape (same
//! "cheap check, then do the work" split as `probe-runtime`'s
//! `AvailableDetector`), with the process-group signal delivery itself
//! grounded on `nix`'s process/signal/fs/sched features, already part
//! of the workspace dependency set.

use std::io::{self, Read};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use hostdiag_model::{PidScope, PidTracker};
use hostdiag_security::{resolve_binary, sanitize_env, verify_binary};

use crate::cancel::CancelToken;
use crate::error::{ExecError, Result};
use crate::process::ProcessState;
use crate::sink::BoundedSink;

/// Grace window given to a process group between the interrupt and the
/// kill signal, so traced-event tools can flush their buffered sample
/// output on clean interrupt.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Interval the wait loop polls `try_wait`/cancellation at.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured output and termination state of one tool invocation.
#[derive(Debug, Clone)]
pub struct RawOutput {
    /// Captured (and possibly truncated) stdout text.
    pub stdout: String,
    /// Captured (and possibly truncated) stderr text.
    pub stderr: String,
    /// Process exit code, when it terminated by exit rather than signal.
    pub exit_code: Option<i32>,
    /// Wall-clock duration the process actually ran for.
    pub duration: Duration,
    /// Whether stdout or stderr hit its byte budget.
    pub truncated: bool,
    /// PID of the launched process.
    pub pid: i32,
    /// How the process ultimately terminated.
    pub state: ProcessState,
    /// Whether the run was cut short by cancellation rather than
    /// running to natural completion or hitting `duration`.
    pub cancelled: bool,
}

/// Run `tool` with `args`, budgeted to `duration` plus the shutdown
/// grace window. `audit`, if set, prepends a diagnostic line to the
/// child's stderr before exec. `tracker`, if given, has the spawned
/// PID registered for the full duration of the call (I6: lets
/// concurrently running collectors recognize this process as
/// pipeline-induced while it's still alive), not just after it exits.
pub fn run(
    tool: &str,
    args: &[String],
    duration: Duration,
    cancel: &CancelToken,
    audit: bool,
    tracker: Option<&PidTracker>,
) -> Result<RawOutput> {
    let binary = resolve_binary(tool)?;
    verify_binary(&binary)?;
    let env = sanitize_env();

    let mut command = Command::new(&binary);
    command.args(args).env_clear().envs(env).stdout(Stdio::piped()).stderr(Stdio::piped());

    let audit_line = audit.then(|| format!("[hostdiag] audit: executing {}\n", binary.display()));
    // SAFETY: `pre_exec` runs in the forked child before exec; the only
    // operations performed are async-signal-safe (setpgid, a single
    // raw write to fd 2).
    unsafe {
        command.pre_exec(move || {
            nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                .map_err(|e| io::Error::from_raw_os_error(e as i32))?;
            if let Some(line) = &audit_line {
                nix::unistd::write(std::io::stderr(), line.as_bytes())
                    .map_err(|e| io::Error::from_raw_os_error(e as i32))?;
            }
            Ok(())
        });
    }

    let started = Instant::now();
    let mut child = command.spawn().map_err(|source| ExecError::StartFailed { tool: tool.to_string(), source })?;
    let pid = child.id() as i32;

    // Held until this function returns, so the PID is visible to the
    // shared tracker for the process's entire lifetime, not just after
    // it has already exited.
    let _pid_scope = tracker.map(|t| PidScope::new(t, pid, tool.to_string()));

    let stdout_handle = spawn_reader(child.stdout.take());
    let stderr_handle = spawn_reader(child.stderr.take());

    let (state, cancelled) = wait_with_shutdown(&mut child, pid, duration, cancel, tool)?;

    let (stdout, stdout_truncated) = stdout_handle.join().unwrap_or_default();
    let (stderr, stderr_truncated) = stderr_handle.join().unwrap_or_default();

    Ok(RawOutput {
        stdout,
        stderr,
        exit_code: match state {
            ProcessState::Exited(code) => Some(code),
            _ => None,
        },
        duration: started.elapsed(),
        truncated: stdout_truncated || stderr_truncated,
        pid,
        state,
        cancelled,
    })
}

fn spawn_reader(stream: Option<impl Read + Send + 'static>) -> thread::JoinHandle<(String, bool)> {
    thread::spawn(move || {
        let mut sink = BoundedSink::with_default_budget();
        if let Some(mut stream) = stream {
            let _ = io::copy(&mut stream, &mut sink);
        }
        sink.into_string()
    })
}

/// Wait for the child to exit, watching `duration` and `cancel`
/// concurrently. On timeout or cancellation: interrupt the process
/// group, wait [`SHUTDOWN_GRACE`], then kill the group if it's still
/// alive.
fn wait_with_shutdown(
    child: &mut Child,
    pid: i32,
    duration: Duration,
    cancel: &CancelToken,
    tool: &str,
) -> Result<(ProcessState, bool)> {
    let deadline = Instant::now() + duration;
    let mut shutdown_requested = false;

    loop {
        if let Some(status) = child.try_wait().map_err(|source| ExecError::WaitFailed { tool: tool.to_string(), source })? {
            return Ok((ProcessState::from(status), shutdown_requested));
        }

        if !shutdown_requested && (Instant::now() >= deadline || cancel.is_cancelled()) {
            shutdown_requested = true;
            debug!("tool {tool:?} (pid {pid}): sending SIGINT to process group");
            let _ = kill(Pid::from_raw(-pid), Signal::SIGINT);

            let grace_deadline = Instant::now() + SHUTDOWN_GRACE;
            while Instant::now() < grace_deadline {
                if let Some(status) =
                    child.try_wait().map_err(|source| ExecError::WaitFailed { tool: tool.to_string(), source })?
                {
                    return Ok((ProcessState::from(status), true));
                }
                thread::sleep(POLL_INTERVAL);
            }

            warn!("tool {tool:?} (pid {pid}): still alive after grace window, sending SIGKILL to process group");
            let _ = kill(Pid::from_raw(-pid), Signal::SIGKILL);
            let status = child.wait().map_err(|source| ExecError::WaitFailed { tool: tool.to_string(), source })?;
            return Ok((ProcessState::from(status), true));
        }

        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_an_allow_listed_binary_to_completion() {
        // `/bin/echo` lives under an allow-listed directory on every
        // mainstream distribution this pipeline targets.
        let cancel = CancelToken::new();
        let output = run("echo", &["hello".to_string()], Duration::from_secs(2), &cancel, false, None).unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.exit_code, Some(0));
        assert!(!output.cancelled);
    }

    #[test]
    fn unresolvable_tool_surfaces_a_security_error() {
        let cancel = CancelToken::new();
        let err = run("not-a-real-hostdiag-tool", &[], Duration::from_secs(1), &cancel, false, None).unwrap_err();
        assert!(matches!(err, ExecError::Security(_)));
    }

    #[test]
    fn duration_budget_triggers_shutdown_on_a_long_running_tool() {
        let cancel = CancelToken::new();
        let output = run("sleep", &["30".to_string()], Duration::from_millis(50), &cancel, false, None).unwrap();
        assert!(output.cancelled);
        assert!(matches!(output.state, ProcessState::Signaled(_)));
    }

    #[test]
    fn spawned_pid_is_registered_with_the_tracker_for_the_call_duration() {
        let cancel = CancelToken::new();
        let tracker = PidTracker::new();
        let output =
            run("echo", &["hi".to_string()], Duration::from_secs(2), &cancel, false, Some(&tracker)).unwrap();
        // the scope guard has already dropped by the time `run` returns.
        assert!(!tracker.is_own_pid(output.pid));
    }
}
