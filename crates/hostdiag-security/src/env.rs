//! Sanitized environment construction for external tool execution.

use std::collections::HashMap;
use std::env;

/// Variables passed through from the current environment, when present.
const PASSTHROUGH: &[&str] = &["PATH", "HOME", "LANG", "LC_ALL", "TERM", "TMPDIR"];

/// Fallback `PATH` used when the current process has none set, so a
/// sanitized child is never launched with an empty search path.
const DEFAULT_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Build an environment containing only [`PASSTHROUGH`] variables
/// copied from the current process, guaranteeing a non-empty `PATH`.
pub fn sanitize_env() -> HashMap<String, String> {
    let mut out = HashMap::new();
    for key in PASSTHROUGH {
        if let Ok(value) = env::var(key) {
            out.insert(key.to_string(), value);
        }
    }
    out.entry("PATH".to_string()).or_insert_with(|| DEFAULT_PATH.to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_never_empty() {
        // SAFETY: test-only mutation of the current process environment,
        // restored immediately after the assertion.
        unsafe {
            env::remove_var("PATH");
        }
        let sanitized = sanitize_env();
        assert_eq!(sanitized.get("PATH").map(String::as_str), Some(DEFAULT_PATH));
    }

    #[test]
    fn only_passthrough_keys_are_copied() {
        // SAFETY: test-only mutation of the current process environment.
        unsafe {
            env::set_var("HOSTDIAG_SECRET", "leak-me-not");
        }
        let sanitized = sanitize_env();
        assert!(!sanitized.contains_key("HOSTDIAG_SECRET"));
    }
}
