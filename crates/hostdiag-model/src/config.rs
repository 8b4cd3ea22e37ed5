//! `CollectConfig` - immutable per-run knobs threaded read-only through
//! orchestrator -> collector -> executor.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::pidtracker::PidTracker;

/// Collection depth/duration preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Tier-1 (procfs) collectors only, short duration.
    Quick,
    /// All collectors, moderate duration.
    #[default]
    Standard,
    /// All collectors plus longer duration with sampling profilers enabled.
    Deep,
}

impl Profile {
    /// String form used in reports and CLI-facing surfaces.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Standard => "standard",
            Self::Deep => "deep",
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A collector category tag, used for `focus` filtering and report keys.
pub const CATEGORIES: &[&str] = &[
    "cpu",
    "memory",
    "disk",
    "network",
    "process",
    "container",
    "system",
    "stacktrace",
];

/// Immutable, per-run collection configuration.
///
/// Constructed once by the CLI/MCP boundary (out of scope here) and
/// flows read-only through the orchestrator, every collector, and the
/// tool executor.
#[derive(Clone)]
pub struct CollectConfig {
    /// Total wall-clock budget for the run.
    pub duration: Duration,
    /// Inter-sample interval for delta-sampling collectors. Defaults to
    /// 1s; a value of zero is normalized to 1s at construction (Q1).
    pub sample_interval: Duration,
    /// Collection depth preset.
    pub profile: Profile,
    /// Category tags to restrict collection to. Empty means "all".
    pub focus: HashSet<String>,
    /// PIDs to include in process Top lists (empty means "no PID filter").
    pub target_pids: HashSet<i32>,
    /// Cgroup paths to scope the container collector to.
    pub target_cgroups: HashSet<String>,
    /// Cap on parsed events per tool-backed collector.
    pub max_events_per_collector: usize,
    /// Root of the procfs mount, overridable for tests.
    pub proc_root: PathBuf,
    /// Root of the sysfs mount, overridable for tests.
    pub sys_root: PathBuf,
    /// Shared PID tracker for observer-effect mitigation (I6).
    pub pid_tracker: Option<Arc<PidTracker>>,
    /// Suppress any non-essential informational output.
    pub quiet: bool,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(10),
            sample_interval: Duration::from_secs(1),
            profile: Profile::Standard,
            focus: HashSet::new(),
            target_pids: HashSet::new(),
            target_cgroups: HashSet::new(),
            max_events_per_collector: 1000,
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            pid_tracker: None,
            quiet: false,
        }
    }
}

impl CollectConfig {
    /// Build a config for the given profile, normalizing `sample_interval`
    /// to 1s when zero or negative-equivalent (Q1: undocumented upstream,
    /// defaults to 1s here).
    pub fn new(profile: Profile, duration: Duration) -> Self {
        Self { profile, duration, ..Self::default() }
    }

    /// Effective sample interval, applying the Q1 default.
    pub fn effective_sample_interval(&self) -> Duration {
        if self.sample_interval.is_zero() { Duration::from_secs(1) } else { self.sample_interval }
    }

    /// Whether a category passes the `focus` filter.
    pub fn wants_category(&self, category: &str) -> bool {
        self.focus.is_empty() || self.focus.contains(category)
    }

    /// Path to a file under the configured procfs root.
    pub fn proc_path(&self, rel: &str) -> PathBuf {
        join_root(&self.proc_root, rel)
    }

    /// Path to a file under the configured sysfs root.
    pub fn sys_path(&self, rel: &str) -> PathBuf {
        join_root(&self.sys_root, rel)
    }
}

fn join_root(root: &Path, rel: &str) -> PathBuf {
    root.join(rel.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sample_interval_defaults_to_one_second() {
        let mut cfg = CollectConfig::default();
        cfg.sample_interval = Duration::ZERO;
        assert_eq!(cfg.effective_sample_interval(), Duration::from_secs(1));
    }

    #[test]
    fn empty_focus_wants_every_category() {
        let cfg = CollectConfig::default();
        assert!(cfg.wants_category("cpu"));
        assert!(cfg.wants_category("anything"));
    }

    #[test]
    fn nonempty_focus_restricts_categories() {
        let mut cfg = CollectConfig::default();
        cfg.focus.insert("cpu".to_string());
        assert!(cfg.wants_category("cpu"));
        assert!(!cfg.wants_category("memory"));
    }

    #[test]
    fn proc_path_joins_under_configured_root() {
        let mut cfg = CollectConfig::default();
        cfg.proc_root = PathBuf::from("/tmp/fakeproc");
        assert_eq!(cfg.proc_path("/stat"), PathBuf::from("/tmp/fakeproc/stat"));
    }
}
